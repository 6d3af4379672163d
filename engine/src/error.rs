use thiserror::Error;

/// Top-level error type for engine operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Filesystem read/write failures.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed JSON in a dump file.
    #[error("decode error: {0}")]
    Decode(#[from] serde_json::Error),

    /// Malformed XML in an abstract dump.
    #[error("xml error: {0}")]
    Xml(String),
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, Error>;
