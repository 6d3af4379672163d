//! Wire format of the binary query protocol.
//!
//! A request is `cmd(1) || page(4, big-endian u32) || phrase(UTF-8)`, where
//! the phrase runs to the end of the frame. Responses are a single JSON
//! document followed by a newline; decode failures are answered with an
//! `Error: `-prefixed text line instead.

use thiserror::Error;

/// Command byte selecting a query request.
pub const CMD_QUERY: u8 = 0x00;

/// A request frame is read with a single read into a buffer of this size;
/// anything longer is truncated by design.
pub const READ_BUFFER_SIZE: usize = 1024;

/// Command byte plus the four page bytes.
pub const MIN_REQUEST_LEN: usize = 5;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("invalid length {0}: a request must be at least {MIN_REQUEST_LEN} bytes")]
    TooShort(usize),

    #[error("invalid command byte {0:#04x} for a query request")]
    BadCommand(u8),
}

#[derive(Debug, PartialEq, Eq)]
pub struct Request {
    pub command: u8,
    pub page: u32,
    pub phrase: String,
}

pub fn parse_request(raw: &[u8]) -> Result<Request, ProtocolError> {
    if raw.len() < MIN_REQUEST_LEN {
        return Err(ProtocolError::TooShort(raw.len()));
    }
    let command = raw[0];
    if command != CMD_QUERY {
        return Err(ProtocolError::BadCommand(command));
    }
    let page = u32::from_be_bytes([raw[1], raw[2], raw[3], raw[4]]);
    let phrase = String::from_utf8_lossy(&raw[MIN_REQUEST_LEN..]).into_owned();
    Ok(Request {
        command,
        page,
        phrase,
    })
}
