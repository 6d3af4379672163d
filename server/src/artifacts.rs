//! Deterministic naming of the on-disk artifacts of one abstract shard.
//!
//! Bootstrap keys entirely off the presence of these files, so the naming
//! scheme is part of the persistence contract: shard 0 renders as the empty
//! suffix, shards 1..27 as their decimal index.

use std::fs;
use std::path::{Path, PathBuf};

/// Default data directory, relative to the working directory.
pub const DATA_DIR: &str = "data";

/// Number of prepartitioned Wikipedia abstract files.
pub const SHARD_COUNT: usize = 28;

const BASE_URL: &str = "https://dumps.wikimedia.org/enwiki/latest";

/// The five artifact locations derived from a shard index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shard {
    pub xml_path: PathBuf,
    pub gz_path: PathBuf,
    pub index_dump: PathBuf,
    pub data_dump: PathBuf,
    pub url: String,
}

impl Shard {
    pub fn new(data_dir: &Path, index: usize) -> Self {
        let suffix = if index == 0 {
            String::new()
        } else {
            index.to_string()
        };
        Self {
            xml_path: data_dir.join(format!("enwiki-latest-abstract{suffix}.xml")),
            gz_path: data_dir.join(format!("enwiki-latest-abstract{suffix}.xml.gz")),
            index_dump: data_dir.join(format!("indexes{suffix}.json")),
            data_dump: data_dir.join(format!("data{suffix}.json")),
            url: format!("{BASE_URL}/enwiki-latest-abstract{suffix}.xml.gz"),
        }
    }
}

/// Ensures the data directory exists. With `clean` set, regular files inside
/// it are deleted first; subdirectories are left alone and deletion failures
/// are logged and skipped.
pub fn init_data_dir(data_dir: &Path, clean: bool) -> std::io::Result<()> {
    if !data_dir.exists() {
        fs::create_dir_all(data_dir)?;
        return Ok(());
    }
    if clean {
        for entry in fs::read_dir(data_dir)? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                if let Err(e) = fs::remove_file(entry.path()) {
                    tracing::warn!(
                        path = %entry.path().display(),
                        error = %e,
                        "could not delete file"
                    );
                }
            }
        }
    }
    Ok(())
}
