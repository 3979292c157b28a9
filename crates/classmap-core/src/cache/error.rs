use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    #[error("Not a class map cache file: {path}")]
    ForeignFormat { path: PathBuf },

    #[error("Cache version mismatch in {path}: expected {expected}, found {found}")]
    VersionMismatch {
        path: PathBuf,
        expected: u32,
        found: u32,
    },

    #[error("Corrupted cache file {path}: {source}")]
    CorruptedFile {
        path: PathBuf,
        #[source]
        source: bincode::Error,
    },

    #[error("Failed to write cache file {path}: {source}")]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, CacheError>;
