use std::path::PathBuf;
use thiserror::Error;

use crate::cache::CacheError;
use crate::host::HostError;

#[derive(Debug, Error)]
pub enum AutoloadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Class map cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("Failed to load {path} for type '{name}': {source}")]
    Load {
        name: String,
        path: PathBuf,
        #[source]
        source: HostError,
    },
}

pub type Result<T> = std::result::Result<T, AutoloadError>;
