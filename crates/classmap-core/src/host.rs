//! Boundary to the host runtime the autoloader serves.
//!
//! The host owns two things the autoloader needs: an ordered search path
//! that other file-loading mechanisms consult, and the ability to load a
//! source file into the running program.

use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HostError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Rejected(String),
}

/// Capabilities the autoloader requires from its host
pub trait Host {
    /// Current auxiliary search path, in lookup order
    fn search_path(&self) -> Vec<PathBuf>;

    /// Replace the auxiliary search path
    fn set_search_path(&mut self, paths: Vec<PathBuf>);

    /// Load a source file into the running program
    fn load_file(&mut self, path: &Path) -> Result<(), HostError>;
}

/// Host that records what it was asked to do without executing anything
///
/// Useful for tooling that only needs to know which file a name maps to,
/// and as a test double.
#[derive(Debug, Default, Clone)]
pub struct RecordingHost {
    search_path: Vec<PathBuf>,
    loaded: Vec<PathBuf>,
}

impl RecordingHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_search_path<I, P>(paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            search_path: paths.into_iter().map(Into::into).collect(),
            loaded: Vec::new(),
        }
    }

    /// Files passed to `load_file`, in call order
    pub fn loaded(&self) -> &[PathBuf] {
        &self.loaded
    }
}

impl Host for RecordingHost {
    fn search_path(&self) -> Vec<PathBuf> {
        self.search_path.clone()
    }

    fn set_search_path(&mut self, paths: Vec<PathBuf>) {
        self.search_path = paths;
    }

    fn load_file(&mut self, path: &Path) -> Result<(), HostError> {
        if !path.is_file() {
            return Err(HostError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("no such file: {}", path.display()),
            )));
        }
        self.loaded.push(path.to_path_buf());
        Ok(())
    }
}
