//! Mock hosts for testing

use classmap_core::host::{Host, HostError};
use std::path::{Path, PathBuf};

/// A host whose loads always fail
#[derive(Debug, Default)]
pub struct FailingHost {
    search_path: Vec<PathBuf>,
    pub attempts: usize,
}

impl FailingHost {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Host for FailingHost {
    fn search_path(&self) -> Vec<PathBuf> {
        self.search_path.clone()
    }

    fn set_search_path(&mut self, paths: Vec<PathBuf>) {
        self.search_path = paths;
    }

    fn load_file(&mut self, path: &Path) -> Result<(), HostError> {
        self.attempts += 1;
        Err(HostError::Rejected(format!(
            "refusing to load {}",
            path.display()
        )))
    }
}

/// A host that fails loudly if the same file is loaded twice
#[derive(Debug, Default)]
pub struct StrictHost {
    search_path: Vec<PathBuf>,
    loaded: Vec<PathBuf>,
}

impl StrictHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn loaded(&self) -> &[PathBuf] {
        &self.loaded
    }
}

impl Host for StrictHost {
    fn search_path(&self) -> Vec<PathBuf> {
        self.search_path.clone()
    }

    fn set_search_path(&mut self, paths: Vec<PathBuf>) {
        self.search_path = paths;
    }

    fn load_file(&mut self, path: &Path) -> Result<(), HostError> {
        if self.loaded.iter().any(|p| p == path) {
            return Err(HostError::Rejected(format!(
                "duplicate definition: {} loaded twice",
                path.display()
            )));
        }
        self.loaded.push(path.to_path_buf());
        Ok(())
    }
}
