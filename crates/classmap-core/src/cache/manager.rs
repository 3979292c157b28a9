use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::{CacheError, CacheFile, Result};
use crate::class_map::ClassMap;

/// Reads and writes the class map cache file
#[derive(Debug, Clone)]
pub struct CacheManager {
    /// Path to the cache file
    path: PathBuf,

    /// Fingerprint of the current scan configuration
    fingerprint: String,
}

impl CacheManager {
    /// Create a cache manager for `path`
    ///
    /// # Arguments
    /// * `path` - Location of the cache file
    /// * `fingerprint` - Hash of the scan configuration (see `hash_scan_config`)
    pub fn new(path: impl Into<PathBuf>, fingerprint: String) -> Self {
        Self {
            path: path.into(),
            fingerprint,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Load the persisted map
    ///
    /// Any failure to read or decode the file is returned as an error;
    /// there is no fallback. A fingerprint that does not match the current
    /// configuration is logged but the map is still used.
    pub fn load(&self) -> Result<ClassMap> {
        let bytes = std::fs::read(&self.path)?;
        let file = match CacheFile::from_bytes(&bytes, &self.path) {
            Ok(file) => file,
            Err(e) => {
                warn!("Unusable class map cache {:?}: {}", self.path, e);
                return Err(e);
            }
        };

        if file.fingerprint != self.fingerprint {
            warn!(
                "Class map cache {:?} was built from a different scan configuration; delete it to rebuild",
                self.path
            );
        }

        info!(
            "Loaded class map cache with {} entries",
            file.entries.len()
        );
        Ok(file.entries)
    }

    /// Persist `map`, replacing the previous cache file
    ///
    /// The bytes go to a temporary file next to the target which is then
    /// renamed over it, so readers never observe a partial file.
    pub fn save(&self, map: &ClassMap) -> Result<()> {
        let bytes = CacheFile::new(self.fingerprint.clone(), map.clone()).to_bytes()?;

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(dir).map_err(|source| self.write_failed(source))?;

        let mut temp =
            tempfile::NamedTempFile::new_in(dir).map_err(|source| self.write_failed(source))?;
        temp.write_all(&bytes)
            .and_then(|_| temp.flush())
            .map_err(|source| self.write_failed(source))?;
        temp.persist(&self.path)
            .map_err(|e| self.write_failed(e.error))?;

        info!("Saved class map cache with {} entries", map.len());
        Ok(())
    }

    /// Delete the cache file if present
    ///
    /// Returns whether a file was removed.
    pub fn clear(&self) -> Result<bool> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {
                info!("Class map cache {:?} removed", self.path);
                Ok(true)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(CacheError::from(e)),
        }
    }

    fn write_failed(&self, source: std::io::Error) -> CacheError {
        CacheError::WriteFailed {
            path: self.path.clone(),
            source,
        }
    }
}
