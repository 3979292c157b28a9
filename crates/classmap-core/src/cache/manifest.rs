use serde::{Deserialize, Serialize};
use std::path::Path;

use super::{CacheError, Result, CACHE_MAGIC, CACHE_VERSION};
use crate::class_map::ClassMap;

/// Leading fields of every cache file, decoded before the map itself
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CacheHeader {
    magic: [u8; 4],
    version: u32,
}

/// Serialized form of a class map
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheFile {
    /// Always `CACHE_MAGIC`
    pub magic: [u8; 4],

    /// Schema version for cache format
    pub version: u32,

    /// Hash of the scan configuration the map was built from
    pub fingerprint: String,

    /// The persisted map
    pub entries: ClassMap,
}

impl CacheFile {
    pub fn new(fingerprint: String, entries: ClassMap) -> Self {
        Self {
            magic: CACHE_MAGIC,
            version: CACHE_VERSION,
            fingerprint,
            entries,
        }
    }

    /// Serialize to binary format
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        bincode::serialize(self).map_err(CacheError::from)
    }

    /// Deserialize from binary format, checking magic and version first
    ///
    /// `path` is only used for error messages.
    pub fn from_bytes(bytes: &[u8], path: &Path) -> Result<Self> {
        let header: CacheHeader =
            bincode::deserialize(bytes).map_err(|_| CacheError::ForeignFormat {
                path: path.to_path_buf(),
            })?;

        if header.magic != CACHE_MAGIC {
            return Err(CacheError::ForeignFormat {
                path: path.to_path_buf(),
            });
        }
        if header.version != CACHE_VERSION {
            return Err(CacheError::VersionMismatch {
                path: path.to_path_buf(),
                expected: CACHE_VERSION,
                found: header.version,
            });
        }

        bincode::deserialize(bytes).map_err(|source| CacheError::CorruptedFile {
            path: path.to_path_buf(),
            source,
        })
    }
}
