//! On-disk persistence of the class map
//!
//! A scan is only repeated across process runs when the cache file is
//! missing or caching is disabled. The file is a small versioned envelope
//! around the map so a foreign or outdated file is rejected up front.

mod error;
mod hash;
mod manager;
mod manifest;

pub use error::{CacheError, Result};
pub use hash::hash_scan_config;
pub use manager::CacheManager;
pub use manifest::CacheFile;

/// Magic bytes at the start of every cache file
pub const CACHE_MAGIC: [u8; 4] = *b"CMAP";

/// Cache format version - increment when cache structure changes
pub const CACHE_VERSION: u32 = 1;
