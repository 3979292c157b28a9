//! On-demand resolution of type names to the source files that define them.
//!
//! Configured directories are scanned for `class`/`interface` declarations,
//! the resulting name -> file table is persisted to a cache file, and a
//! name is mapped to its file (and loaded into the host) the first time it
//! is requested.

pub mod autoloader;
pub mod cache;
pub mod class_map;
pub mod config;
pub mod errors;
pub mod host;
pub mod scanner;

pub use autoloader::{Autoloader, Registration, Resolution};
pub use class_map::ClassMap;
pub use config::{build_path, AutoloaderConfig, ScanRoot};
pub use errors::AutoloadError;
pub use host::{Host, HostError, RecordingHost};
pub use scanner::{ScanReport, Scanner, ShadowedDefinition};
