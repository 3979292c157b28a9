//! Directory scanning: discovers which file declares which type name.
//!
//! Discovery is a textual match, not a parse. A file is read once, every
//! line that looks like a class or interface declaration contributes its
//! name, and nothing else about the file is checked.

use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

use crate::class_map::ClassMap;
use crate::config::{AutoloaderConfig, ScanRoot};

// ASCII-only classes: names stop at the first non-ASCII byte
const DECLARATION_PATTERN: &str =
    r"(?mi-u)^\s*(?:abstract\s+|final\s+)?(?:class|interface)\s+(\w+)";

fn declaration_regex() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(DECLARATION_PATTERN).expect("declaration pattern is valid"))
}

/// A definition that replaced an earlier one with the same name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShadowedDefinition {
    pub name: String,
    pub previous: PathBuf,
    pub replacement: PathBuf,
}

/// Summary of a scan
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanReport {
    /// Source files read
    pub files_scanned: usize,

    /// Declarations found, including shadowed ones
    pub definitions_found: usize,

    /// Names declared in more than one file, in the order the collisions occurred
    pub shadowed: Vec<ShadowedDefinition>,
}

impl ScanReport {
    pub fn has_collisions(&self) -> bool {
        !self.shadowed.is_empty()
    }
}

/// Walks scan roots and collects type declarations
#[derive(Debug, Clone)]
pub struct Scanner {
    extension: String,
}

impl Scanner {
    pub fn new(extension: impl Into<String>) -> Self {
        let extension = extension.into();
        Self {
            extension: extension.trim_start_matches('.').to_string(),
        }
    }

    pub fn from_config(config: &AutoloaderConfig) -> Self {
        Self::new(config.extension.clone())
    }

    /// Names declared in `source`, in order of appearance
    pub fn extract_type_names(source: &str) -> Vec<String> {
        declaration_regex()
            .captures_iter(source)
            .filter_map(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
            .collect()
    }

    /// Scan every root in order into a fresh map
    pub fn scan_all(&self, roots: &[ScanRoot]) -> (ClassMap, ScanReport) {
        let mut map = ClassMap::new();
        let mut report = ScanReport::default();
        for root in roots {
            self.scan_root(root, &mut map, &mut report);
        }
        (map, report)
    }

    /// Scan one root into `map`, later definitions overwriting earlier ones
    ///
    /// A root that is not a directory is skipped.
    pub fn scan_root(&self, root: &ScanRoot, map: &mut ClassMap, report: &mut ScanReport) {
        if !root.path.is_dir() {
            debug!("Skipping missing scan root {:?}", root.path);
            return;
        }

        let max_depth = if root.recursive { usize::MAX } else { 1 };
        let walker = WalkDir::new(&root.path)
            .min_depth(1)
            .max_depth(max_depth)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !is_hidden(e));

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    debug!("Skipping unreadable entry under {:?}: {}", root.path, e);
                    continue;
                }
            };

            if entry.file_type().is_file() && self.is_source_file(entry.path()) {
                self.scan_file(entry.path(), map, report);
            }
        }
    }

    fn is_source_file(&self, path: &Path) -> bool {
        path.extension()
            .map(|ext| ext == self.extension.as_str())
            .unwrap_or(false)
    }

    fn scan_file(&self, path: &Path, map: &mut ClassMap, report: &mut ScanReport) {
        let bytes = match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("Failed to read {:?}: {}", path, e);
                return;
            }
        };
        report.files_scanned += 1;

        let canonical = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        let source = String::from_utf8_lossy(&bytes);

        for name in Self::extract_type_names(&source) {
            debug!("Found {} in {:?}", name, canonical);
            report.definitions_found += 1;

            if let Some(previous) = map.insert(name.clone(), canonical.clone()) {
                if previous != canonical {
                    warn!(
                        "Type {} declared in {:?} shadows declaration in {:?}",
                        name, canonical, previous
                    );
                    report.shadowed.push(ShadowedDefinition {
                        name,
                        previous,
                        replacement: canonical.clone(),
                    });
                }
            }
        }
    }
}

impl Default for Scanner {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_EXTENSION)
    }
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.file_name().as_encoded_bytes().starts_with(b".")
}
