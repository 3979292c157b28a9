use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf, MAIN_SEPARATOR_STR};

use crate::errors::AutoloadError;

/// Trailing path segment that marks a scan root as recursive
pub const RECURSIVE_MARKER: &str = "*";

/// Default source file extension
pub const DEFAULT_EXTENSION: &str = "php";

/// Conventional subdirectories of the installation root, scanned recursively
const DEFAULT_ROOT_SEGMENTS: &[&[&str]] = &[
    &["config"],
    &["logger"],
    &["engine", "core"],
    &["engine", "infra", "propel"],
    &["engine", "process"],
    &["engine", "logger"],
];

/// Join path segments with the platform directory separator
pub fn build_path<S: AsRef<str>>(segments: &[S]) -> String {
    segments
        .iter()
        .map(|s| s.as_ref())
        .collect::<Vec<_>>()
        .join(MAIN_SEPARATOR_STR)
}

/// A directory scanned for type definitions
///
/// The textual form is the directory path, optionally followed by the
/// `*` segment (`lib/*`) to request recursion into subdirectories.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct ScanRoot {
    pub path: PathBuf,
    pub recursive: bool,
}

impl ScanRoot {
    pub fn new(path: impl Into<PathBuf>, recursive: bool) -> Self {
        Self {
            path: path.into(),
            recursive,
        }
    }

    pub fn recursive(path: impl Into<PathBuf>) -> Self {
        Self::new(path, true)
    }

    pub fn flat(path: impl Into<PathBuf>) -> Self {
        Self::new(path, false)
    }

    /// Parse the textual form, stripping a trailing recursion marker
    pub fn parse(spec: &str) -> Self {
        let trimmed = spec.trim_end_matches(|c| c == '/' || c == '\\');
        if trimmed == RECURSIVE_MARKER {
            return Self::recursive(".");
        }
        for sep in ['/', '\\'] {
            if let Some(dir) = trimmed
                .strip_suffix(RECURSIVE_MARKER)
                .and_then(|rest| rest.strip_suffix(sep))
            {
                let dir = if dir.is_empty() { "/" } else { dir };
                return Self::recursive(dir);
            }
        }
        Self::flat(spec)
    }

    /// Resolve a relative root against `base`
    pub fn rebased(&self, base: &Path) -> Self {
        Self::new(rebase(base, &self.path), self.recursive)
    }
}

impl From<&str> for ScanRoot {
    fn from(spec: &str) -> Self {
        Self::parse(spec)
    }
}

impl From<String> for ScanRoot {
    fn from(spec: String) -> Self {
        Self::parse(&spec)
    }
}

impl From<ScanRoot> for String {
    fn from(root: ScanRoot) -> Self {
        root.to_string()
    }
}

impl fmt::Display for ScanRoot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.recursive {
            write!(
                f,
                "{}",
                build_path(&[&*self.path.to_string_lossy(), RECURSIVE_MARKER])
            )
        } else {
            write!(f, "{}", self.path.display())
        }
    }
}

fn rebase(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

/// Autoloader configuration: the path registry plus cache settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "ConfigFile")]
pub struct AutoloaderConfig {
    /// Installation root the default scan roots are derived from
    pub install_root: PathBuf,

    /// Directories scanned for definitions, in scan order
    scan_roots: Vec<ScanRoot>,

    /// Directories appended to the host search path on registration
    include_paths: Vec<PathBuf>,

    /// Where the class map is persisted (unset: never persisted)
    cache_file: Option<PathBuf>,

    /// Bypass the cache file entirely (default: false)
    pub no_cache: bool,

    /// Extension of source files, without the dot (default: php)
    pub extension: String,
}

/// On-disk shape of the configuration; omitted scan roots mean the defaults
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    #[serde(default = "default_install_root")]
    install_root: PathBuf,

    #[serde(default)]
    scan_roots: Option<Vec<ScanRoot>>,

    #[serde(default)]
    include_paths: Vec<PathBuf>,

    #[serde(default)]
    cache_file: Option<String>,

    #[serde(default)]
    no_cache: bool,

    #[serde(default = "default_extension")]
    extension: String,
}

impl From<ConfigFile> for AutoloaderConfig {
    fn from(file: ConfigFile) -> Self {
        let scan_roots = file
            .scan_roots
            .unwrap_or_else(|| AutoloaderConfig::default_scan_roots(&file.install_root));
        Self {
            install_root: file.install_root,
            scan_roots,
            include_paths: file.include_paths,
            cache_file: file
                .cache_file
                .filter(|s| !s.is_empty())
                .map(PathBuf::from),
            no_cache: file.no_cache,
            extension: file.extension.trim_start_matches('.').to_string(),
        }
    }
}

fn default_install_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_extension() -> String {
    DEFAULT_EXTENSION.to_string()
}

impl Default for AutoloaderConfig {
    fn default() -> Self {
        Self::new(default_install_root())
    }
}

impl AutoloaderConfig {
    /// Create a configuration with the default scan roots under `install_root`
    pub fn new(install_root: impl Into<PathBuf>) -> Self {
        let install_root = install_root.into();
        let scan_roots = Self::default_scan_roots(&install_root);
        Self {
            install_root,
            scan_roots,
            include_paths: Vec::new(),
            cache_file: None,
            no_cache: false,
            extension: default_extension(),
        }
    }

    /// The conventional recursive roots below `install_root`
    pub fn default_scan_roots(install_root: &Path) -> Vec<ScanRoot> {
        let base = install_root.to_string_lossy();
        DEFAULT_ROOT_SEGMENTS
            .iter()
            .map(|segments| {
                let mut parts: Vec<&str> = Vec::with_capacity(segments.len() + 2);
                parts.push(&base);
                parts.extend_from_slice(segments);
                parts.push(RECURSIVE_MARKER);
                ScanRoot::parse(&build_path(&parts))
            })
            .collect()
    }

    pub fn scan_roots(&self) -> &[ScanRoot] {
        &self.scan_roots
    }

    pub fn set_scan_roots<I, R>(&mut self, roots: I)
    where
        I: IntoIterator<Item = R>,
        R: Into<ScanRoot>,
    {
        self.scan_roots = roots.into_iter().map(Into::into).collect();
    }

    /// Append a root given in textual form (`dir` or `dir/*`)
    pub fn add_scan_root(&mut self, root: impl Into<ScanRoot>) {
        self.scan_roots.push(root.into());
    }

    pub fn include_paths(&self) -> &[PathBuf] {
        &self.include_paths
    }

    pub fn set_include_paths<I, P>(&mut self, paths: I)
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.include_paths = paths.into_iter().map(Into::into).collect();
    }

    pub fn add_include_path(&mut self, path: impl Into<PathBuf>) {
        self.include_paths.push(path.into());
    }

    pub fn cache_file(&self) -> Option<&Path> {
        self.cache_file.as_deref()
    }

    pub fn set_cache_file(&mut self, path: Option<PathBuf>) {
        self.cache_file = path.filter(|p| !p.as_os_str().is_empty());
    }

    pub fn set_no_cache(&mut self, no_cache: bool) {
        self.no_cache = no_cache;
    }

    /// Load configuration from a JSON or YAML file
    ///
    /// Relative paths inside the file are resolved against the file's directory.
    pub fn from_file(path: &Path) -> Result<Self, AutoloadError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: AutoloaderConfig = match extension_of(path).as_deref() {
            Some("yaml") | Some("yml") => serde_yaml::from_str(&content)
                .map_err(|e| AutoloadError::ConfigError(e.to_string()))?,
            _ => serde_json::from_str(&content)
                .map_err(|e| AutoloadError::ConfigError(e.to_string()))?,
        };

        let base = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        config.rebase(base);
        Ok(config)
    }

    /// Create a default configuration and write it to a file
    pub fn init_file(path: &Path) -> Result<(), AutoloadError> {
        let config = AutoloaderConfig::default();
        let text = match extension_of(path).as_deref() {
            Some("yaml") | Some("yml") => serde_yaml::to_string(&config)
                .map_err(|e| AutoloadError::ConfigError(e.to_string()))?,
            _ => serde_json::to_string_pretty(&config)
                .map_err(|e| AutoloadError::ConfigError(e.to_string()))?,
        };
        std::fs::write(path, text)?;
        Ok(())
    }

    fn rebase(&mut self, base: &Path) {
        self.install_root = rebase(base, &self.install_root);
        for root in self.scan_roots.iter_mut() {
            *root = root.rebased(base);
        }
        for include in self.include_paths.iter_mut() {
            *include = rebase(base, include);
        }
        if let Some(cache_file) = self.cache_file.as_mut() {
            *cache_file = rebase(base, cache_file);
        }
    }
}

fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
}
