use rustc_hash::FxHashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::cache::{hash_scan_config, CacheManager};
use crate::class_map::ClassMap;
use crate::config::AutoloaderConfig;
use crate::errors::{AutoloadError, Result};
use crate::host::Host;
use crate::scanner::{ScanReport, Scanner};

/// Outcome of a resolution request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// The defining file was loaded by this call
    Loaded(PathBuf),
    /// The defining file had already been loaded earlier
    AlreadyLoaded(PathBuf),
    /// No scanned file declares the name
    Unresolved,
}

impl Resolution {
    pub fn is_resolved(&self) -> bool {
        !matches!(self, Resolution::Unresolved)
    }

    pub fn path(&self) -> Option<&Path> {
        match self {
            Resolution::Loaded(path) | Resolution::AlreadyLoaded(path) => Some(path),
            Resolution::Unresolved => None,
        }
    }
}

/// Resolves type names to their defining files and loads them on demand
///
/// The class map is built lazily: the first request either reads the
/// cache file or scans the configured roots.
#[derive(Debug)]
pub struct Autoloader {
    config: AutoloaderConfig,
    class_map: ClassMap,
    loaded: FxHashSet<PathBuf>,
    last_report: Option<ScanReport>,
}

impl Autoloader {
    pub fn new(config: AutoloaderConfig) -> Self {
        Self {
            config,
            class_map: ClassMap::new(),
            loaded: FxHashSet::default(),
            last_report: None,
        }
    }

    pub fn config(&self) -> &AutoloaderConfig {
        &self.config
    }

    /// Mutable access to the configuration
    ///
    /// Changes take effect on the next scan; a map already in memory is kept.
    pub fn config_mut(&mut self) -> &mut AutoloaderConfig {
        &mut self.config
    }

    /// Report of the most recent scan performed by this instance
    pub fn last_scan_report(&self) -> Option<&ScanReport> {
        self.last_report.as_ref()
    }

    fn cache_manager(&self) -> Option<CacheManager> {
        if self.config.no_cache {
            return None;
        }
        self.config
            .cache_file()
            .map(|path| CacheManager::new(path, hash_scan_config(&self.config)))
    }

    /// Make sure the class map is available
    ///
    /// With caching disabled or no cache file set, every call rescans all
    /// roots. A missing cache file is built by the first scan; after that
    /// the in-memory map is used even if the write failed. With a cache
    /// file present the file is read once, the first time the in-memory
    /// map is found empty.
    pub fn ensure_map_loaded(&mut self) -> Result<()> {
        match self.cache_manager() {
            Some(cache) if cache.exists() => {
                if self.class_map.is_empty() {
                    self.class_map = cache.load()?;
                }
                Ok(())
            }
            Some(_) if self.last_report.is_some() => Ok(()),
            _ => self.rebuild().map(|_| ()),
        }
    }

    /// Scan all roots into a fresh map and persist it unless caching is off
    ///
    /// The in-memory map is replaced before the cache is written, so it
    /// stays usable when the write fails.
    pub fn rebuild(&mut self) -> Result<ScanReport> {
        let (map, report) = Scanner::from_config(&self.config).scan_all(self.config.scan_roots());
        info!(
            "Scanned {} files, {} types mapped",
            report.files_scanned,
            map.len()
        );
        self.class_map = map;
        self.last_report = Some(report.clone());

        if let Some(cache) = self.cache_manager() {
            cache.save(&self.class_map)?;
        }
        Ok(report)
    }

    /// The class map, loading or building it first
    pub fn class_map(&mut self) -> Result<&ClassMap> {
        self.ensure_map_loaded()?;
        Ok(&self.class_map)
    }

    /// The in-memory map as it stands, without loading or scanning
    pub fn current_map(&self) -> &ClassMap {
        &self.class_map
    }

    /// File declaring `name`, without loading it
    pub fn lookup(&mut self, name: &str) -> Result<Option<PathBuf>> {
        self.ensure_map_loaded()?;
        Ok(self.class_map.get(name).map(Path::to_path_buf))
    }

    /// Resolve `name` and load its defining file into `host`
    ///
    /// A file is handed to the host at most once per autoloader.
    pub fn resolve<H: Host + ?Sized>(&mut self, name: &str, host: &mut H) -> Result<Resolution> {
        self.ensure_map_loaded()?;

        let path = match self.class_map.get(name) {
            Some(path) => path.to_path_buf(),
            None => {
                debug!("Type {} not found in class map", name);
                return Ok(Resolution::Unresolved);
            }
        };

        if self.loaded.contains(&path) {
            return Ok(Resolution::AlreadyLoaded(path));
        }

        host.load_file(&path).map_err(|source| AutoloadError::Load {
            name: name.to_string(),
            path: path.clone(),
            source,
        })?;
        debug!("Loaded {:?} for type {}", path, name);
        self.loaded.insert(path.clone());
        Ok(Resolution::Loaded(path))
    }

    pub fn is_loaded(&self, path: &Path) -> bool {
        self.loaded.contains(path)
    }

    /// Files loaded through this autoloader, in no particular order
    pub fn loaded_files(&self) -> impl Iterator<Item = &Path> {
        self.loaded.iter().map(PathBuf::as_path)
    }

    /// Remove the cache file and forget the in-memory map
    ///
    /// Returns whether a cache file was removed.
    pub fn clear_cache(&mut self) -> Result<bool> {
        self.class_map.clear();
        self.loaded.clear();
        self.last_report = None;

        match self.config.cache_file() {
            Some(path) => {
                let cache = CacheManager::new(path, hash_scan_config(&self.config));
                Ok(cache.clear()?)
            }
            None => Ok(false),
        }
    }

    /// Install this autoloader as the active resolver of `host`
    ///
    /// The include paths are appended to the host search path. The prior
    /// search path is restored when the returned guard is dropped or
    /// `unregister` is called.
    pub fn register<'a, H: Host + ?Sized>(&'a mut self, host: &'a mut H) -> Registration<'a, H> {
        let saved = host.search_path();
        let mut extended = saved.clone();
        extended.extend(self.config.include_paths().iter().cloned());
        host.set_search_path(extended);

        info!(
            "Autoloader registered with {} scan roots",
            self.config.scan_roots().len()
        );
        Registration {
            autoloader: self,
            host,
            saved_search_path: Some(saved),
        }
    }
}

/// An autoloader installed as a host's resolver
///
/// While it is alive, unknown type names reported by the host are passed
/// to `resolve`. Dropping it restores the host's search path.
pub struct Registration<'a, H: Host + ?Sized> {
    autoloader: &'a mut Autoloader,
    host: &'a mut H,
    saved_search_path: Option<Vec<PathBuf>>,
}

impl<'a, H: Host + ?Sized> Registration<'a, H> {
    /// Resolver callback: locate and load `name` into the host
    pub fn resolve(&mut self, name: &str) -> Result<Resolution> {
        self.autoloader.resolve(name, &mut *self.host)
    }

    pub fn autoloader(&mut self) -> &mut Autoloader {
        self.autoloader
    }

    pub fn host(&self) -> &H {
        self.host
    }

    /// Uninstall the resolver and restore the saved search path
    pub fn unregister(mut self) {
        self.restore();
    }

    fn restore(&mut self) {
        if let Some(saved) = self.saved_search_path.take() {
            self.host.set_search_path(saved);
            info!("Autoloader unregistered");
        }
    }
}

impl<H: Host + ?Sized> Drop for Registration<'_, H> {
    fn drop(&mut self) {
        self.restore();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScanRoot;
    use crate::host::{HostError, RecordingHost};
    use std::fs;
    use tempfile::TempDir;

    fn write(dir: &Path, rel: &str, content: &str) -> PathBuf {
        let path = dir.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, content).unwrap();
        path.canonicalize().unwrap()
    }

    fn autoloader_for(root: &Path, cache_file: Option<PathBuf>) -> Autoloader {
        let mut config = AutoloaderConfig::new(root);
        config.set_scan_roots([ScanRoot::recursive(root.join("lib"))]);
        config.set_cache_file(cache_file);
        Autoloader::new(config)
    }

    #[test]
    fn test_end_to_end_resolution() {
        let temp = TempDir::new().unwrap();
        let a = write(temp.path(), "lib/a.php", "<?php\nclass Alpha {}\n");
        let b = write(temp.path(), "lib/sub/b.php", "<?php\ninterface Beta {}\n");

        let mut autoloader = autoloader_for(temp.path(), None);
        let mut host = RecordingHost::new();

        let map = autoloader.class_map().unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(map.get("Alpha"), Some(a.as_path()));
        assert_eq!(map.get("Beta"), Some(b.as_path()));

        assert_eq!(
            autoloader.resolve("Alpha", &mut host).unwrap(),
            Resolution::Loaded(a.clone())
        );
        assert_eq!(
            autoloader.resolve("Gamma", &mut host).unwrap(),
            Resolution::Unresolved
        );
        assert_eq!(host.loaded(), &[a]);
    }

    #[test]
    fn test_resolution_is_idempotent() {
        let temp = TempDir::new().unwrap();
        let file = write(
            temp.path(),
            "lib/pair.php",
            "class First {}\nclass Second {}\n",
        );

        let mut autoloader = autoloader_for(temp.path(), None);
        let mut host = RecordingHost::new();

        assert!(matches!(
            autoloader.resolve("First", &mut host).unwrap(),
            Resolution::Loaded(_)
        ));
        assert_eq!(
            autoloader.resolve("First", &mut host).unwrap(),
            Resolution::AlreadyLoaded(file.clone())
        );
        // a different name in the same file does not load it again
        assert_eq!(
            autoloader.resolve("Second", &mut host).unwrap(),
            Resolution::AlreadyLoaded(file.clone())
        );
        assert_eq!(host.loaded().len(), 1);
        assert!(autoloader.is_loaded(&file));
    }

    #[test]
    fn test_cache_written_then_trusted() {
        let temp = TempDir::new().unwrap();
        let cache_path = temp.path().join("cache").join("classmap.bin");
        let a = write(temp.path(), "lib/a.php", "class Alpha {}");

        let mut first = autoloader_for(temp.path(), Some(cache_path.clone()));
        first.ensure_map_loaded().unwrap();
        assert!(cache_path.is_file());

        // new source after the cache exists is not picked up
        write(temp.path(), "lib/late.php", "class Late {}");

        let mut second = autoloader_for(temp.path(), Some(cache_path));
        assert_eq!(second.lookup("Alpha").unwrap(), Some(a));
        assert_eq!(second.lookup("Late").unwrap(), None);
        assert!(second.last_scan_report().is_none());
    }

    #[test]
    fn test_failed_load_is_not_marked_loaded() {
        struct RefusingHost;

        impl Host for RefusingHost {
            fn search_path(&self) -> Vec<PathBuf> {
                Vec::new()
            }
            fn set_search_path(&mut self, _paths: Vec<PathBuf>) {}
            fn load_file(&mut self, _path: &Path) -> std::result::Result<(), HostError> {
                Err(HostError::Rejected("parse error".to_string()))
            }
        }

        let temp = TempDir::new().unwrap();
        let file = write(temp.path(), "lib/a.php", "class Alpha {}");
        let mut autoloader = autoloader_for(temp.path(), None);

        let err = autoloader.resolve("Alpha", &mut RefusingHost).unwrap_err();
        assert!(matches!(err, AutoloadError::Load { ref name, .. } if name == "Alpha"));
        assert!(!autoloader.is_loaded(&file));

        let mut host = RecordingHost::new();
        assert_eq!(
            autoloader.resolve("Alpha", &mut host).unwrap(),
            Resolution::Loaded(file)
        );
    }

    #[test]
    fn test_register_appends_and_restores_search_path() {
        let temp = TempDir::new().unwrap();
        let mut autoloader = autoloader_for(temp.path(), None);
        autoloader.config_mut().add_include_path("/srv/shared");
        let mut host = RecordingHost::with_search_path([".", "/usr/share/php"]);

        {
            let registration = autoloader.register(&mut host);
            assert_eq!(
                registration.host().search_path(),
                vec![
                    PathBuf::from("."),
                    PathBuf::from("/usr/share/php"),
                    PathBuf::from("/srv/shared"),
                ]
            );
            registration.unregister();
        }

        assert_eq!(
            host.search_path(),
            vec![PathBuf::from("."), PathBuf::from("/usr/share/php")]
        );
    }

    #[test]
    fn test_registration_restores_on_error_path() {
        fn resolve_missing(autoloader: &mut Autoloader, host: &mut RecordingHost) -> Result<()> {
            let mut registration = autoloader.register(host);
            registration.resolve("Nope")?;
            Err(AutoloadError::ConfigError("bail out".to_string()))
        }

        let temp = TempDir::new().unwrap();
        let mut autoloader = autoloader_for(temp.path(), None);
        autoloader.config_mut().add_include_path("/extra");
        let mut host = RecordingHost::with_search_path(["/base"]);

        assert!(resolve_missing(&mut autoloader, &mut host).is_err());
        assert_eq!(host.search_path(), vec![PathBuf::from("/base")]);
    }

    #[test]
    fn test_clear_cache_forgets_everything() {
        let temp = TempDir::new().unwrap();
        let cache_path = temp.path().join("classmap.bin");
        write(temp.path(), "lib/a.php", "class Alpha {}");

        let mut autoloader = autoloader_for(temp.path(), Some(cache_path.clone()));
        let mut host = RecordingHost::new();
        autoloader.resolve("Alpha", &mut host).unwrap();

        assert!(autoloader.clear_cache().unwrap());
        assert!(!cache_path.exists());
        assert!(autoloader.loaded_files().next().is_none());
        assert!(!autoloader.clear_cache().unwrap());
    }
}
