use crate::config::{AutoloaderConfig, ScanRoot};

/// Hash the settings that determine what a scan produces
///
/// A cache written under different roots or a different extension carries
/// a different fingerprint.
pub fn hash_scan_config(config: &AutoloaderConfig) -> String {
    hash_roots(config.scan_roots(), &config.extension)
}

fn hash_roots(roots: &[ScanRoot], extension: &str) -> String {
    let mut hasher = blake3::Hasher::new();
    for root in roots {
        hasher.update(root.path.to_string_lossy().as_bytes());
        hasher.update(&[0, u8::from(root.recursive)]);
    }
    hasher.update(b"\xffext:");
    hasher.update(extension.as_bytes());
    hasher.finalize().to_hex().to_string()
}
