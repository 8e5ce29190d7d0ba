//! Shared helpers for unit tests.

use crate::config::ResourcesConfig;
use std::fs;
use std::path::Path;

/// Write a source file under `root`, creating parent directories.
pub fn write_source(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

/// A resources config with no configured libraries or engine, so fetches
/// resolve to nothing and artifacts contain only the rendered body.
pub fn test_resources() -> ResourcesConfig {
    ResourcesConfig {
        cache_dir: "cache".to_string(),
        origin: "vendor".to_string(),
        libraries: Vec::new(),
        engine: None,
        compat_helpers: None,
    }
}
