//! Persisted group state for cross-run staleness checks.
//!
//! The staleness contract compares the group's current content hash with a
//! previously stored one. Within one process the group object remembers its
//! parse-time hash; across CLI runs the hash persists in a small JSON
//! manifest, `.jsgroup-state.json`, living in the destination directory so
//! it travels with the artifacts it describes (e.g. when the output
//! directory is cached in CI).
//!
//! A missing, corrupt, or version-mismatched manifest reads as "no stored
//! hash", which makes the group unconditionally stale — the safe direction.

use crate::hash::GroupHash;
use serde::{Deserialize, Serialize};
use std::io;
use std::path::{Path, PathBuf};

/// Name of the state manifest within the destination directory.
const MANIFEST_FILENAME: &str = ".jsgroup-state.json";

/// Version of the manifest format. Bump to invalidate existing state when
/// the format or the hash computation changes.
const MANIFEST_VERSION: u32 = 1;

/// On-disk record of the last successfully generated group hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateManifest {
    pub version: u32,
    pub group_hash: GroupHash,
}

impl StateManifest {
    pub fn new(group_hash: GroupHash) -> Self {
        Self { version: MANIFEST_VERSION, group_hash }
    }

    /// Load from the destination directory. `None` if the file doesn't
    /// exist or can't be trusted (parse failure, version mismatch).
    pub fn load(dest: &Path) -> Option<Self> {
        let content = std::fs::read_to_string(manifest_path(dest)).ok()?;
        let manifest: Self = serde_json::from_str(&content).ok()?;
        (manifest.version == MANIFEST_VERSION).then_some(manifest)
    }

    /// Save to the destination directory.
    pub fn save(&self, dest: &Path) -> io::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(manifest_path(dest), json)
    }
}

/// Resolve the state manifest path for a destination directory.
pub fn manifest_path(dest: &Path) -> PathBuf {
    dest.join(MANIFEST_FILENAME)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn hash() -> GroupHash {
        GroupHash::compute([("a.js", "var a;")])
    }

    #[test]
    fn save_and_load_roundtrip() {
        let tmp = TempDir::new().unwrap();
        let manifest = StateManifest::new(hash());
        manifest.save(tmp.path()).unwrap();

        let loaded = StateManifest::load(tmp.path()).unwrap();
        assert_eq!(loaded.version, MANIFEST_VERSION);
        assert_eq!(loaded.group_hash, hash());
    }

    #[test]
    fn load_missing_returns_none() {
        let tmp = TempDir::new().unwrap();
        assert!(StateManifest::load(tmp.path()).is_none());
    }

    #[test]
    fn load_corrupt_returns_none() {
        let tmp = TempDir::new().unwrap();
        fs::write(manifest_path(tmp.path()), "not json").unwrap();
        assert!(StateManifest::load(tmp.path()).is_none());
    }

    #[test]
    fn load_wrong_version_returns_none() {
        let tmp = TempDir::new().unwrap();
        let json = format!(
            r#"{{"version": {}, "group_hash": "abc"}}"#,
            MANIFEST_VERSION + 1
        );
        fs::write(manifest_path(tmp.path()), json).unwrap();
        assert!(StateManifest::load(tmp.path()).is_none());
    }
}
