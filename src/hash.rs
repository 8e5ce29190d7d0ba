//! Group fingerprinting for staleness detection.
//!
//! A [`GroupHash`] is a SHA-256 digest over a group's ordered source file
//! set: for each file, its group-relative path and its full contents, both
//! length-prefixed so no two distinct file sets can collide by boundary
//! shuffling. Content-based rather than mtime-based so the fingerprint
//! survives `git checkout` (which resets modification times).
//!
//! Two groups with identical file sets and contents hash identically; any
//! content change, file addition, or file removal changes the hash.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Hex SHA-256 fingerprint of an ordered source file set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupHash(String);

impl GroupHash {
    /// Compute the fingerprint over `(relative path, contents)` pairs in
    /// group order.
    pub fn compute<'a>(parts: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let mut hasher = Sha256::new();
        for (path, contents) in parts {
            hasher.update((path.len() as u64).to_le_bytes());
            hasher.update(path.as_bytes());
            hasher.update((contents.len() as u64).to_le_bytes());
            hasher.update(contents.as_bytes());
        }
        GroupHash(format!("{:x}", hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GroupHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
