//! The redist manifest (`manifest.sha256.json`).
//!
//! Maps each redistributed file name to the digest of its bytes in the redist
//! directory. Stored as a pretty-printed JSON object:
//!
//! ```text
//! {
//!   "Assembly-CSharp.dll": "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824",
//!   "UnityEngine.dll": "..."
//! }
//! ```

use crate::hash::Sha256Digest;
use crate::persist::write_atomic;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::Path;
use thiserror::Error;

/// File name of the manifest inside the redist directory.
pub const MANIFEST_FILE_NAME: &str = "manifest.sha256.json";

/// Errors raised while reading or writing a manifest.
#[derive(Error, Debug)]
pub enum ManifestError {
    /// The manifest file could not be read or written.
    #[error("IO error on manifest {path}: {source}")]
    Io {
        /// Manifest path.
        path: String,
        /// Underlying error.
        #[source]
        source: io::Error,
    },

    /// The manifest exists but is not a valid name → digest object.
    #[error("Failed to parse manifest {path}: {source}")]
    Parse {
        /// Manifest path.
        path: String,
        /// Underlying error.
        #[source]
        source: serde_json::Error,
    },
}

/// File name → content digest, ordered by file name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Manifest(BTreeMap<String, Sha256Digest>);

impl Manifest {
    /// Create an empty manifest.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record (or replace) the digest for `file_name`.
    pub fn insert(&mut self, file_name: impl Into<String>, digest: Sha256Digest) {
        self.0.insert(file_name.into(), digest);
    }

    /// Digest recorded for `file_name`, if any.
    pub fn get(&self, file_name: &str) -> Option<&Sha256Digest> {
        self.0.get(file_name)
    }

    /// Whether the manifest has an entry for `file_name`.
    pub fn contains(&self, file_name: &str) -> bool {
        self.0.contains_key(file_name)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the manifest has no entries.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Entries in file-name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Sha256Digest)> {
        self.0.iter().map(|(name, digest)| (name.as_str(), digest))
    }

    /// Single digest summarizing the whole manifest.
    ///
    /// Hashes `name` followed by `digest` for every entry in file-name order,
    /// so it changes whenever any file is added, removed or modified.
    pub fn aggregate_hash(&self) -> Sha256Digest {
        let mut hasher = Sha256::new();
        for (name, digest) in &self.0 {
            hasher.update(name.as_bytes());
            hasher.update(digest.as_str().as_bytes());
        }
        // Hex of a SHA-256 output is always a valid digest.
        Sha256Digest::compute_from_hasher(hasher)
    }

    /// Load a manifest from `path`.
    ///
    /// A missing file yields an empty manifest, which is how a fresh redist
    /// directory looks.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, ManifestError> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Self::new()),
            Err(source) => {
                return Err(ManifestError::Io {
                    path: path.display().to_string(),
                    source,
                });
            }
        };

        serde_json::from_str(&content).map_err(|source| ManifestError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    /// Persist the manifest to `path`, replacing any previous manifest.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the atomic write fails.
    pub fn save(&self, path: &Path) -> Result<(), ManifestError> {
        let content = serde_json::to_string_pretty(self).map_err(|source| ManifestError::Parse {
            path: path.display().to_string(),
            source,
        })?;

        write_atomic(path, content.as_bytes()).map_err(|source| ManifestError::Io {
            path: path.display().to_string(),
            source,
        })
    }
}

impl FromIterator<(String, Sha256Digest)> for Manifest {
    fn from_iter<T: IntoIterator<Item = (String, Sha256Digest)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Manifest {
    type Item = (&'a String, &'a Sha256Digest);
    type IntoIter = std::collections::btree_map::Iter<'a, String, Sha256Digest>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
