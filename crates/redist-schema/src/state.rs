//! Persisted record of the last published redist version.

use crate::hash::Sha256Digest;
use crate::persist::write_atomic;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::Path;
use thiserror::Error;

/// Errors raised while loading or saving a [`VersionState`].
#[derive(Error, Debug)]
pub enum StateError {
    /// The state file could not be read or written.
    #[error("IO error on version state {path}: {source}")]
    Io {
        /// State file path.
        path: String,
        /// Underlying error.
        #[source]
        source: io::Error,
    },

    /// The state file exists but does not hold a valid record.
    #[error("Failed to parse version state {path}: {source}")]
    Parse {
        /// State file path.
        path: String,
        /// Underlying error.
        #[source]
        source: serde_json::Error,
    },
}

/// What was decided on the last successful publish.
///
/// Older tool versions wrote PascalCase field names; those are still accepted
/// on load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionState {
    /// Game version the redist was built from, e.g. `3.25.7.4`.
    #[serde(alias = "GameVersion")]
    pub game_version: String,
    /// Steam build id of that game version.
    #[serde(alias = "BuildId")]
    pub build_id: String,
    /// Version string written to the package descriptor.
    #[serde(alias = "NugetVersion", alias = "publishedVersion")]
    pub nuget_version: String,
    /// Aggregate hash of the manifest at publish time.
    #[serde(alias = "FilesHash")]
    pub files_hash: Sha256Digest,
    /// When the record was written.
    #[serde(alias = "LastUpdated")]
    pub last_updated: DateTime<Utc>,
}

impl VersionState {
    /// Load the state at `path`.
    ///
    /// Returns `Ok(None)` when no state has been recorded yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Option<Self>, StateError> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(StateError::Io {
                    path: path.display().to_string(),
                    source,
                });
            }
        };

        serde_json::from_str(&content)
            .map(Some)
            .map_err(|source| StateError::Parse {
                path: path.display().to_string(),
                source,
            })
    }

    /// Overwrite the state at `path` with this record.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the atomic write fails.
    pub fn save(&self, path: &Path) -> Result<(), StateError> {
        let content = serde_json::to_string_pretty(self).map_err(|source| StateError::Parse {
            path: path.display().to_string(),
            source,
        })?;

        write_atomic(path, content.as_bytes()).map_err(|source| StateError::Io {
            path: path.display().to_string(),
            source,
        })
    }
}
