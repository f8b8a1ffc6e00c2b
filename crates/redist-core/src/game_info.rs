//! Detection of the installed game version and Steam build id.

use crate::keyvalues::{self, KeyValuesError};
use serde_json::Value;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Status file written by the game into its install directory.
pub const STATUS_FILE_NAME: &str = "Status.json";

/// Errors raised while reading game metadata.
#[derive(Error, Debug)]
pub enum GameInfoError {
    /// A metadata file could not be read.
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        /// File path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },

    /// `Status.json` is not valid JSON.
    #[error("Failed to parse {}: {source}", path.display())]
    Json {
        /// File path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: serde_json::Error,
    },

    /// The app manifest is not valid KeyValues text.
    #[error("Failed to parse {}: {source}", path.display())]
    KeyValues {
        /// File path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: KeyValuesError,
    },

    /// A required field is missing or blank.
    #[error("{field} not found in {}", path.display())]
    MissingField {
        /// File path.
        path: PathBuf,
        /// Dotted field path.
        field: &'static str,
    },

    /// The app id is blank or not numeric.
    #[error("Invalid app id: '{0}'")]
    InvalidAppId(String),

    /// No `appmanifest_<id>.acf` exists in any searched location.
    #[error("Required file is not found: appmanifest_{app_id}.acf (searched {})", display_paths(.searched))]
    AppManifestNotFound {
        /// Requested app id.
        app_id: String,
        /// Directories that were searched.
        searched: Vec<PathBuf>,
    },
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Game version and Steam build id of an installation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameInfo {
    /// Version in `3.<major>.<minor>.<patch>` form.
    pub version: String,
    /// Steam build id from the app manifest.
    pub build_id: String,
}

impl GameInfo {
    /// Read version and build id for the installation at `game_root`.
    ///
    /// # Errors
    ///
    /// Returns an error if `Status.json` or the app manifest is missing,
    /// unreadable or lacks the needed fields.
    pub fn load(game_root: &Path, app_id: &str) -> Result<Self, GameInfoError> {
        let version = read_game_version(game_root)?;
        let app_manifest = find_app_manifest(game_root, app_id)?;
        let build_id = read_build_id(&app_manifest)?;

        tracing::debug!(%version, %build_id, manifest = %app_manifest.display(), "detected game");
        Ok(Self { version, build_id })
    }
}

impl fmt::Display for GameInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{} ({})", self.version, self.build_id)
    }
}

/// Read `Status.json` under `game_root` and build `3.<major>.<minor>.<patch>`.
///
/// # Errors
///
/// Returns an error if the file is missing, malformed or lacks a version
/// component.
pub fn read_game_version(game_root: &Path) -> Result<String, GameInfoError> {
    let path = game_root.join(STATUS_FILE_NAME);
    let content = fs::read_to_string(&path).map_err(|source| GameInfoError::Io {
        path: path.clone(),
        source,
    })?;
    let status: Value = serde_json::from_str(&content).map_err(|source| GameInfoError::Json {
        path: path.clone(),
        source,
    })?;

    let game = status.get("Game").ok_or_else(|| GameInfoError::MissingField {
        path: path.clone(),
        field: "Game",
    })?;

    let component = |key: &'static str| {
        game.get(key)
            .and_then(json_scalar)
            .ok_or_else(|| GameInfoError::MissingField {
                path: path.clone(),
                field: key,
            })
    };

    let major = component("Major_Version")?;
    let minor = component("Minor_Version")?;
    let patch = component("Patch_Version")?;

    Ok(format!("3.{major}.{minor}.{patch}"))
}

/// Numbers and non-blank strings, rendered as text.
fn json_scalar(value: &Value) -> Option<String> {
    match value {
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        _ => None,
    }
}

/// Locate `appmanifest_<app_id>.acf` for an installation.
///
/// Searches, in order: `<root>/steamapps` (SteamCMD installs), `<root>`
/// itself, and the `steamapps` directory two levels above `<root>` (client
/// installs under `steamapps/common/<game>`).
///
/// # Errors
///
/// Returns [`GameInfoError::InvalidAppId`] for blank or non-numeric ids and
/// [`GameInfoError::AppManifestNotFound`] when no candidate exists.
pub fn find_app_manifest(root: &Path, app_id: &str) -> Result<PathBuf, GameInfoError> {
    let app_id = app_id.trim();
    if app_id.is_empty() || !app_id.chars().all(|c| c.is_ascii_digit()) {
        return Err(GameInfoError::InvalidAppId(app_id.to_string()));
    }

    let file_name = format!("appmanifest_{app_id}.acf");
    let mut searched = vec![root.join("steamapps"), root.to_path_buf()];
    if let Some(library) = root.parent().and_then(Path::parent) {
        searched.push(library.to_path_buf());
    }

    let found = searched
        .iter()
        .map(|dir| dir.join(&file_name))
        .find(|candidate| candidate.is_file());

    found.ok_or_else(|| GameInfoError::AppManifestNotFound {
        app_id: app_id.to_string(),
        searched,
    })
}

/// Read `AppState.buildid` from an app manifest.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, or has no build id.
pub fn read_build_id(app_manifest: &Path) -> Result<String, GameInfoError> {
    let content = fs::read_to_string(app_manifest).map_err(|source| GameInfoError::Io {
        path: app_manifest.to_path_buf(),
        source,
    })?;
    let root = keyvalues::parse(&content).map_err(|source| GameInfoError::KeyValues {
        path: app_manifest.to_path_buf(),
        source,
    })?;

    root.get_object("AppState")
        .and_then(|app| app.get_str("buildid"))
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .ok_or_else(|| GameInfoError::MissingField {
            path: app_manifest.to_path_buf(),
            field: "AppState.buildid",
        })
}
