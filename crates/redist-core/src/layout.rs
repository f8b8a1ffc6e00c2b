//! Locating the managed assemblies inside a game installation.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Data directory of the dedicated (headless) server build.
pub const HEADLESS_DATA_DIR: &str = "Unturned_Headless_Data";
/// Data directory of the regular client build.
pub const CLIENT_DATA_DIR: &str = "Unturned_Data";
/// Directory under the data directory holding the .NET assemblies.
pub const MANAGED_DIR: &str = "Managed";

/// Errors raised while resolving the installation layout.
#[derive(Error, Debug)]
pub enum LayoutError {
    /// Neither data directory exists.
    #[error("Unturned Data directory cannot be found in {}", .0.display())]
    DataDirNotFound(PathBuf),

    /// The data directory has no `Managed` subdirectory.
    #[error("Unturned Managed Directory not found: \"{}\"", .0.display())]
    ManagedDirNotFound(PathBuf),

    /// The running OS ships neither build of the game.
    #[error("Unsupported platform: {0}")]
    UnsupportedPlatform(&'static str),
}

/// Fail unless the game ships a build for the running OS.
///
/// # Errors
///
/// Returns [`LayoutError::UnsupportedPlatform`] on anything but Linux and
/// Windows.
pub fn ensure_supported_platform() -> Result<(), LayoutError> {
    if cfg!(any(target_os = "linux", target_os = "windows")) {
        Ok(())
    } else {
        Err(LayoutError::UnsupportedPlatform(std::env::consts::OS))
    }
}

/// Data directory names in lookup order for the running platform.
fn data_dir_candidates() -> [&'static str; 2] {
    if cfg!(windows) {
        [CLIENT_DATA_DIR, HEADLESS_DATA_DIR]
    } else {
        [HEADLESS_DATA_DIR, CLIENT_DATA_DIR]
    }
}

/// The game's data directory under `game_root`.
///
/// Linux prefers the headless build, Windows the client build; either falls
/// back to the other.
///
/// # Errors
///
/// Returns [`LayoutError::DataDirNotFound`] if neither exists.
pub fn data_dir(game_root: &Path) -> Result<PathBuf, LayoutError> {
    data_dir_candidates()
        .into_iter()
        .map(|name| game_root.join(name))
        .find(|dir| dir.is_dir())
        .ok_or_else(|| LayoutError::DataDirNotFound(game_root.to_path_buf()))
}

/// The `Managed` assembly directory under `game_root`.
///
/// # Errors
///
/// Returns an error if the data directory or its `Managed` subdirectory is
/// missing.
pub fn managed_dir(game_root: &Path) -> Result<PathBuf, LayoutError> {
    let managed = data_dir(game_root)?.join(MANAGED_DIR);
    if managed.is_dir() {
        Ok(managed)
    } else {
        Err(LayoutError::ManagedDirNotFound(managed))
    }
}
