//! Info command

use anyhow::{Context, Result};
use redist_core::GameInfo;
use redist_core::layout;
use std::path::Path;
use std::process::ExitCode;

/// Print the game version, build id and managed directory of an installation.
pub fn info(game_root: &Path, app_id: &str) -> Result<ExitCode> {
    let game = GameInfo::load(game_root, app_id)
        .with_context(|| format!("Failed to read game info from {}", game_root.display()))?;

    println!("version:  {}", game.version);
    println!("build id: {}", game.build_id);
    match layout::managed_dir(game_root) {
        Ok(dir) => println!("managed:  {}", dir.display()),
        Err(err) => println!("managed:  ({err})"),
    }

    Ok(ExitCode::SUCCESS)
}
