//! redist - keeps an Unturned redistributable package in sync with the game
#![allow(missing_docs)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::doc_markdown)]
//!
//! # Commands
//!
//! - `update` copies changed managed assemblies into the redist directory,
//!   decides whether a new package version is due and writes it into the
//!   `.nuspec`.
//! - `manifest` rebuilds `manifest.sha256.json` from what is already there.
//! - `hash` and `info` are small helpers for debugging a setup.
//!
//! # Exit status
//!
//! `0` when something was published (or the command succeeded), `2` when
//! `update` found nothing to publish, `1` on any error.

pub mod cmd;
pub mod ui;

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "redist")]
#[command(author, version, about = "Keeps a game's redistributable NuGet package up to date")]
pub struct Cli {
    /// Suppress progress output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Sync assemblies and publish a new package version if needed
    Update(UpdateArgs),
    /// Rebuild the hash manifest of a redist directory without copying
    Manifest {
        /// Redist directory
        redist_dir: PathBuf,
        /// Only these files (comma-separated); defaults to the current entries
        #[arg(long, env = "REDIST_ONLY", value_delimiter = ',')]
        only: Vec<String>,
    },
    /// Print the SHA-256 digest of files
    Hash {
        /// Files to hash
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Show the detected game version and build id
    Info {
        /// Game installation root
        game_root: PathBuf,
        /// Steam app id
        #[arg(env = "REDIST_APP_ID")]
        app_id: String,
    },
}

#[derive(Debug, Args)]
pub struct UpdateArgs {
    /// Game installation root
    pub game_root: PathBuf,
    /// Redist directory containing the .nuspec
    pub redist_dir: PathBuf,
    /// Steam app id (304930 client, 1110390 dedicated server)
    #[arg(env = "REDIST_APP_ID")]
    pub app_id: String,
    /// Only sync these files (comma-separated)
    #[arg(long, env = "REDIST_ONLY", value_delimiter = ',')]
    pub only: Vec<String>,
    /// Files to run through the publicizer instead of copying (comma-separated)
    #[arg(long, env = "REDIST_PUBLICIZE", value_delimiter = ',')]
    pub publicize: Vec<String>,
    /// Program invoked as `<CMD> [ARGS..] <SOURCE> <DEST>` for publicized files
    #[arg(long, env = "REDIST_PUBLICIZER")]
    pub publicizer: Option<PathBuf>,
    /// Extra argument passed to the publicizer before the paths (repeatable)
    #[arg(long = "publicizer-arg", allow_hyphen_values = true)]
    pub publicizer_args: Vec<String>,
    /// Publish on the preview track
    #[arg(long, env = "REDIST_PREVIEW")]
    pub preview: bool,
    /// Publish even if the content did not change
    #[arg(long)]
    pub force: bool,
    /// Treat an unreadable version state file as missing instead of failing
    #[arg(long)]
    pub lenient_state: bool,
}
