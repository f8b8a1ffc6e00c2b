//! redist-core - Core library for redist-sync
//!
//! Keeps a NuGet redistributable package of a game's managed assemblies in
//! step with the installed game.
//!
//! # Overview
//!
//! - [`sync`] copies changed assemblies from the game into the redist
//!   directory and maintains the hash manifest.
//! - [`resolver`] decides whether the package needs a new version.
//! - [`tracker`] persists what was last published.
//! - [`pipeline`] ties those together with game detection ([`game_info`],
//!   [`layout`]) and descriptor editing ([`nuspec`]).

pub mod commit;
pub mod game_info;
pub mod keyvalues;
pub mod layout;
pub mod nuspec;
pub mod pipeline;
pub mod reporter;
pub mod resolver;
pub mod sync;
pub mod tracker;
pub mod transform;

pub use commit::CommitNote;
pub use game_info::GameInfo;
pub use nuspec::Nuspec;
pub use pipeline::{UpdateError, UpdateReport, UpdateRequest, run_update};
pub use reporter::{NullReporter, Reporter};
pub use resolver::{Outcome, Resolution, VersionResolver};
pub use sync::{SyncEngine, SyncError, SyncOptions, SyncResult, rebuild_manifest};
pub use tracker::{StatePolicy, StateTracker};
pub use transform::{CommandTransform, Transform, TransformError};
