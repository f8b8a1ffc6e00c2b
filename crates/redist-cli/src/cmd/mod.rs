//! Subcommand implementations.

pub mod hash;
pub mod info;
pub mod manifest;
pub mod update;

/// Exit status of `update` when there was nothing to publish.
pub const EXIT_NOTHING_TO_PUBLISH: u8 = 2;
