//! Shared data formats for redist-sync: content digests, the redist manifest
//! and the persisted version state.

pub mod hash;
pub mod manifest;
pub mod persist;
pub mod state;

// Re-exports
pub use hash::*;
pub use manifest::{MANIFEST_FILE_NAME, Manifest, ManifestError};
pub use state::{StateError, VersionState};
