//! Version state persistence with an explicit failure policy.
//!
//! The stable and preview tracks keep separate state files in the redist
//! directory so a preview publish never masks a stable one.

use crate::reporter::Reporter;
use redist_schema::{StateError, VersionState};
use std::path::{Path, PathBuf};

/// State file for the stable track.
pub const STATE_FILE_NAME: &str = "version-info.json";
/// State file for the preview track.
pub const PREVIEW_STATE_FILE_NAME: &str = "version-info.preview.json";

/// How unreadable or unwritable state is handled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StatePolicy {
    /// Corrupt state and failed saves are errors.
    #[default]
    Strict,
    /// Corrupt state is treated as "no previous state" and failed saves are
    /// reported as warnings.
    Lenient,
}

/// Loads and saves the [`VersionState`] of one publishing track.
#[derive(Debug, Clone)]
pub struct StateTracker {
    path: PathBuf,
    policy: StatePolicy,
}

impl StateTracker {
    /// Tracker for the state file of the given track inside `redist_dir`.
    pub fn new(redist_dir: &Path, preview: bool, policy: StatePolicy) -> Self {
        let name = if preview {
            PREVIEW_STATE_FILE_NAME
        } else {
            STATE_FILE_NAME
        };
        Self {
            path: redist_dir.join(name),
            policy,
        }
    }

    /// Path of the tracked state file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the previous state, `None` on first run.
    ///
    /// # Errors
    ///
    /// Under [`StatePolicy::Strict`], returns the read or parse error. Under
    /// [`StatePolicy::Lenient`] the error is reported and `None` returned.
    pub fn load(&self, reporter: &dyn Reporter) -> Result<Option<VersionState>, StateError> {
        match VersionState::load(&self.path) {
            Ok(state) => Ok(state),
            Err(e) if self.policy == StatePolicy::Lenient => {
                tracing::warn!(error = %e, "ignoring unreadable version state");
                reporter.warning(&format!(
                    "Could not load version info, continuing as first run: {e}"
                ));
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Overwrite the state file with `state`.
    ///
    /// # Errors
    ///
    /// Under [`StatePolicy::Strict`], returns the write error. Under
    /// [`StatePolicy::Lenient`] the error is reported and swallowed.
    pub fn save(&self, state: &VersionState, reporter: &dyn Reporter) -> Result<(), StateError> {
        match state.save(&self.path) {
            Ok(()) => {
                reporter.info(&format!("Version info saved to: {}", self.path.display()));
                Ok(())
            }
            Err(e) if self.policy == StatePolicy::Lenient => {
                tracing::warn!(error = %e, "failed to save version state");
                reporter.warning(&format!("Could not save version info: {e}"));
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}
