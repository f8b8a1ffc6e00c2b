//! Decides which version string, if any, to publish.
//!
//! Inputs are the version currently in the package descriptor, the detected
//! game version and Steam build id, the aggregate hash of the fresh manifest
//! and the state recorded on the last publish.

use redist_schema::{Sha256Digest, VersionState};
use std::fmt;

/// Terminal outcome of a resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Content hash matches the last publish; nothing to do.
    Unchanged,
    /// First publish, or the game version moved: publish the plain version.
    NewVersion(String),
    /// Same game version, new content, stable track: republish the plain version.
    PlainBump(String),
    /// Same game version, new content, preview track: `<version>-preview<build>`.
    PreviewBump(String),
}

impl Outcome {
    /// Version string to publish, `None` for [`Outcome::Unchanged`].
    pub fn version(&self) -> Option<&str> {
        match self {
            Self::Unchanged => None,
            Self::NewVersion(v) | Self::PlainBump(v) | Self::PreviewBump(v) => Some(v),
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unchanged => write!(f, "unchanged"),
            Self::NewVersion(v) => write!(f, "new version {v}"),
            Self::PlainBump(v) => write!(f, "bump to {v}"),
            Self::PreviewBump(v) => write!(f, "preview bump to {v}"),
        }
    }
}

/// An [`Outcome`] plus whether it actually requires a publish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    outcome: Outcome,
    already_published: bool,
}

impl Resolution {
    /// The decided outcome.
    pub fn outcome(&self) -> &Outcome {
        &self.outcome
    }

    /// True when the descriptor must be rewritten with [`Self::version`].
    ///
    /// A computed version equal to the one already in the descriptor does not
    /// need publishing even though the content hash moved.
    pub fn needs_publish(&self) -> bool {
        self.outcome != Outcome::Unchanged && !self.already_published
    }

    /// Version string to publish when [`Self::needs_publish`] is true.
    pub fn version(&self) -> Option<&str> {
        if self.needs_publish() {
            self.outcome.version()
        } else {
            None
        }
    }

    /// Whether the computed version was already in the descriptor.
    pub fn already_published(&self) -> bool {
        self.already_published
    }
}

/// Version decision engine for one publishing track.
#[derive(Debug, Clone, Copy, Default)]
pub struct VersionResolver {
    preview: bool,
}

impl VersionResolver {
    /// Resolver for the stable (`preview = false`) or preview track.
    pub fn new(preview: bool) -> Self {
        Self { preview }
    }

    /// Decide what to publish.
    pub fn resolve(
        &self,
        current_published: &str,
        game_version: &str,
        build_id: &str,
        aggregate_hash: &Sha256Digest,
        previous: Option<&VersionState>,
    ) -> Resolution {
        let outcome = match previous {
            Some(state) if &state.files_hash == aggregate_hash => Outcome::Unchanged,
            _ => self.bump(game_version, build_id, previous),
        };

        let already_published = outcome
            .version()
            .is_some_and(|v| v == current_published);

        tracing::debug!(%outcome, already_published, "resolved version");

        Resolution {
            outcome,
            already_published,
        }
    }

    /// The outcome a content change would produce, ignoring the hash check.
    ///
    /// Used when a publish is forced.
    pub fn bump(
        &self,
        game_version: &str,
        build_id: &str,
        previous: Option<&VersionState>,
    ) -> Outcome {
        match previous {
            Some(state) if state.game_version == game_version => {
                if self.preview {
                    Outcome::PreviewBump(preview_version(game_version, build_id))
                } else {
                    Outcome::PlainBump(game_version.to_string())
                }
            }
            _ => Outcome::NewVersion(game_version.to_string()),
        }
    }
}

/// `<game_version>-preview<build_id>`
pub fn preview_version(game_version: &str, build_id: &str) -> String {
    format!("{game_version}-preview{build_id}")
}
