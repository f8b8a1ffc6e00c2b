//! The `.commit` note consumed by the pipeline as a commit message.

use chrono::{DateTime, Utc};
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

/// File name of the note.
pub const COMMIT_FILE_NAME: &str = ".commit";

/// Writes `.commit` notes, e.g. `05 July 2025 - Version 3.25.7.4 (4202) [Forced]`.
pub struct CommitNote {
    clock: Box<dyn Fn() -> DateTime<Utc> + Send + Sync>,
}

impl fmt::Debug for CommitNote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommitNote").finish_non_exhaustive()
    }
}

impl Default for CommitNote {
    fn default() -> Self {
        Self::new()
    }
}

impl CommitNote {
    /// Writer stamped with the current UTC time.
    pub fn new() -> Self {
        Self::with_clock(Utc::now)
    }

    /// Writer stamped by `clock`.
    pub fn with_clock(clock: impl Fn() -> DateTime<Utc> + Send + Sync + 'static) -> Self {
        Self {
            clock: Box::new(clock),
        }
    }

    /// Text of the note.
    pub fn render(&self, version: &str, build_id: &str, forced: bool) -> String {
        let date = (self.clock)().format("%d %B %Y");
        let forced_note = if forced { " [Forced]" } else { "" };
        format!("{date} - Version {version} ({build_id}){forced_note}")
    }

    /// Write the note to `dir/.commit` and return its path.
    ///
    /// # Errors
    ///
    /// Returns the I/O error if the file cannot be written.
    pub fn write(
        &self,
        dir: &Path,
        version: &str,
        build_id: &str,
        forced: bool,
    ) -> io::Result<PathBuf> {
        let path = dir.join(COMMIT_FILE_NAME);
        std::fs::write(&path, self.render(version, build_id, forced))?;
        Ok(path)
    }
}
