//! Reporter trait for dependency injection
//!
//! This trait allows the sync engine and the update pipeline to report
//! progress and status without being coupled to a specific console
//! implementation.

use std::path::Path;

/// Sink for user-facing progress messages.
pub trait Reporter: Send + Sync {
    /// Indicates a new section or phase has started (e.g. "Syncing").
    fn section(&self, title: &str);

    /// A file was copied (or transformed) from `from` to `to`.
    fn updated(&self, from: &Path, to: &Path);

    /// A file was left alone because its content already matched.
    fn unchanged(&self, name: &str);

    /// Log an informational message.
    fn info(&self, msg: &str);

    /// Log a success message.
    fn success(&self, msg: &str);

    /// Log a warning message.
    fn warning(&self, msg: &str);

    /// Log an error message.
    fn error(&self, msg: &str);

    /// Display a final summary line.
    fn summary(&self, count: usize, action: &str);
}

/// A no-op reporter for silent operations (e.g., testing).
#[derive(Debug, Clone, Copy)]
pub struct NullReporter;

impl Reporter for NullReporter {
    fn section(&self, _: &str) {}
    fn updated(&self, _: &Path, _: &Path) {}
    fn unchanged(&self, _: &str) {}
    fn info(&self, _: &str) {}
    fn success(&self, _: &str) {}
    fn warning(&self, _: &str) {}
    fn error(&self, _: &str) {}
    fn summary(&self, _: usize, _: &str) {}
}
