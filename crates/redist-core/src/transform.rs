//! Content transforms applied to selected files during sync.
//!
//! A transform reads the source file and writes a rewritten version to the
//! destination (e.g. an assembly publicizer that relaxes member visibility).
//! The sync engine only knows the [`Transform`] trait, so tests can substitute
//! a double and production can shell out to any tool.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;
use thiserror::Error;

/// Failure raised by a [`Transform`].
#[derive(Error, Debug)]
pub enum TransformError {
    /// The transform program could not be started.
    #[error("Failed to run {program}: {source}")]
    Spawn {
        /// Program that was invoked.
        program: String,
        /// Underlying error.
        #[source]
        source: io::Error,
    },

    /// The transform program exited unsuccessfully.
    #[error("{program} exited with {status}: {stderr}")]
    Failed {
        /// Program that was invoked.
        program: String,
        /// Exit status description.
        status: String,
        /// Captured standard error, trimmed.
        stderr: String,
    },

    /// The transform ran but left no output at the destination.
    #[error("Transform produced no output at {0}")]
    MissingOutput(PathBuf),

    /// IO error inside an in-process transform.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Rewrites `src` into `dst`.
pub trait Transform: Send + Sync {
    /// Read `src` and write the transformed bytes to `dst`, overwriting it.
    ///
    /// # Errors
    ///
    /// Returns a [`TransformError`] describing why the rewrite failed.
    fn apply(&self, src: &Path, dst: &Path) -> Result<(), TransformError>;
}

/// Runs an external program as `<program> [args...] <src> <dst>`.
#[derive(Debug, Clone)]
pub struct CommandTransform {
    program: PathBuf,
    args: Vec<String>,
}

impl CommandTransform {
    /// Create a transform invoking `program` with no extra arguments.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Arguments inserted before the source and destination paths.
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }
}

impl Transform for CommandTransform {
    fn apply(&self, src: &Path, dst: &Path) -> Result<(), TransformError> {
        let program = self.program.display().to_string();
        tracing::debug!(%program, src = %src.display(), dst = %dst.display(), "running transform");

        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(src)
            .arg(dst)
            .output()
            .map_err(|source| TransformError::Spawn {
                program: program.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(TransformError::Failed {
                program,
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        if !dst.is_file() {
            return Err(TransformError::MissingOutput(dst.to_path_buf()));
        }

        Ok(())
    }
}

/// Wraps a closure as a [`Transform`].
pub struct FnTransform<F>(pub F);

impl<F> fmt::Debug for FnTransform<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnTransform").finish_non_exhaustive()
    }
}

impl<F> Transform for FnTransform<F>
where
    F: Fn(&Path, &Path) -> Result<(), TransformError> + Send + Sync,
{
    fn apply(&self, src: &Path, dst: &Path) -> Result<(), TransformError> {
        (self.0)(src, dst)
    }
}
