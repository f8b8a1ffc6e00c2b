//! Hash command

use anyhow::{Context, Result};
use redist_schema::Sha256Digest;
use std::path::PathBuf;
use std::process::ExitCode;

/// Print `<digest> <path>` for each file.
pub fn hash(files: &[PathBuf]) -> Result<ExitCode> {
    for file in files {
        let digest = Sha256Digest::compute_file(file)
            .with_context(|| format!("Failed to hash {}", file.display()))?;
        println!("{} {}", digest, file.display());
    }
    Ok(ExitCode::SUCCESS)
}
