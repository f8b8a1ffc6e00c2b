//! Manifest command

use crate::ui::Output;
use anyhow::{Context, Result};
use redist_core::{Reporter, rebuild_manifest};
use std::collections::BTreeSet;
use std::path::Path;
use std::process::ExitCode;

/// Rehash the files of a redist directory and rewrite its manifest.
pub fn manifest(redist_dir: &Path, only: &[String], output: &Output) -> Result<ExitCode> {
    let allow_list: BTreeSet<String> = only.iter().cloned().collect();

    output.section("Rebuilding manifest");
    let manifest = rebuild_manifest(redist_dir, &allow_list)
        .with_context(|| format!("Failed to rebuild manifest in {}", redist_dir.display()))?;

    for (name, digest) in &manifest {
        output.info(&format!("{digest}  {name}"));
    }
    output.summary(manifest.len(), "hashed");
    output.info(&format!("Aggregate hash: {}", manifest.aggregate_hash()));

    Ok(ExitCode::SUCCESS)
}
