//! Update command

use super::EXIT_NOTHING_TO_PUBLISH;
use crate::UpdateArgs;
use crate::ui::Output;
use anyhow::{Context, Result};
use redist_core::layout;
use redist_core::{
    CommandTransform, CommitNote, Reporter, StatePolicy, SyncOptions, Transform, UpdateRequest,
    run_update,
};
use std::process::ExitCode;

/// Run the full update pipeline for one game installation.
pub fn update(args: &UpdateArgs, output: &Output) -> Result<ExitCode> {
    layout::ensure_supported_platform()?;

    let request = UpdateRequest {
        game_root: args.game_root.clone(),
        redist_dir: args.redist_dir.clone(),
        app_id: args.app_id.clone(),
        sync: SyncOptions::default()
            .allow(non_blank(&args.only))
            .transform(non_blank(&args.publicize)),
        preview: args.preview,
        force: args.force,
        state_policy: if args.lenient_state {
            StatePolicy::Lenient
        } else {
            StatePolicy::Strict
        },
    };

    let publicizer = args
        .publicizer
        .as_ref()
        .map(|program| CommandTransform::new(program).with_args(&args.publicizer_args));
    let transform = publicizer.as_ref().map(|t| t as &dyn Transform);

    let report = run_update(&request, transform, &CommitNote::new(), output)
        .context("Update failed")?;

    match report.published {
        Some(version) => {
            if report.resolution.already_published() {
                output.info(&format!("{version} matches the current nuspec version"));
            }
            output.success(&format!("Published {version} for Unturned {}", report.game));
            Ok(ExitCode::SUCCESS)
        }
        None => {
            output.info(&format!(
                "Nothing to publish, nuspec stays at {}",
                report.previous_version
            ));
            Ok(ExitCode::from(EXIT_NOTHING_TO_PUBLISH))
        }
    }
}

/// Trimmed, non-empty entries of a comma-separated list.
fn non_blank(values: &[String]) -> impl Iterator<Item = &str> {
    values
        .iter()
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_list_entries_are_dropped() {
        let values = vec![
            " Assembly-CSharp.dll".to_string(),
            String::new(),
            "  ".to_string(),
            "UnityEngine.dll ".to_string(),
        ];
        assert_eq!(
            non_blank(&values).collect::<Vec<_>>(),
            ["Assembly-CSharp.dll", "UnityEngine.dll"]
        );
    }
}
