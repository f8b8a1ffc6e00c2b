//! The full redist update: detect the game, sync its assemblies, decide the
//! version and publish it into the descriptor.

use crate::commit::CommitNote;
use crate::game_info::{GameInfo, GameInfoError};
use crate::layout::{self, LayoutError};
use crate::nuspec::{Nuspec, NuspecError};
use crate::reporter::Reporter;
use crate::resolver::{Resolution, VersionResolver};
use crate::sync::{SyncEngine, SyncError, SyncOptions, SyncResult};
use crate::tracker::{StatePolicy, StateTracker};
use crate::transform::Transform;
use chrono::Utc;
use redist_schema::{StateError, VersionState};
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised by [`run_update`].
#[derive(Error, Debug)]
pub enum UpdateError {
    /// A required input directory does not exist.
    #[error("{what} doesn't exist: \"{}\"", path.display())]
    MissingDirectory {
        /// Which input it is.
        what: &'static str,
        /// The path given.
        path: PathBuf,
    },

    /// The descriptor has no usable version.
    #[error("Version element not found in nuspec file {}", .0.display())]
    NoCurrentVersion(PathBuf),

    /// Descriptor handling failed.
    #[error(transparent)]
    Nuspec(#[from] NuspecError),

    /// Installation layout is not as expected.
    #[error(transparent)]
    Layout(#[from] LayoutError),

    /// Game metadata could not be read.
    #[error(transparent)]
    GameInfo(#[from] GameInfoError),

    /// Sync failed.
    #[error(transparent)]
    Sync(#[from] SyncError),

    /// Version state could not be loaded or saved.
    #[error(transparent)]
    State(#[from] StateError),

    /// The commit note could not be written.
    #[error("Failed to write commit note: {0}")]
    Commit(#[source] io::Error),
}

/// Inputs of one update run.
#[derive(Debug, Clone)]
pub struct UpdateRequest {
    /// Game installation root.
    pub game_root: PathBuf,
    /// Redist (packaging) directory holding the `.nuspec`.
    pub redist_dir: PathBuf,
    /// Steam app id of the installation.
    pub app_id: String,
    /// Allow-list and transform list.
    pub sync: SyncOptions,
    /// Publish on the preview track.
    pub preview: bool,
    /// Publish even when content is unchanged.
    pub force: bool,
    /// Handling of unreadable version state.
    pub state_policy: StatePolicy,
}

/// What an update run did.
#[derive(Debug, Clone)]
pub struct UpdateReport {
    /// Detected game version and build.
    pub game: GameInfo,
    /// Descriptor version before the run.
    pub previous_version: String,
    /// Version decision.
    pub resolution: Resolution,
    /// Version written to the descriptor, if any.
    pub published: Option<String>,
    /// Files synced and resulting manifest.
    pub sync: SyncResult,
}

impl UpdateReport {
    /// Whether the descriptor was rewritten.
    pub fn is_published(&self) -> bool {
        self.published.is_some()
    }
}

/// Run the whole update pipeline.
///
/// Sync happens before the version decision, so the redist directory and its
/// manifest are refreshed even when nothing ends up being published.
///
/// # Errors
///
/// Any validation, I/O, transform or state error aborts the run. Files already
/// copied stay copied.
pub fn run_update(
    request: &UpdateRequest,
    transform: Option<&dyn Transform>,
    commit_note: &CommitNote,
    reporter: &dyn Reporter,
) -> Result<UpdateReport, UpdateError> {
    ensure_dir("Path", &request.game_root)?;
    ensure_dir("Redist path", &request.redist_dir)?;

    let nuspec_path = Nuspec::find_in(&request.redist_dir)?;
    let mut nuspec = Nuspec::load(&nuspec_path)?;
    let previous_version = nuspec
        .version()
        .ok_or_else(|| UpdateError::NoCurrentVersion(nuspec_path.clone()))?
        .to_string();

    reporter.section("Preparing");
    let managed_dir = layout::managed_dir(&request.game_root)?;
    let game = GameInfo::load(&request.game_root, &request.app_id)?;
    reporter.info(&format!("Found Unturned {game}"));
    reporter.info(&format!("Current nuspec version: {previous_version}"));

    reporter.section("Syncing");
    let mut engine = SyncEngine::new(reporter);
    if let Some(transform) = transform {
        engine = engine.with_transform(transform);
    }
    let sync = engine.sync(&managed_dir, &request.redist_dir, &request.sync)?;
    reporter.summary(sync.updated_files.len(), "updated");

    let aggregate_hash = sync.manifest.aggregate_hash();
    let tracker = StateTracker::new(&request.redist_dir, request.preview, request.state_policy);
    let previous_state = tracker.load(reporter)?;

    let resolver = VersionResolver::new(request.preview);
    let resolution = resolver.resolve(
        &previous_version,
        &game.version,
        &game.build_id,
        &aggregate_hash,
        previous_state.as_ref(),
    );
    tracing::info!(outcome = %resolution.outcome(), "version decision");

    let published = match resolution.version() {
        Some(version) => Some(version.to_string()),
        None if request.force => resolver
            .bump(&game.version, &game.build_id, previous_state.as_ref())
            .version()
            .map(str::to_string),
        None => None,
    };

    let Some(version) = published.as_deref() else {
        reporter.info("Content is the same as the last published version, skipping...");
        return Ok(UpdateReport {
            game,
            previous_version,
            resolution,
            published,
            sync,
        });
    };

    reporter.section("Publishing");
    nuspec.set_version(version)?;
    nuspec.save()?;
    reporter.success(&format!("nuspec version: {previous_version} -> {version}"));

    tracker.save(
        &VersionState {
            game_version: game.version.clone(),
            build_id: game.build_id.clone(),
            nuget_version: version.to_string(),
            files_hash: aggregate_hash,
            last_updated: Utc::now(),
        },
        reporter,
    )?;

    commit_note
        .write(&request.game_root, &game.version, &game.build_id, request.force)
        .map_err(UpdateError::Commit)?;

    Ok(UpdateReport {
        game,
        previous_version,
        resolution,
        published,
        sync,
    })
}

fn ensure_dir(what: &'static str, path: &Path) -> Result<(), UpdateError> {
    if path.is_dir() {
        Ok(())
    } else {
        Err(UpdateError::MissingDirectory {
            what,
            path: path.to_path_buf(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commit::COMMIT_FILE_NAME;
    use crate::layout::{HEADLESS_DATA_DIR, MANAGED_DIR};
    use crate::reporter::NullReporter;
    use crate::resolver::Outcome;
    use crate::tracker::STATE_FILE_NAME;
    use chrono::TimeZone;
    use std::fs;
    use tempfile::{TempDir, tempdir};

    const NUSPEC: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<package xmlns="http://schemas.microsoft.com/packaging/2010/07/nuspec.xsd">
  <metadata>
    <id>Test.Unturned.Redist.Server</id>
    <version>3.25.7.3</version>
  </metadata>
</package>
"#;

    struct Fixture {
        _root: TempDir,
        game: PathBuf,
        managed: PathBuf,
        redist: PathBuf,
    }

    impl Fixture {
        fn new() -> Self {
            let root = tempdir().unwrap();
            let game = root.path().join("Unturned");
            let managed = game.join(HEADLESS_DATA_DIR).join(MANAGED_DIR);
            let redist = root.path().join("redist");
            fs::create_dir_all(&managed).unwrap();
            fs::create_dir_all(game.join("steamapps")).unwrap();
            fs::create_dir_all(&redist).unwrap();

            fs::write(redist.join("Redist.nuspec"), NUSPEC).unwrap();
            fs::write(managed.join("Assembly-CSharp.dll"), "v1").unwrap();
            fs::write(managed.join("UnityEngine.dll"), "engine").unwrap();

            let fixture = Self {
                _root: root,
                game,
                managed,
                redist,
            };
            fixture.set_game(4, "2351");
            fixture
        }

        fn set_game(&self, patch: u32, build_id: &str) {
            fs::write(
                self.game.join("Status.json"),
                format!(
                    r#"{{ "Game": {{ "Major_Version": 25, "Minor_Version": 7, "Patch_Version": {patch} }} }}"#
                ),
            )
            .unwrap();
            fs::write(
                self.game.join("steamapps").join("appmanifest_1110390.acf"),
                format!("\"AppState\"\n{{\n\t\"buildid\"\t\t\"{build_id}\"\n}}\n"),
            )
            .unwrap();
        }

        fn request(&self, preview: bool) -> UpdateRequest {
            UpdateRequest {
                game_root: self.game.clone(),
                redist_dir: self.redist.clone(),
                app_id: "1110390".to_string(),
                sync: SyncOptions::default(),
                preview,
                force: false,
                state_policy: StatePolicy::Strict,
            }
        }

        fn nuspec_version(&self) -> String {
            Nuspec::load(&self.redist.join("Redist.nuspec"))
                .unwrap()
                .version()
                .unwrap()
                .to_string()
        }
    }

    fn note() -> CommitNote {
        let date = Utc.with_ymd_and_hms(2025, 7, 5, 0, 0, 0).unwrap();
        CommitNote::with_clock(move || date)
    }

    fn run(request: &UpdateRequest) -> UpdateReport {
        run_update(request, None, &note(), &NullReporter).unwrap()
    }

    #[test]
    fn first_run_publishes_game_version() {
        let f = Fixture::new();
        let report = run(&f.request(false));

        assert_eq!(report.published.as_deref(), Some("3.25.7.4"));
        assert_eq!(f.nuspec_version(), "3.25.7.4");
        assert_eq!(report.sync.updated_files.len(), 2);
        assert_eq!(
            fs::read_to_string(f.redist.join("Assembly-CSharp.dll")).unwrap(),
            "v1"
        );

        let state = VersionState::load(&f.redist.join(STATE_FILE_NAME))
            .unwrap()
            .unwrap();
        assert_eq!(state.nuget_version, "3.25.7.4");
        assert_eq!(state.files_hash, report.sync.manifest.aggregate_hash());

        assert_eq!(
            fs::read_to_string(f.game.join(COMMIT_FILE_NAME)).unwrap(),
            "05 July 2025 - Version 3.25.7.4 (2351)"
        );
    }

    #[test]
    fn unchanged_content_is_not_republished() {
        let f = Fixture::new();
        run(&f.request(false));
        fs::remove_file(f.game.join(COMMIT_FILE_NAME)).unwrap();

        let report = run(&f.request(false));

        assert!(!report.is_published());
        assert_eq!(report.resolution.outcome(), &Outcome::Unchanged);
        assert!(report.sync.updated_files.is_empty());
        assert!(!f.game.join(COMMIT_FILE_NAME).exists());
    }

    #[test]
    fn preview_hotfix_gets_build_suffix() {
        let f = Fixture::new();
        run(&f.request(true));

        fs::write(f.managed.join("Assembly-CSharp.dll"), "v1-hotfix").unwrap();
        f.set_game(4, "2400");
        let report = run(&f.request(true));

        assert_eq!(report.published.as_deref(), Some("3.25.7.4-preview2400"));
        assert_eq!(f.nuspec_version(), "3.25.7.4-preview2400");
    }

    #[test]
    fn new_game_version_wins_over_preview() {
        let f = Fixture::new();
        run(&f.request(true));

        fs::write(f.managed.join("Assembly-CSharp.dll"), "v2").unwrap();
        f.set_game(5, "2500");
        let report = run(&f.request(true));

        assert_eq!(
            report.resolution.outcome(),
            &Outcome::NewVersion("3.25.7.5".to_string())
        );
        assert_eq!(f.nuspec_version(), "3.25.7.5");
    }

    #[test]
    fn force_republishes_and_marks_note() {
        let f = Fixture::new();
        run(&f.request(false));

        let mut request = f.request(false);
        request.force = true;
        let report = run(&request);

        assert_eq!(report.resolution.outcome(), &Outcome::Unchanged);
        assert_eq!(report.published.as_deref(), Some("3.25.7.4"));
        assert_eq!(
            fs::read_to_string(f.game.join(COMMIT_FILE_NAME)).unwrap(),
            "05 July 2025 - Version 3.25.7.4 (2351) [Forced]"
        );
    }

    #[test]
    fn missing_redist_dir_is_rejected() {
        let f = Fixture::new();
        let mut request = f.request(false);
        request.redist_dir = f.redist.join("missing");

        let err = run_update(&request, None, &note(), &NullReporter).unwrap_err();
        assert!(matches!(
            err,
            UpdateError::MissingDirectory {
                what: "Redist path",
                ..
            }
        ));
    }

    #[test]
    fn missing_allow_listed_file_aborts_before_publish() {
        let f = Fixture::new();
        let mut request = f.request(false);
        request.sync = SyncOptions::default().allow(["Assembly-CSharp.dll", "Missing.dll"]);

        let err = run_update(&request, None, &note(), &NullReporter).unwrap_err();
        assert!(matches!(err, UpdateError::Sync(SyncError::FilesNotFound(_))));
        assert_eq!(f.nuspec_version(), "3.25.7.3");
    }
}
