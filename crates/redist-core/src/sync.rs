//! Redist synchronization.
//!
//! Copies the game's managed assemblies into the redist directory, skipping
//! files whose content already matches, and records a manifest of digests for
//! every synced file.
//!
//! # Manifest policy
//!
//! The manifest covers the whole working set (the allow-list, or every source
//! file when the allow-list is empty) as it exists in the redist directory
//! after the sync, not only the files copied by this run. Unchanged files
//! therefore still contribute to the aggregate hash.
//!
//! # Failure
//!
//! The first I/O or transform failure aborts the sync. Files copied before
//! the failure stay copied and no manifest is written.

use crate::reporter::Reporter;
use crate::transform::{Transform, TransformError};
use redist_schema::{MANIFEST_FILE_NAME, Manifest, ManifestError, Sha256Digest, digest_file};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

/// Errors raised by [`SyncEngine`].
#[derive(Error, Debug)]
pub enum SyncError {
    /// The source directory holds no files.
    #[error("{0} is empty")]
    EmptySource(PathBuf),

    /// Allow-listed files that do not exist.
    #[error("Files not found: {}", .0.join(", "))]
    FilesNotFound(Vec<String>),

    /// A file needs a transform but no transform was configured.
    #[error("No transform configured for {0}")]
    TransformUnavailable(String),

    /// Hashing, copying or listing a specific path failed.
    #[error("IO error on {}: {source}", path.display())]
    Io {
        /// Offending path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },

    /// The transform for a file failed.
    #[error("Transform failed for {file}: {source}")]
    Transform {
        /// File name being transformed.
        file: String,
        /// Error reported by the transform.
        #[source]
        source: TransformError,
    },

    /// The manifest could not be written.
    #[error(transparent)]
    Manifest(#[from] ManifestError),
}

impl SyncError {
    fn io(path: &Path, source: io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Which files to sync and which to transform.
#[derive(Debug, Clone, Default)]
pub struct SyncOptions {
    /// File names to restrict the sync to. Empty means every source file.
    pub allow_list: BTreeSet<String>,
    /// File names rewritten by the transform instead of copied.
    pub transform_names: BTreeSet<String>,
}

impl SyncOptions {
    /// Restrict the sync to `names`.
    pub fn allow<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allow_list.extend(names.into_iter().map(Into::into));
        self
    }

    /// Route `names` through the transform.
    pub fn transform<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.transform_names.extend(names.into_iter().map(Into::into));
        self
    }
}

/// Outcome of a successful sync.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncResult {
    /// Source path → redist path for every file copied or transformed.
    pub updated_files: BTreeMap<PathBuf, PathBuf>,
    /// Digests of the working set as it exists in the redist directory.
    pub manifest: Manifest,
}

/// Syncs a source directory into a redist directory.
pub struct SyncEngine<'a> {
    reporter: &'a dyn Reporter,
    transform: Option<&'a dyn Transform>,
}

impl std::fmt::Debug for SyncEngine<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncEngine")
            .field("transform", &self.transform.is_some())
            .finish_non_exhaustive()
    }
}

impl<'a> SyncEngine<'a> {
    /// Create an engine reporting progress to `reporter`.
    pub fn new(reporter: &'a dyn Reporter) -> Self {
        Self {
            reporter,
            transform: None,
        }
    }

    /// Use `transform` for files listed in [`SyncOptions::transform_names`].
    pub fn with_transform(mut self, transform: &'a dyn Transform) -> Self {
        self.transform = Some(transform);
        self
    }

    /// Sync `source_dir` into `dest_dir` and write the manifest there.
    ///
    /// # Errors
    ///
    /// Fails before touching the destination if the source is empty, an
    /// allow-listed file is missing, or a transform is needed but not
    /// configured. Fails part-way with [`SyncError::Io`] or
    /// [`SyncError::Transform`] naming the offending file.
    pub fn sync(
        &self,
        source_dir: &Path,
        dest_dir: &Path,
        options: &SyncOptions,
    ) -> Result<SyncResult, SyncError> {
        let source_files = list_files(source_dir)?;
        if source_files.is_empty() {
            return Err(SyncError::EmptySource(source_dir.to_path_buf()));
        }

        let working_set = select(&source_files, &options.allow_list)?;

        if self.transform.is_none() {
            if let Some(name) = working_set
                .keys()
                .find(|name| options.transform_names.contains(*name))
            {
                return Err(SyncError::TransformUnavailable(name.clone()));
            }
        }

        let mut result = SyncResult::default();

        for (name, src) in working_set {
            let dst = dest_dir.join(&name);

            let copied = if options.transform_names.contains(&name) {
                self.transform_file(&name, &src, &dst)?;
                true
            } else {
                copy_if_changed(&src, &dst)?
            };

            let dst_digest = digest_file(&dst).map_err(|e| SyncError::io(&dst, e))?;
            tracing::debug!(file = %name, digest = %dst_digest, copied, "synced");

            if copied {
                self.reporter.updated(&src, &dst);
                result.updated_files.insert(src, dst);
            } else {
                self.reporter.unchanged(&name);
            }
            result.manifest.insert(name, dst_digest);
        }

        result.manifest.save(&dest_dir.join(MANIFEST_FILE_NAME))?;
        tracing::info!(
            updated = result.updated_files.len(),
            entries = result.manifest.len(),
            "sync complete"
        );

        Ok(result)
    }

    fn transform_file(&self, name: &str, src: &Path, dst: &Path) -> Result<(), SyncError> {
        let Some(transform) = self.transform else {
            return Err(SyncError::TransformUnavailable(name.to_string()));
        };
        transform
            .apply(src, dst)
            .map_err(|source| SyncError::Transform {
                file: name.to_string(),
                source,
            })
    }
}

/// Copy `src` over `dst` unless both already hold the same bytes.
fn copy_if_changed(src: &Path, dst: &Path) -> Result<bool, SyncError> {
    let src_digest = digest_file(src).map_err(|e| SyncError::io(src, e))?;

    if dst.is_file() {
        let dst_digest = digest_file(dst).map_err(|e| SyncError::io(dst, e))?;
        if src_digest == dst_digest {
            return Ok(false);
        }
    }

    fs::copy(src, dst).map_err(|e| SyncError::io(dst, e))?;
    Ok(true)
}

/// Recompute the manifest of files already in `dest_dir` and write it.
///
/// Hashes the allow-listed files, or the entries of the existing manifest when
/// the allow-list is empty. Nothing is copied.
///
/// # Errors
///
/// Returns [`SyncError::FilesNotFound`] if any listed file is missing, or an
/// I/O / manifest error.
pub fn rebuild_manifest(
    dest_dir: &Path,
    allow_list: &BTreeSet<String>,
) -> Result<Manifest, SyncError> {
    let manifest_path = dest_dir.join(MANIFEST_FILE_NAME);

    let names: BTreeSet<String> = if allow_list.is_empty() {
        Manifest::load(&manifest_path)?
            .iter()
            .map(|(name, _)| name.to_string())
            .collect()
    } else {
        allow_list.clone()
    };

    let missing: Vec<String> = names
        .iter()
        .filter(|name| !dest_dir.join(name).is_file())
        .cloned()
        .collect();
    if !missing.is_empty() {
        return Err(SyncError::FilesNotFound(missing));
    }

    let mut manifest = Manifest::new();
    for name in names {
        let path = dest_dir.join(&name);
        let digest: Sha256Digest = digest_file(&path).map_err(|e| SyncError::io(&path, e))?;
        manifest.insert(name, digest);
    }

    manifest.save(&manifest_path)?;
    Ok(manifest)
}

/// Regular files directly inside `dir`, keyed by file name. Symlinks count
/// when they resolve to a regular file.
fn list_files(dir: &Path) -> Result<BTreeMap<String, PathBuf>, SyncError> {
    let mut files = BTreeMap::new();

    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(dir).to_path_buf();
            SyncError::Io {
                path,
                source: e.into(),
            }
        })?;
        if !entry.path().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        files.insert(name, entry.into_path());
    }

    Ok(files)
}

/// Apply the allow-list, reporting every missing name at once.
fn select(
    source_files: &BTreeMap<String, PathBuf>,
    allow_list: &BTreeSet<String>,
) -> Result<BTreeMap<String, PathBuf>, SyncError> {
    if allow_list.is_empty() {
        return Ok(source_files.clone());
    }

    let missing: Vec<String> = allow_list
        .iter()
        .filter(|name| !source_files.contains_key(*name))
        .cloned()
        .collect();
    if !missing.is_empty() {
        return Err(SyncError::FilesNotFound(missing));
    }

    Ok(source_files
        .iter()
        .filter(|(name, _)| allow_list.contains(*name))
        .map(|(name, path)| (name.clone(), path.clone()))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reporter::NullReporter;
    use crate::transform::FnTransform;
    use redist_schema::digest;
    use tempfile::{TempDir, tempdir};

    struct Dirs {
        _root: TempDir,
        source: PathBuf,
        target: PathBuf,
    }

    fn dirs() -> Dirs {
        let root = tempdir().unwrap();
        let source = root.path().join("source");
        let target = root.path().join("target");
        fs::create_dir_all(&source).unwrap();
        fs::create_dir_all(&target).unwrap();
        Dirs {
            _root: root,
            source,
            target,
        }
    }

    fn write(dir: &Path, name: &str, content: &str) {
        fs::write(dir.join(name), content).unwrap();
    }

    fn read(dir: &Path, name: &str) -> String {
        fs::read_to_string(dir.join(name)).unwrap()
    }

    #[test]
    fn copies_only_changed_files() {
        let d = dirs();
        write(&d.source, "Test.dll", "hello");
        write(&d.target, "Test.dll", "stale");
        write(&d.source, "Unchanged.dll", "same");
        write(&d.target, "Unchanged.dll", "same");

        let result = SyncEngine::new(&NullReporter)
            .sync(&d.source, &d.target, &SyncOptions::default())
            .unwrap();

        assert_eq!(
            result.updated_files.get(&d.source.join("Test.dll")),
            Some(&d.target.join("Test.dll"))
        );
        assert!(!result
            .updated_files
            .contains_key(&d.source.join("Unchanged.dll")));
        assert_eq!(read(&d.target, "Test.dll"), "hello");

        assert_eq!(result.manifest.get("Test.dll"), Some(&digest(b"hello")));
        assert_eq!(result.manifest.get("Unchanged.dll"), Some(&digest(b"same")));
        assert_eq!(result.manifest.len(), 2);

        let on_disk = Manifest::load(&d.target.join(MANIFEST_FILE_NAME)).unwrap();
        assert_eq!(on_disk, result.manifest);
    }

    #[test]
    fn unchanged_allow_listed_file_stays_in_manifest() {
        let d = dirs();
        write(&d.source, "Unchanged.dll", "same");
        write(&d.target, "Unchanged.dll", "same");

        let options = SyncOptions::default().allow(["Unchanged.dll"]);
        let result = SyncEngine::new(&NullReporter)
            .sync(&d.source, &d.target, &options)
            .unwrap();

        assert!(result.updated_files.is_empty());
        assert_eq!(result.manifest.get("Unchanged.dll"), Some(&digest(b"same")));
    }

    #[test]
    fn missing_destination_file_is_copied() {
        let d = dirs();
        write(&d.source, "New.dll", "fresh");

        let result = SyncEngine::new(&NullReporter)
            .sync(&d.source, &d.target, &SyncOptions::default())
            .unwrap();

        assert_eq!(read(&d.target, "New.dll"), "fresh");
        assert_eq!(result.updated_files.len(), 1);
    }

    #[test]
    fn allow_list_restricts_working_set() {
        let d = dirs();
        for name in ["Test1.dll", "Test2.dll", "Test3.dll"] {
            write(&d.source, name, "new");
            write(&d.target, name, "old");
        }

        let options = SyncOptions::default().allow(["Test1.dll", "Test3.dll"]);
        let result = SyncEngine::new(&NullReporter)
            .sync(&d.source, &d.target, &options)
            .unwrap();

        assert_eq!(read(&d.target, "Test1.dll"), "new");
        assert_eq!(read(&d.target, "Test2.dll"), "old");
        assert_eq!(read(&d.target, "Test3.dll"), "new");
        assert_eq!(result.updated_files.len(), 2);
        assert_eq!(result.manifest.len(), 2);
        assert!(!result.manifest.contains("Test2.dll"));
    }

    #[test]
    fn missing_allow_listed_files_fail_before_copying() {
        let d = dirs();
        write(&d.source, "Test1.dll", "new");
        write(&d.target, "Test1.dll", "old");

        let options = SyncOptions::default().allow(["Test1.dll", "Missing.dll", "Gone.dll"]);
        let err = SyncEngine::new(&NullReporter)
            .sync(&d.source, &d.target, &options)
            .unwrap_err();

        match err {
            SyncError::FilesNotFound(names) => {
                assert_eq!(names, vec!["Gone.dll".to_string(), "Missing.dll".to_string()]);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(read(&d.target, "Test1.dll"), "old");
        assert!(!d.target.join(MANIFEST_FILE_NAME).exists());
    }

    #[test]
    fn empty_source_is_rejected() {
        let d = dirs();
        fs::create_dir_all(d.source.join("nested")).unwrap();

        let err = SyncEngine::new(&NullReporter)
            .sync(&d.source, &d.target, &SyncOptions::default())
            .unwrap_err();
        assert!(matches!(err, SyncError::EmptySource(_)));
    }

    #[test]
    fn second_run_is_idempotent() {
        let d = dirs();
        write(&d.source, "A.dll", "a");
        write(&d.source, "B.dll", "b");
        write(&d.target, "A.dll", "old");

        let engine = SyncEngine::new(&NullReporter);
        let first = engine
            .sync(&d.source, &d.target, &SyncOptions::default())
            .unwrap();
        let second = engine
            .sync(&d.source, &d.target, &SyncOptions::default())
            .unwrap();

        assert_eq!(first.updated_files.len(), 2);
        assert!(second.updated_files.is_empty());
        assert_eq!(first.manifest, second.manifest);
    }

    #[cfg(unix)]
    #[test]
    fn symlinked_source_files_are_synced() {
        let d = dirs();
        let store = d.source.parent().unwrap().join("store");
        fs::create_dir_all(&store).unwrap();
        write(&store, "Real.dll", "linked");
        write(&d.source, "Plain.dll", "plain");
        std::os::unix::fs::symlink(store.join("Real.dll"), d.source.join("Linked.dll")).unwrap();

        let result = SyncEngine::new(&NullReporter)
            .sync(&d.source, &d.target, &SyncOptions::default())
            .unwrap();
        assert_eq!(
            result.manifest.iter().map(|(name, _)| name).collect::<Vec<_>>(),
            ["Linked.dll", "Plain.dll"]
        );
        assert_eq!(read(&d.target, "Linked.dll"), "linked");

        let options = SyncOptions::default().allow(["Linked.dll"]);
        let result = SyncEngine::new(&NullReporter)
            .sync(&d.source, &d.target, &options)
            .unwrap();
        assert_eq!(result.manifest.get("Linked.dll"), Some(&digest(b"linked")));
    }

    #[test]
    fn transformed_files_are_always_updated() {
        let d = dirs();
        write(&d.source, "Assembly-CSharp.dll", "internal");
        write(&d.source, "Other.dll", "other");

        let publicize = FnTransform(|src: &Path, dst: &Path| -> Result<(), TransformError> {
            let data = fs::read_to_string(src)?;
            fs::write(dst, data.replace("internal", "public"))?;
            Ok(())
        });
        let engine = SyncEngine::new(&NullReporter).with_transform(&publicize);
        let options = SyncOptions::default().transform(["Assembly-CSharp.dll"]);

        let first = engine.sync(&d.source, &d.target, &options).unwrap();
        let second = engine.sync(&d.source, &d.target, &options).unwrap();

        assert_eq!(read(&d.target, "Assembly-CSharp.dll"), "public");
        assert_eq!(
            first.manifest.get("Assembly-CSharp.dll"),
            Some(&digest(b"public"))
        );
        assert_eq!(second.updated_files.len(), 1);
        assert!(second
            .updated_files
            .contains_key(&d.source.join("Assembly-CSharp.dll")));
    }

    #[test]
    fn transform_failure_names_file() {
        let d = dirs();
        write(&d.source, "Assembly-CSharp.dll", "internal");

        let broken = FnTransform(|_: &Path, _: &Path| -> Result<(), TransformError> {
            Err(TransformError::Io(io::Error::other("corrupt image")))
        });
        let options = SyncOptions::default().transform(["Assembly-CSharp.dll"]);
        let err = SyncEngine::new(&NullReporter)
            .with_transform(&broken)
            .sync(&d.source, &d.target, &options)
            .unwrap_err();

        match err {
            SyncError::Transform { file, .. } => assert_eq!(file, "Assembly-CSharp.dll"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn transform_without_engine_support_is_rejected() {
        let d = dirs();
        write(&d.source, "Assembly-CSharp.dll", "internal");

        let options = SyncOptions::default().transform(["Assembly-CSharp.dll"]);
        let err = SyncEngine::new(&NullReporter)
            .sync(&d.source, &d.target, &options)
            .unwrap_err();
        assert!(matches!(err, SyncError::TransformUnavailable(name) if name == "Assembly-CSharp.dll"));
    }

    #[test]
    fn missing_destination_dir_is_io_error() {
        let d = dirs();
        write(&d.source, "A.dll", "a");

        let err = SyncEngine::new(&NullReporter)
            .sync(&d.source, &d.target.join("nope"), &SyncOptions::default())
            .unwrap_err();
        match err {
            SyncError::Io { path, .. } => assert!(path.ends_with("A.dll")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn rebuild_uses_allow_list() {
        let d = dirs();
        write(&d.target, "A.dll", "a");
        write(&d.target, "B.dll", "b");

        let allow: BTreeSet<String> = ["A.dll".to_string()].into();
        let manifest = rebuild_manifest(&d.target, &allow).unwrap();

        assert_eq!(manifest.len(), 1);
        assert_eq!(manifest.get("A.dll"), Some(&digest(b"a")));
        assert_eq!(
            Manifest::load(&d.target.join(MANIFEST_FILE_NAME)).unwrap(),
            manifest
        );
    }

    #[test]
    fn rebuild_refreshes_existing_entries() {
        let d = dirs();
        write(&d.source, "A.dll", "a");
        SyncEngine::new(&NullReporter)
            .sync(&d.source, &d.target, &SyncOptions::default())
            .unwrap();
        write(&d.target, "A.dll", "edited by hand");

        let manifest = rebuild_manifest(&d.target, &BTreeSet::new()).unwrap();
        assert_eq!(manifest.get("A.dll"), Some(&digest(b"edited by hand")));
    }

    #[test]
    fn rebuild_reports_missing_files() {
        let d = dirs();
        let allow: BTreeSet<String> = ["A.dll".to_string()].into();
        let err = rebuild_manifest(&d.target, &allow).unwrap_err();
        assert!(matches!(err, SyncError::FilesNotFound(names) if names == ["A.dll"]));
    }
}
