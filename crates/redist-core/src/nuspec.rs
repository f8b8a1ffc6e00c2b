//! Reading and bumping the version in a `.nuspec` package descriptor.
//!
//! Only the text of `<metadata><version>` is touched; every other byte of the
//! document (whitespace, comments, attribute order) is written back as read.

use redist_schema::persist::write_atomic;
use regex::Regex;
use std::fs;
use std::io;
use std::ops::Range;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use thiserror::Error;

static METADATA_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<metadata\b[^>]*>(.*?)</metadata>").expect("metadata pattern is valid")
});

static VERSION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<version\s*>([^<]*)</version\s*>").expect("version pattern is valid")
});

/// Errors raised while handling a `.nuspec` file.
#[derive(Error, Debug)]
pub enum NuspecError {
    /// The file could not be read or written.
    #[error("IO error on {}: {source}", path.display())]
    Io {
        /// Descriptor path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },

    /// No `.nuspec` in the given directory.
    #[error(".nuspec file cannot be found in redist folder: \"{}\"", .0.display())]
    NotFound(PathBuf),

    /// The document has no `<metadata><version>` element.
    #[error("Version element missing in nuspec {}", .0.display())]
    MissingVersion(PathBuf),
}

/// An editable `.nuspec` document.
#[derive(Debug, Clone)]
pub struct Nuspec {
    path: PathBuf,
    content: String,
}

impl Nuspec {
    /// Load the descriptor at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`NuspecError::Io`] if the file cannot be read.
    pub fn load(path: &Path) -> Result<Self, NuspecError> {
        let content = fs::read_to_string(path).map_err(|source| NuspecError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self {
            path: path.to_path_buf(),
            content,
        })
    }

    /// First `*.nuspec` in `dir`, by file name.
    ///
    /// # Errors
    ///
    /// Returns [`NuspecError::NotFound`] if there is none, or an I/O error if
    /// the directory cannot be listed.
    pub fn find_in(dir: &Path) -> Result<PathBuf, NuspecError> {
        let entries = fs::read_dir(dir).map_err(|source| NuspecError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

        let mut candidates: Vec<PathBuf> = entries
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| {
                path.is_file()
                    && path
                        .extension()
                        .is_some_and(|ext| ext.eq_ignore_ascii_case("nuspec"))
            })
            .collect();
        candidates.sort();

        candidates
            .into_iter()
            .next()
            .ok_or_else(|| NuspecError::NotFound(dir.to_path_buf()))
    }

    /// Path this document was loaded from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current package version, `None` if the element is missing or blank.
    pub fn version(&self) -> Option<&str> {
        let span = version_span(&self.content)?;
        let version = self.content[span].trim();
        (!version.is_empty()).then_some(version)
    }

    /// Replace the package version.
    ///
    /// # Errors
    ///
    /// Returns [`NuspecError::MissingVersion`] if the document has no
    /// `<metadata><version>` element.
    pub fn set_version(&mut self, version: &str) -> Result<(), NuspecError> {
        let span = version_span(&self.content)
            .ok_or_else(|| NuspecError::MissingVersion(self.path.clone()))?;
        self.content.replace_range(span, &escape_text(version));
        Ok(())
    }

    /// Write the document back to where it was loaded from.
    ///
    /// # Errors
    ///
    /// Returns [`NuspecError::Io`] if the write fails.
    pub fn save(&self) -> Result<(), NuspecError> {
        write_atomic(&self.path, self.content.as_bytes()).map_err(|source| NuspecError::Io {
            path: self.path.clone(),
            source,
        })
    }
}

/// Byte range of the version element's text within `content`.
fn version_span(content: &str) -> Option<Range<usize>> {
    let metadata = METADATA_RE.captures(content)?.get(1)?;
    let text = VERSION_RE.captures(metadata.as_str())?.get(1)?;
    Some(metadata.start() + text.start()..metadata.start() + text.end())
}

fn escape_text(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const NUSPEC: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<package xmlns="http://schemas.microsoft.com/packaging/2010/07/nuspec.xsd">
  <metadata>
    <id>Test.Unturned.Redist.Client</id>
    <version>3.25.6.1</version>
    <authors>Test</authors>
    <!-- dependencies carry version attributes, not elements -->
    <dependencies>
      <dependency id="Other" version="1.0.0" />
    </dependencies>
  </metadata>
  <files>
    <file src="*.dll" target="lib/netstandard2.1" />
  </files>
</package>
"#;

    fn write_nuspec(dir: &Path, content: &str) -> PathBuf {
        let path = dir.join("Test.Unturned.Redist.Client.nuspec");
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn reads_version() {
        let dir = tempdir().unwrap();
        let nuspec = Nuspec::load(&write_nuspec(dir.path(), NUSPEC)).unwrap();
        assert_eq!(nuspec.version(), Some("3.25.6.1"));
    }

    #[test]
    fn update_preserves_rest_of_document() {
        let dir = tempdir().unwrap();
        let path = write_nuspec(dir.path(), NUSPEC);

        let mut nuspec = Nuspec::load(&path).unwrap();
        nuspec.set_version("1.0.0-test").unwrap();
        nuspec.save().unwrap();

        let saved = fs::read_to_string(&path).unwrap();
        assert_eq!(saved, NUSPEC.replace("3.25.6.1", "1.0.0-test"));
        assert_eq!(Nuspec::load(&path).unwrap().version(), Some("1.0.0-test"));
    }

    #[test]
    fn missing_version_element() {
        let dir = tempdir().unwrap();
        let path = write_nuspec(
            dir.path(),
            "<package><metadata><id>x</id></metadata></package>",
        );

        let mut nuspec = Nuspec::load(&path).unwrap();
        assert_eq!(nuspec.version(), None);
        assert!(matches!(
            nuspec.set_version("1.0.0"),
            Err(NuspecError::MissingVersion(_))
        ));
    }

    #[test]
    fn version_outside_metadata_is_ignored() {
        let dir = tempdir().unwrap();
        let path = write_nuspec(
            dir.path(),
            "<package><files><version>9</version></files><metadata></metadata></package>",
        );
        assert_eq!(Nuspec::load(&path).unwrap().version(), None);
    }

    #[test]
    fn finds_first_nuspec() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("b.nuspec"), NUSPEC).unwrap();
        fs::write(dir.path().join("a.nuspec"), NUSPEC).unwrap();
        fs::write(dir.path().join("Test.dll"), "x").unwrap();

        assert_eq!(
            Nuspec::find_in(dir.path()).unwrap(),
            dir.path().join("a.nuspec")
        );
    }

    #[test]
    fn no_nuspec_is_not_found() {
        let dir = tempdir().unwrap();
        assert!(matches!(
            Nuspec::find_in(dir.path()),
            Err(NuspecError::NotFound(_))
        ));
    }
}
