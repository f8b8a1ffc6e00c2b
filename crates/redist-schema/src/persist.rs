//! Atomic file replacement shared by the manifest and state stores.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

/// Replace `path` with `contents` so readers never observe a partial file.
///
/// The data is written to a temporary file in the same directory and then
/// renamed over the target. An existing target keeps its permissions.
///
/// # Errors
///
/// Returns an I/O error if the temporary file cannot be created, written or
/// persisted.
pub fn write_atomic(path: &Path, contents: &[u8]) -> io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(contents)?;
    tmp.flush()?;
    match fs::metadata(path) {
        Ok(existing) => tmp.as_file().set_permissions(existing.permissions())?,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(e),
    }
    tmp.persist(path).map_err(|e| e.error)?;

    Ok(())
}
