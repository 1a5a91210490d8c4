//! File operations used by remediation.
//!
//! Provides:
//! - Deletion with distinguishable failure kinds
//! - Moving files across filesystems
//! - Collision-free quarantine names

use std::fs;
use std::path::{Path, PathBuf};

use crate::core::error::{Error, Result};

/// Suffix appended to every quarantined file.
pub const QUARANTINE_SUFFIX: &str = ".quarantine";

/// Delete a regular file.
///
/// A missing file is an error here; callers decide whether that matters.
pub fn delete_file(path: &Path) -> Result<()> {
    fs::remove_file(path).map_err(|e| {
        Error::from_io(path, e, |path, source| Error::FileDelete { path, source })
    })
}

/// Move a file, falling back to copy-then-delete across filesystems.
///
/// On success the source no longer exists.
pub fn safe_move(source: &Path, dest: &Path) -> Result<()> {
    fs::symlink_metadata(source)
        .map_err(|e| Error::from_io(source, e, |path, source| Error::FileRead { path, source }))?;

    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent).map_err(|e| Error::DirectoryAccess {
            path: parent.to_path_buf(),
            source: e,
        })?;
    }

    // Fast path for same filesystem
    match fs::rename(source, dest) {
        Ok(()) => return Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(Error::from_io(source, e, |path, source| Error::FileWrite {
                path,
                source,
            }));
        }
        Err(e) => log::debug!("Rename of {:?} failed ({}), copying instead", source, e),
    }

    fs::copy(source, dest).map_err(|e| Error::file_write(dest, e))?;

    // Verify copy
    let source_size = fs::metadata(source)
        .map_err(|e| Error::file_read(source, e))?
        .len();
    let dest_size = fs::metadata(dest)
        .map_err(|e| Error::file_read(dest, e))?
        .len();

    if source_size != dest_size {
        let _ = fs::remove_file(dest);
        return Err(Error::Internal("File copy verification failed".to_string()));
    }

    if let Err(e) = fs::remove_file(source) {
        // Leave exactly one copy behind.
        let _ = fs::remove_file(dest);
        return Err(Error::from_io(source, e, |path, source| Error::FileDelete {
            path,
            source,
        }));
    }

    Ok(())
}

/// Destination for `source` inside `dir`: `{timestamp}_{name}.quarantine`.
///
/// A numeric tag is added if that name is already taken.
pub fn quarantine_destination(dir: &Path, source: &Path, timestamp: i64) -> Result<PathBuf> {
    let name = source
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| Error::QuarantineFailed {
            path: source.to_path_buf(),
            source: "path has no file name".into(),
        })?;

    let mut dest = dir.join(format!("{}_{}{}", timestamp, name, QUARANTINE_SUFFIX));
    let mut tag = 1u32;
    while dest.exists() {
        dest = dir.join(format!("{}_{}_{}{}", timestamp, name, tag, QUARANTINE_SUFFIX));
        tag += 1;
    }
    Ok(dest)
}
