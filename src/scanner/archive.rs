//! Zip container inspection for the content-scan fallback.

use crate::core::error::{Error, Result};
use std::fs::File;
use std::io::{Read, Seek};
use std::path::{Path, PathBuf};
use zip::ZipArchive;

/// Entry holding the primary manifest of a Java archive.
pub const MANIFEST_ENTRY: &str = "META-INF/MANIFEST.MF";

/// Maximum manifest size read from an archive (1 MB default).
const MAX_MANIFEST_SIZE: u64 = 1024 * 1024;

/// Maximum number of entry names listed from a single archive.
const MAX_ARCHIVE_FILES: usize = 100_000;

/// What the archive exposes to the content scan.
#[derive(Debug, Clone, Default)]
pub struct ArchiveContents {
    /// Lowercased manifest text, if the archive has one
    pub manifest: Option<String>,
    /// Lowercased entry names
    pub entry_names: Vec<String>,
}

/// Reader for zip-based containers (`.jar`, `.zip`).
pub struct ArchiveScanner {
    max_manifest_size: u64,
    max_files: usize,
}

impl Default for ArchiveScanner {
    fn default() -> Self {
        Self::new()
    }
}

impl ArchiveScanner {
    /// Create a new archive scanner with default settings.
    pub fn new() -> Self {
        Self {
            max_manifest_size: MAX_MANIFEST_SIZE,
            max_files: MAX_ARCHIVE_FILES,
        }
    }

    /// Set the largest manifest that will be read.
    pub fn with_max_manifest_size(mut self, size: u64) -> Self {
        self.max_manifest_size = size;
        self
    }

    /// Read the manifest (lowercased) and entry names (lowercased) of an archive.
    pub fn read_contents(&self, path: &Path) -> Result<ArchiveContents> {
        let mut archive = open_archive(path)?;
        self.read_contents_from(&mut archive, path)
    }

    fn read_contents_from<R: Read + Seek>(
        &self,
        archive: &mut ZipArchive<R>,
        source_path: &Path,
    ) -> Result<ArchiveContents> {
        let manifest = match archive.by_name(MANIFEST_ENTRY) {
            Ok(entry) => {
                let mut raw = Vec::new();
                entry
                    .take(self.max_manifest_size)
                    .read_to_end(&mut raw)
                    .map_err(|e| archive_error(source_path, e))?;
                Some(String::from_utf8_lossy(&raw).to_lowercase())
            }
            Err(zip::result::ZipError::FileNotFound) => None,
            Err(e) => return Err(archive_error(source_path, e)),
        };

        let entry_names = archive
            .file_names()
            .take(self.max_files)
            .map(|name| name.to_lowercase())
            .collect();

        Ok(ArchiveContents {
            manifest,
            entry_names,
        })
    }
}

fn open_archive(path: &Path) -> Result<ZipArchive<File>> {
    let file = File::open(path).map_err(|e| Error::file_read(path, e))?;
    ZipArchive::new(file).map_err(|e| archive_error(path, e))
}

fn archive_error(
    path: &Path,
    source: impl std::error::Error + Send + Sync + 'static,
) -> Error {
    Error::ArchiveError {
        path: PathBuf::from(path),
        source: Box::new(source),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::io::{Cursor, Write};

    /// Build an in-memory zip from `(name, contents)` pairs.
    pub(crate) fn build_zip(entries: &[(&str, &[u8])]) -> Vec<u8> {
        let mut buffer = Cursor::new(Vec::new());
        {
            let mut zip = zip::ZipWriter::new(&mut buffer);
            let options = zip::write::FileOptions::default()
                .compression_method(zip::CompressionMethod::Stored);

            for (name, contents) in entries {
                zip.start_file(*name, options).unwrap();
                zip.write_all(contents).unwrap();
            }

            zip.finish().unwrap();
        }
        buffer.into_inner()
    }

    #[test]
    fn test_read_contents_with_manifest() {
        let zip_data = build_zip(&[
            (MANIFEST_ENTRY, b"Manifest-Version: 1.0\nMain-Class: Net.Sigma.Main\n"),
            ("Net/Sigma/Main.class", b"\xca\xfe"),
        ]);
        let temp_dir = tempfile::tempdir().unwrap();
        let jar = temp_dir.path().join("tool.jar");
        std::fs::write(&jar, &zip_data).unwrap();

        let contents = ArchiveScanner::new().read_contents(&jar).unwrap();
        let manifest = contents.manifest.unwrap();
        assert!(manifest.contains("net.sigma.main"));
        assert!(contents
            .entry_names
            .contains(&"net/sigma/main.class".to_string()));
    }

    #[test]
    fn test_read_contents_without_manifest() {
        let zip_data = build_zip(&[("readme.md", b"hi")]);
        let temp_dir = tempfile::tempdir().unwrap();
        let jar = temp_dir.path().join("plain.jar");
        std::fs::write(&jar, &zip_data).unwrap();

        let contents = ArchiveScanner::new().read_contents(&jar).unwrap();
        assert!(contents.manifest.is_none());
        assert_eq!(contents.entry_names, vec!["readme.md".to_string()]);
    }

    #[test]
    fn test_manifest_size_bound() {
        let zip_data = build_zip(&[(MANIFEST_ENTRY, b"0123456789sigma")]);
        let temp_dir = tempfile::tempdir().unwrap();
        let jar = temp_dir.path().join("big.jar");
        std::fs::write(&jar, &zip_data).unwrap();

        let contents = ArchiveScanner::new()
            .with_max_manifest_size(10)
            .read_contents(&jar)
            .unwrap();
        assert_eq!(contents.manifest.as_deref(), Some("0123456789"));
    }

    #[test]
    fn test_corrupt_archive_is_error() {
        let temp_dir = tempfile::tempdir().unwrap();
        let jar = temp_dir.path().join("broken.jar");
        std::fs::write(&jar, b"definitely not a zip").unwrap();

        let err = ArchiveScanner::new().read_contents(&jar).unwrap_err();
        assert!(matches!(err, Error::ArchiveError { .. }));
        assert!(err.is_recoverable());
    }
}
