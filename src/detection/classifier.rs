//! Name and archive-content classification of candidate files.

use crate::core::config::ScanConfig;
use crate::core::error::{Error, Result};
use crate::core::types::FileRecord;
use crate::detection::signature::SignatureTable;
use crate::scanner::archive::ArchiveScanner;
use crate::utils::hash::HashCalculator;
use chrono::Utc;
use rand::Rng;
use std::path::Path;
use std::sync::Arc;

/// Decides whether a candidate file is a known threat.
pub struct Classifier {
    config: Arc<ScanConfig>,
    signatures: Arc<SignatureTable>,
    archives: ArchiveScanner,
}

impl Classifier {
    pub fn new(config: Arc<ScanConfig>, signatures: Arc<SignatureTable>) -> Self {
        let archives = ArchiveScanner::new().with_max_manifest_size(config.max_manifest_bytes);
        Self {
            config,
            signatures,
            archives,
        }
    }

    pub fn signatures(&self) -> &SignatureTable {
        &self.signatures
    }

    /// Classify by file name alone.
    ///
    /// Names without a monitored extension are never threats.
    pub fn classify(&self, _path: &Path, name: &str) -> (bool, Option<String>) {
        let lower = name.to_lowercase();
        let Some((stem, ext)) = lower.rsplit_once('.') else {
            return (false, None);
        };
        if !self.config.is_monitored_extension(ext) {
            return (false, None);
        }

        match self.signatures.match_name(stem) {
            Some(sig) => (true, Some(sig.display_name.clone())),
            None => (false, None),
        }
    }

    /// Whether the content scan applies to this path.
    pub fn is_content_scannable(&self, path: &Path) -> bool {
        self.config.scan_archives
            && path
                .extension()
                .is_some_and(|ext| self.config.is_archive_extension(&ext.to_string_lossy()))
    }

    /// Look inside an archive for a signature key.
    ///
    /// The manifest is searched first, then entry names. An unreadable
    /// archive is reported as no match.
    pub fn content_match(&self, path: &Path) -> Option<String> {
        let contents = match self.archives.read_contents(path) {
            Ok(contents) => contents,
            Err(e) => {
                log::debug!("Content scan skipped for {:?}: {}", path, e);
                return None;
            }
        };

        if let Some(sig) = contents
            .manifest
            .as_deref()
            .and_then(|manifest| self.signatures.find_in(manifest))
        {
            return Some(sig.display_name.clone());
        }

        contents
            .entry_names
            .iter()
            .find_map(|entry| self.signatures.find_in(entry))
            .map(|sig| sig.display_name.clone())
    }

    /// Build the record for one candidate file.
    ///
    /// Fails only when the file cannot be stat'ed; the caller treats that
    /// as a skip. `is_running` is left false for the correlator to fill in.
    pub fn inspect(&self, path: &Path) -> Result<FileRecord> {
        let metadata = std::fs::metadata(path).map_err(|e| Error::file_read(path, e))?;
        if !metadata.is_file() {
            return Err(Error::scan_error(path, "not a regular file"));
        }

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| Error::scan_error(path, "path has no file name"))?;

        let (mut is_threat, mut threat_name) = self.classify(path, &name);
        if !is_threat && self.is_content_scannable(path) {
            threat_name = self.content_match(path);
            is_threat = threat_name.is_some();
        }

        let threat_level = if is_threat {
            rand::thread_rng().gen_range(2..=3)
        } else {
            0
        };

        Ok(FileRecord {
            id: HashCalculator::path_id(path),
            path: path.to_path_buf(),
            name,
            size_bytes: metadata.len(),
            content_hash_prefix: HashCalculator::fingerprint(path, self.config.hash_prefix_bytes),
            is_threat,
            threat_level,
            threat_name,
            scanned_at: Utc::now(),
            is_running: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::HASH_UNAVAILABLE;
    use crate::scanner::archive::tests::build_zip;
    use crate::scanner::archive::MANIFEST_ENTRY;

    fn classifier() -> Classifier {
        Classifier::new(
            Arc::new(ScanConfig::default()),
            Arc::new(SignatureTable::builtin()),
        )
    }

    #[test]
    fn test_classify_versioned_names() {
        let c = classifier();
        let p = Path::new("x");
        assert_eq!(
            c.classify(p, "LiquidBounce-1.8.9.jar"),
            (true, Some("LiquidBounce".to_string()))
        );
        assert_eq!(
            c.classify(p, "wurst_7.35.exe"),
            (true, Some("Wurst".to_string()))
        );
        assert_eq!(c.classify(p, "meteor.jar"), (true, Some("Meteor Client".to_string())));
    }

    #[test]
    fn test_classify_clean_and_unmonitored() {
        let c = classifier();
        let p = Path::new("x");
        assert_eq!(c.classify(p, "notepad.exe"), (false, None));
        assert_eq!(c.classify(p, "liquidbounce.txt"), (false, None));
        assert_eq!(c.classify(p, "liquidbounce"), (false, None));
    }

    #[test]
    fn test_content_fallback_via_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let jar = dir.path().join("tool.jar");
        std::fs::write(
            &jar,
            build_zip(&[(MANIFEST_ENTRY, b"Main-Class: net.sigma.Loader\n")]),
        )
        .unwrap();

        let record = classifier().inspect(&jar).unwrap();
        assert!(record.is_threat);
        assert_eq!(record.threat_name.as_deref(), Some("Sigma"));
        assert!((2..=3).contains(&record.threat_level));
        assert_eq!(record.name, "tool.jar");
    }

    #[test]
    fn test_content_fallback_via_entry_names() {
        let dir = tempfile::tempdir().unwrap();
        let jar = dir.path().join("tool.jar");
        std::fs::write(
            &jar,
            build_zip(&[
                (MANIFEST_ENTRY, b"Main-Class: org.example.App\n"),
                ("assets/vape/icon.png", b"png"),
            ]),
        )
        .unwrap();

        assert_eq!(classifier().content_match(&jar).as_deref(), Some("Vape"));
    }

    #[test]
    fn test_corrupt_archive_is_clean() {
        let dir = tempfile::tempdir().unwrap();
        let jar = dir.path().join("tool.jar");
        std::fs::write(&jar, b"not a zip").unwrap();

        let record = classifier().inspect(&jar).unwrap();
        assert!(!record.is_threat);
        assert_eq!(record.threat_level, 0);
        assert_ne!(record.content_hash_prefix, HASH_UNAVAILABLE);
    }

    #[test]
    fn test_content_scan_disabled() {
        let dir = tempfile::tempdir().unwrap();
        let jar = dir.path().join("tool.jar");
        std::fs::write(&jar, build_zip(&[(MANIFEST_ENTRY, b"sigma")])).unwrap();

        let config = ScanConfig {
            scan_archives: false,
            ..ScanConfig::default()
        };
        let c = Classifier::new(Arc::new(config), Arc::new(SignatureTable::builtin()));
        assert!(!c.inspect(&jar).unwrap().is_threat);
    }

    #[test]
    fn test_inspect_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = classifier().inspect(&dir.path().join("gone.jar")).unwrap_err();
        assert!(err.is_recoverable());
    }
}
