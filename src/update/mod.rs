//! Self-update interface.
//!
//! The scan engine never calls into this module. Front ends implement
//! [`Updater`] over whatever transport they have and use the helpers here to
//! interpret a release feed and check downloaded artifacts.

use crate::core::error::{Error, Result};
use crate::utils::hash::HashCalculator;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::path::{Path, PathBuf};

/// Result of comparing the running version with the latest release.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateInfo {
    pub available: bool,
    pub version: Option<String>,
    pub download_url: Option<String>,
    pub changelog: Option<String>,
}

/// One downloadable file attached to a release.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseAsset {
    pub name: String,
    pub browser_download_url: String,
}

/// Latest-release document as published by the release feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Release {
    pub tag_name: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub assets: Vec<ReleaseAsset>,
}

impl Release {
    /// Parse a release document.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| Error::UpdateFailed(format!("Invalid release document: {}", e)))
    }

    /// Release version without a leading `v`.
    pub fn version(&self) -> &str {
        strip_v(&self.tag_name)
    }

    /// Compare this release against `current_version`.
    pub fn update_info(&self, current_version: &str) -> Result<UpdateInfo> {
        if compare_versions(self.version(), current_version)? != Ordering::Greater {
            return Ok(UpdateInfo::default());
        }

        Ok(UpdateInfo {
            available: true,
            version: Some(self.version().to_string()),
            download_url: select_asset(&self.assets).map(|a| a.browser_download_url.clone()),
            changelog: Some(
                self.body
                    .clone()
                    .unwrap_or_else(|| "No changelog available".to_string()),
            ),
        })
    }
}

/// Operations a self-updater provides.
#[async_trait]
pub trait Updater: Send + Sync {
    /// Query the release feed.
    async fn check_for_update(&self, current_version: &str) -> Result<UpdateInfo>;

    /// Download `url`, reporting percent complete, and return the local file.
    async fn download(
        &self,
        url: &str,
        on_progress: Box<dyn Fn(f64) + Send + Sync>,
    ) -> Result<PathBuf>;

    /// Check a downloaded artifact before installing it.
    async fn verify(&self, path: &Path) -> Result<bool>;

    /// Replace the running binary. Returns false if the artifact is unsupported.
    async fn install(&self, path: &Path) -> Result<bool>;
}

fn strip_v(version: &str) -> &str {
    let version = version.trim();
    version
        .strip_prefix('v')
        .or_else(|| version.strip_prefix('V'))
        .unwrap_or(version)
}

fn parse_version(version: &str) -> Result<Vec<u64>> {
    strip_v(version)
        .split('.')
        .map(|part| {
            part.parse::<u64>()
                .map_err(|_| Error::InvalidVersion(version.to_string()))
        })
        .collect()
}

/// Compare dotted numeric versions, padding the shorter one with zeros.
pub fn compare_versions(a: &str, b: &str) -> Result<Ordering> {
    let mut left = parse_version(a)?;
    let mut right = parse_version(b)?;
    let len = left.len().max(right.len());
    left.resize(len, 0);
    right.resize(len, 0);
    Ok(left.cmp(&right))
}

#[cfg(windows)]
const PREFERRED_SUFFIXES: &[&str] = &[".exe"];
#[cfg(target_os = "macos")]
const PREFERRED_SUFFIXES: &[&str] = &[".dmg", ".app.zip"];
#[cfg(not(any(windows, target_os = "macos")))]
const PREFERRED_SUFFIXES: &[&str] = &[".AppImage", ".tar.gz"];

/// Asset for the current platform, else the first asset.
pub fn select_asset(assets: &[ReleaseAsset]) -> Option<&ReleaseAsset> {
    assets
        .iter()
        .find(|a| PREFERRED_SUFFIXES.iter().any(|s| a.name.ends_with(s)))
        .or_else(|| assets.first())
}

/// A download is usable if it is a non-empty file matching `expected_sha256`.
pub fn verify_download(path: &Path, expected_sha256: Option<&str>) -> Result<bool> {
    match std::fs::metadata(path) {
        Ok(meta) if meta.is_file() && meta.len() > 0 => {}
        Ok(_) => return Ok(false),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(false),
        Err(e) => return Err(Error::file_read(path, e)),
    }

    match expected_sha256 {
        Some(expected) => HashCalculator::verify_sha256(path, expected),
        None => Ok(true),
    }
}

/// Remove leftover files from an update staging directory.
pub fn cleanup_update_dir(dir: &Path) -> Result<usize> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
        Err(e) => {
            return Err(Error::DirectoryAccess {
                path: dir.to_path_buf(),
                source: e,
            })
        }
    };

    let mut removed = 0;
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_file() {
            match std::fs::remove_file(&path) {
                Ok(()) => removed += 1,
                Err(e) => log::warn!("Failed to remove stale update {:?}: {}", path, e),
            }
        }
    }
    Ok(removed)
}
