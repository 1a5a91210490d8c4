//! Scan roots for the quick and full modes.

use crate::core::types::ScanTarget;
use std::path::PathBuf;

/// Every mounted volume root.
pub fn full_scan_targets() -> Vec<ScanTarget> {
    #[cfg(windows)]
    let roots: Vec<PathBuf> = (b'A'..=b'Z')
        .map(|letter| PathBuf::from(format!("{}:\\", letter as char)))
        .filter(|p| p.exists())
        .collect();

    #[cfg(target_os = "macos")]
    let roots: Vec<PathBuf> = ["/", "/Users", "/Applications"]
        .iter()
        .map(PathBuf::from)
        .collect();

    #[cfg(not(any(windows, target_os = "macos")))]
    let roots: Vec<PathBuf> = vec![PathBuf::from("/")];

    let mut roots = roots;
    dedup_existing(&mut roots);

    roots.into_iter().map(ScanTarget::new).collect()
}

/// Per-user folders where downloaded clients usually end up.
pub fn quick_scan_targets() -> Vec<ScanTarget> {
    let mut roots: Vec<PathBuf> = [
        dirs::download_dir(),
        dirs::desktop_dir(),
        dirs::document_dir(),
        dirs::data_dir().map(|d| d.join(".minecraft")),
        dirs::home_dir().map(|d| d.join(".minecraft")),
        dirs::data_dir(),
        dirs::data_local_dir(),
    ]
    .into_iter()
    .flatten()
    .collect();

    #[cfg(windows)]
    if let Ok(temp) = std::env::var("TEMP") {
        roots.push(PathBuf::from(temp));
    }

    dedup_existing(&mut roots);
    roots.into_iter().map(ScanTarget::new).collect()
}

/// Drop missing paths, repeats and roots nested inside another root,
/// keeping first-seen order.
///
/// A nested root would be walked twice and count its files twice.
fn dedup_existing(roots: &mut Vec<PathBuf>) {
    let mut seen = Vec::new();
    roots.retain(|p| {
        if !p.exists() || seen.contains(p) {
            return false;
        }
        seen.push(p.clone());
        true
    });

    let kept = roots.clone();
    roots.retain(|p| !kept.iter().any(|q| q != p && p.starts_with(q)));
}
