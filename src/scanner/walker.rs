//! Depth-first traversal of scan roots.

use crate::core::config::ScanConfig;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// Yields candidate files below a root, pruning excluded directories.
#[derive(Debug, Clone)]
pub struct DirectoryWalker {
    monitored_extensions: Vec<String>,
    prefix_markers: Vec<PathBuf>,
    name_markers: Vec<String>,
    follow_symlinks: bool,
}

impl DirectoryWalker {
    pub fn new(config: &ScanConfig) -> Self {
        let (prefix_markers, name_markers): (Vec<_>, Vec<_>) = config
            .skip_markers
            .iter()
            .partition(|marker| Path::new(marker.as_str()).is_absolute());

        Self {
            monitored_extensions: config
                .monitored_extensions
                .iter()
                .map(|e| e.to_lowercase())
                .collect(),
            prefix_markers: prefix_markers.into_iter().map(PathBuf::from).collect(),
            name_markers: name_markers.into_iter().cloned().collect(),
            follow_symlinks: config.follow_symlinks,
        }
    }

    /// Lazily walk `root`. Each call starts a fresh traversal.
    ///
    /// Unreadable directories are dropped along with their subtree; the
    /// iterator itself never yields an error.
    pub fn walk<'a>(&'a self, root: &Path) -> impl Iterator<Item = PathBuf> + 'a {
        WalkDir::new(root)
            .follow_links(self.follow_symlinks)
            .into_iter()
            .filter_entry(move |entry| !self.is_excluded(entry))
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    log::trace!("Skipping unreadable entry: {}", e);
                    None
                }
            })
            .filter(|entry| entry.file_type().is_file())
            .filter(move |entry| self.is_candidate(entry.path()))
            .map(DirEntry::into_path)
    }

    /// Directory pruning check. The root itself is never pruned.
    fn is_excluded(&self, entry: &DirEntry) -> bool {
        if entry.depth() == 0 || !entry.file_type().is_dir() {
            return false;
        }
        let path = entry.path();
        if self.prefix_markers.iter().any(|marker| path.starts_with(marker)) {
            return true;
        }
        let path = path.to_string_lossy();
        self.name_markers
            .iter()
            .any(|marker| path.contains(marker.as_str()))
    }

    /// Whether the file name ends in a monitored extension.
    pub fn is_candidate(&self, path: &Path) -> bool {
        path.extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
            .is_some_and(|ext| self.monitored_extensions.contains(&ext))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use std::fs;

    fn names(paths: impl Iterator<Item = PathBuf>) -> BTreeSet<String> {
        paths
            .filter_map(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
            .collect()
    }

    #[test]
    fn test_walk_yields_only_monitored() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.jar"), "x").unwrap();
        fs::write(dir.path().join("b.EXE"), "x").unwrap();
        fs::write(dir.path().join("readme.txt"), "x").unwrap();
        fs::create_dir(dir.path().join("mods")).unwrap();
        fs::write(dir.path().join("mods").join("c.jar"), "x").unwrap();

        let walker = DirectoryWalker::new(&ScanConfig::default());
        let found = names(walker.walk(dir.path()));
        assert_eq!(
            found,
            ["a.jar", "b.EXE", "c.jar"].iter().map(|s| s.to_string()).collect()
        );
    }

    #[test]
    fn test_skip_markers_prune_subtree() {
        let dir = tempfile::tempdir().unwrap();
        let hidden = dir.path().join("node_modules").join("deep");
        fs::create_dir_all(&hidden).unwrap();
        fs::write(hidden.join("x.jar"), "x").unwrap();
        fs::write(dir.path().join("y.jar"), "x").unwrap();

        let walker = DirectoryWalker::new(&ScanConfig::default());
        let found = names(walker.walk(dir.path()));
        assert!(found.contains("y.jar"));
        assert!(!found.contains("x.jar"));
    }

    #[test]
    fn test_root_never_pruned() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("node_modules");
        fs::create_dir(&root).unwrap();
        fs::write(root.join("z.jar"), "x").unwrap();

        let walker = DirectoryWalker::new(&ScanConfig::default());
        assert_eq!(walker.walk(&root).count(), 1);
    }

    #[test]
    fn test_missing_root_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let walker = DirectoryWalker::new(&ScanConfig::default());
        assert_eq!(walker.walk(&dir.path().join("absent")).count(), 0);
    }

    #[test]
    fn test_system_markers_match_whole_components() {
        let dir = tempfile::tempdir().unwrap();
        for sub in ["devtools", "runelite", "system-mods", "plain"] {
            let folder = dir.path().join(sub);
            fs::create_dir(&folder).unwrap();
            fs::write(folder.join("vape.jar"), "x").unwrap();
        }

        let walker = DirectoryWalker::new(&ScanConfig::default());
        assert_eq!(walker.walk(dir.path()).count(), 4);
    }

    #[test]
    fn test_absolute_marker_prunes_prefix_only() {
        let dir = tempfile::tempdir().unwrap();
        for sub in ["cache", "cache2"] {
            let folder = dir.path().join(sub);
            fs::create_dir(&folder).unwrap();
            fs::write(folder.join(format!("{}.jar", sub)), "x").unwrap();
        }

        let config = ScanConfig {
            skip_markers: vec![dir.path().join("cache").to_string_lossy().into_owned()],
            ..ScanConfig::default()
        };
        let found = names(DirectoryWalker::new(&config).walk(dir.path()));
        assert_eq!(found, ["cache2.jar".to_string()].into_iter().collect());
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_directory_is_skipped() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let locked = dir.path().join("locked");
        let open = dir.path().join("open");
        fs::create_dir(&locked).unwrap();
        fs::create_dir(&open).unwrap();
        fs::write(locked.join("hidden.jar"), "x").unwrap();
        fs::write(open.join("a.jar"), "x").unwrap();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

        // Root ignores directory permissions.
        if fs::read_dir(&locked).is_ok() {
            fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
            return;
        }

        let walker = DirectoryWalker::new(&ScanConfig::default());
        let found = names(walker.walk(dir.path()));
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

        assert_eq!(found, ["a.jar".to_string()].into_iter().collect());
    }
}
