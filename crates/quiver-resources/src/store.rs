//! Filesystem operations on installed resource copies.

use std::io::Write;
use std::path::{Path, PathBuf};

use quiver_catalog::ResourceKind;

/// Locates scope roots and performs the writes and deletes for installs.
#[derive(Debug, Clone)]
pub struct ResourceStore {
    project_root: PathBuf,
    global_root: PathBuf,
}

impl ResourceStore {
    #[must_use]
    pub fn new(project_root: impl Into<PathBuf>, global_root: impl Into<PathBuf>) -> Self {
        Self {
            project_root: project_root.into(),
            global_root: global_root.into(),
        }
    }

    #[must_use]
    pub fn scope_root(&self, global: bool) -> &Path {
        if global {
            &self.global_root
        } else {
            &self.project_root
        }
    }

    /// `<scope root>/<install dir>` for `kind`.
    #[must_use]
    pub fn kind_root(&self, kind: ResourceKind, global: bool) -> PathBuf {
        self.scope_root(global).join(kind.install_dir())
    }

    #[must_use]
    pub fn exists(path: &Path) -> bool {
        path.symlink_metadata().is_ok()
    }

    /// Write `bytes` to `path` through a sibling temp file and a rename, so an
    /// interrupted write never leaves a partial file behind.
    ///
    /// # Errors
    ///
    /// Returns an IO error if the parent cannot be created or the write fails.
    pub fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
        let parent = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        std::fs::create_dir_all(parent)?;

        let mut tmp = tempfile::Builder::new()
            .prefix(".quiver-")
            .suffix(".tmp")
            .tempfile_in(parent)?;
        tmp.write_all(bytes)?;
        tmp.as_file().sync_all()?;
        tmp.persist(path).map_err(|e| e.error)?;
        Ok(())
    }

    /// Delete a file or a whole directory tree.
    ///
    /// # Errors
    ///
    /// Returns an IO error if deletion fails.
    pub fn delete(path: &Path) -> std::io::Result<()> {
        let meta = path.symlink_metadata()?;
        if meta.is_dir() {
            std::fs::remove_dir_all(path)
        } else {
            std::fs::remove_file(path)
        }
    }

    /// Remove now-empty directories from `path`'s parent up to (not including)
    /// `stop_at`. Best-effort: errors end the walk silently.
    pub fn prune_empty_parents(path: &Path, stop_at: &Path) {
        let mut current = path.parent();
        while let Some(dir) = current {
            if dir == stop_at || !dir.starts_with(stop_at) {
                break;
            }
            let is_empty = std::fs::read_dir(dir).is_ok_and(|mut it| it.next().is_none());
            if !is_empty || std::fs::remove_dir(dir).is_err() {
                break;
            }
            tracing::debug!("pruned empty directory {}", dir.display());
            current = dir.parent();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_roots_per_scope() {
        let store = ResourceStore::new("/proj/.claude", "/home/u/.claude");
        assert_eq!(
            store.kind_root(ResourceKind::Persona, false),
            PathBuf::from("/proj/.claude/agents")
        );
        assert_eq!(
            store.kind_root(ResourceKind::Skill, true),
            PathBuf::from("/home/u/.claude/skills")
        );
    }

    #[test]
    fn write_atomic_creates_parents_and_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a/b/c.md");
        ResourceStore::write_atomic(&path, b"one").unwrap();
        ResourceStore::write_atomic(&path, b"two").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "two");

        let leftovers: Vec<_> = std::fs::read_dir(dir.path().join("a/b"))
            .unwrap()
            .flatten()
            .filter(|e| e.file_name().to_string_lossy().starts_with(".quiver-"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn delete_file_and_dir() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("f.md");
        std::fs::write(&file, "x").unwrap();
        let sub = dir.path().join("skill/scripts");
        std::fs::create_dir_all(&sub).unwrap();
        std::fs::write(sub.join("run.sh"), "x").unwrap();

        ResourceStore::delete(&file).unwrap();
        ResourceStore::delete(&dir.path().join("skill")).unwrap();
        assert!(!ResourceStore::exists(&file));
        assert!(!ResourceStore::exists(&dir.path().join("skill")));
    }

    #[test]
    fn prune_stops_at_root_and_non_empty_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("commands");
        let nested = root.join("git/sub");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(root.join("keep.md"), "x").unwrap();

        ResourceStore::prune_empty_parents(&nested.join("commit.md"), &root);
        assert!(!root.join("git").exists());
        assert!(root.exists());
    }

    #[test]
    fn prune_ignores_paths_outside_root() {
        let dir = tempfile::tempdir().unwrap();
        let outside = dir.path().join("elsewhere");
        std::fs::create_dir_all(&outside).unwrap();
        ResourceStore::prune_empty_parents(&outside.join("x.md"), &dir.path().join("commands"));
        assert!(outside.exists());
    }
}
