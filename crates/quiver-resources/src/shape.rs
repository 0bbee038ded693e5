//! How a resource kind lays itself out on disk.
//!
//! Personas and commands are single markdown files and use the default
//! methods. Skills are directories and override them in [`crate::skill`].

use std::path::{Path, PathBuf};

use quiver_catalog::{Catalog, ResourceKind};
use walkdir::WalkDir;

use crate::error::ResourceError;
use crate::resource::{Resource, Scope};
use crate::skill::SkillShape;
use crate::store::ResourceStore;

/// Everything needed to write one template into a scope.
pub struct Materialize<'a> {
    pub catalog: &'a Catalog,
    pub kind: ResourceKind,
    pub name: &'a str,
    pub content: &'a str,
    pub target: &'a Path,
    /// Replace an existing install.
    pub force: bool,
}

pub trait ResourceShape: Send + Sync {
    /// Install location of `name` under a kind root.
    fn target_path(&self, kind_root: &Path, name: &str) -> PathBuf {
        kind_root.join(format!("{name}.md"))
    }

    /// Write the template to `ctx.target`.
    ///
    /// # Errors
    ///
    /// Returns an error if any write fails.
    fn materialize(&self, ctx: &Materialize<'_>) -> Result<(), ResourceError> {
        ResourceStore::write_atomic(ctx.target, ctx.content.as_bytes())?;
        Ok(())
    }

    /// Parse the installed copy at `path`, if it is readable.
    fn load_installed(
        &self,
        kind: ResourceKind,
        name: &str,
        path: &Path,
        scope: Scope,
    ) -> Option<Resource> {
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) => {
                tracing::warn!("cannot read {}: {e}", path.display());
                return None;
            }
        };
        match Resource::parse(kind, name, &content, path.to_path_buf(), scope) {
            Ok(r) => Some(r),
            Err(e) => {
                tracing::warn!("skipping {}: {e}", path.display());
                None
            }
        }
    }

    /// Enumerate every installed resource under `kind_root`.
    fn scan(&self, kind: ResourceKind, kind_root: &Path, scope: Scope) -> Vec<Resource> {
        if !kind_root.is_dir() {
            return Vec::new();
        }

        let mut resources = Vec::new();
        let walker = WalkDir::new(kind_root)
            .min_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| !e.file_name().to_string_lossy().starts_with('.'));

        for entry in walker {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    tracing::warn!("cannot walk {}: {e}", kind_root.display());
                    continue;
                }
            };
            let path = entry.path();
            if !entry.file_type().is_file() || path.extension().is_none_or(|ext| ext != "md") {
                continue;
            }
            let Some(name) = identity_from_path(kind_root, path) else {
                continue;
            };
            if let Some(resource) = self.load_installed(kind, &name, path, scope) {
                resources.push(resource);
            }
        }
        resources
    }
}

/// Single markdown file per resource.
pub struct FileShape;

impl ResourceShape for FileShape {}

/// The layout strategy for `kind`.
#[must_use]
pub fn shape_for(kind: ResourceKind) -> &'static dyn ResourceShape {
    if kind.is_directory() {
        &SkillShape
    } else {
        &FileShape
    }
}

/// `<root>/git/commit.md` → `git/commit`.
#[must_use]
pub fn identity_from_path(kind_root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(kind_root).ok()?.with_extension("");
    let parts: Vec<String> = rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    (!parts.is_empty()).then(|| parts.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(path: &Path, content: &str) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    #[test]
    fn identity_supports_namespaces() {
        let root = Path::new("/p/commands");
        assert_eq!(
            identity_from_path(root, Path::new("/p/commands/git/commit.md")).as_deref(),
            Some("git/commit")
        );
        assert_eq!(
            identity_from_path(root, Path::new("/p/commands/deploy.md")).as_deref(),
            Some("deploy")
        );
        assert_eq!(identity_from_path(root, Path::new("/elsewhere/x.md")), None);
    }

    #[test]
    fn file_scan_finds_nested_markdown() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("commands");
        write(&root.join("deploy.md"), "---\ndescription: Deploy\n---\nGo");
        write(&root.join("git/commit.md"), "---\ndescription: Commit\n---\nGo");
        write(&root.join("notes.txt"), "ignored");
        write(&root.join(".hidden/x.md"), "---\ndescription: h\n---\n");

        let found = FileShape.scan(ResourceKind::Command, &root, Scope::Project);
        let names: Vec<_> = found.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["deploy", "git/commit"]);
        assert_eq!(found[1].description, "Commit");
        assert_eq!(found[1].scope, Scope::Project);
    }

    #[test]
    fn file_scan_skips_malformed_headers() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("agents");
        write(&root.join("good.md"), "---\nname: good\ndescription: d\n---\n");
        write(&root.join("bad.md"), "---\nname: bad\n");

        let found = FileShape.scan(ResourceKind::Persona, &root, Scope::Global);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "good");
    }

    #[test]
    fn missing_root_scans_empty() {
        let found = FileShape.scan(
            ResourceKind::Persona,
            Path::new("/nonexistent/agents"),
            Scope::Project,
        );
        assert!(found.is_empty());
    }

    #[test]
    fn target_paths_per_shape() {
        let root = Path::new("/p/x");
        assert_eq!(
            shape_for(ResourceKind::Command).target_path(root, "git/commit"),
            PathBuf::from("/p/x/git/commit.md")
        );
        assert_eq!(
            shape_for(ResourceKind::Skill).target_path(root, "foo"),
            PathBuf::from("/p/x/foo")
        );
    }
}
