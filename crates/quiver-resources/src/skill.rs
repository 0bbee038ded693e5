//! Directory-shaped resources: `<name>/SKILL.md` plus auxiliary files.

use std::path::{Path, PathBuf};

use quiver_catalog::{ResourceKind, SKILL_MANIFEST_FILE};
use walkdir::WalkDir;

use crate::error::ResourceError;
use crate::resource::{Resource, ResourceDetails, Scope};
use crate::shape::{Materialize, ResourceShape};
use crate::store::ResourceStore;

pub struct SkillShape;

impl ResourceShape for SkillShape {
    fn target_path(&self, kind_root: &Path, name: &str) -> PathBuf {
        kind_root.join(name)
    }

    /// Stage the manifest and every catalog file for the skill in a sibling
    /// temp directory, then swap it into place.
    fn materialize(&self, ctx: &Materialize<'_>) -> Result<(), ResourceError> {
        let parent = ctx
            .target
            .parent()
            .ok_or_else(|| ResourceError::InvalidTemplate {
                name: ctx.name.to_owned(),
                reason: format!("no parent directory for {}", ctx.target.display()),
            })?;
        std::fs::create_dir_all(parent)?;

        let staging = tempfile::Builder::new()
            .prefix(".quiver-")
            .tempdir_in(parent)?;
        std::fs::write(staging.path().join(SKILL_MANIFEST_FILE), ctx.content)?;

        for rel in ctx.catalog.list_auxiliary_files(ctx.kind, ctx.name) {
            let bytes = ctx.catalog.load_auxiliary_file(ctx.kind, ctx.name, &rel)?;
            let dest = staging.path().join(&rel);
            if let Some(dir) = dest.parent() {
                std::fs::create_dir_all(dir)?;
            }
            std::fs::write(&dest, bytes)?;
        }

        if ctx.force && ResourceStore::exists(ctx.target) {
            ResourceStore::delete(ctx.target)?;
        }
        // The staging guard's cleanup on drop is a no-op once renamed.
        std::fs::rename(staging.path(), ctx.target)?;
        Ok(())
    }

    fn load_installed(
        &self,
        kind: ResourceKind,
        name: &str,
        path: &Path,
        scope: Scope,
    ) -> Option<Resource> {
        load_skill_dir(kind, name, path, scope)
    }

    /// Every direct subdirectory holding a valid manifest. Anything else is
    /// skipped without error.
    fn scan(&self, kind: ResourceKind, kind_root: &Path, scope: Scope) -> Vec<Resource> {
        let Ok(entries) = std::fs::read_dir(kind_root) else {
            return Vec::new();
        };

        let mut dirs: Vec<PathBuf> = entries
            .flatten()
            .map(|e| e.path())
            .filter(|p| p.is_dir())
            .filter(|p| {
                p.file_name()
                    .is_some_and(|n| !n.to_string_lossy().starts_with('.'))
            })
            .collect();
        dirs.sort();

        dirs.iter()
            .filter_map(|dir| {
                let name = dir.file_name()?.to_string_lossy().into_owned();
                load_skill_dir(kind, &name, dir, scope)
            })
            .collect()
    }
}

/// Parse an installed skill directory. `None` when the manifest is missing,
/// malformed, or lacks a name or description.
fn load_skill_dir(kind: ResourceKind, name: &str, dir: &Path, scope: Scope) -> Option<Resource> {
    let manifest = dir.join(SKILL_MANIFEST_FILE);
    if !manifest.is_file() {
        tracing::debug!("skipping {}: no {SKILL_MANIFEST_FILE}", dir.display());
        return None;
    }
    let content = std::fs::read_to_string(&manifest).ok()?;
    let mut resource = match Resource::parse(kind, name, &content, dir.to_path_buf(), scope) {
        Ok(r) => r,
        Err(e) => {
            tracing::debug!("skipping {}: {e}", manifest.display());
            return None;
        }
    };
    if resource.header.get_str("name").is_none() || resource.description.is_empty() {
        tracing::debug!("skipping {}: manifest lacks name or description", manifest.display());
        return None;
    }

    if let ResourceDetails::Skill { files, .. } = &mut resource.details {
        *files = auxiliary_files(dir);
    }
    Some(resource)
}

/// Files under a skill directory except its top-level manifest, relative and sorted.
#[must_use]
pub fn auxiliary_files(skill_dir: &Path) -> Vec<PathBuf> {
    WalkDir::new(skill_dir)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter()
        .flatten()
        .filter(|e| e.file_type().is_file())
        .filter_map(|e| e.path().strip_prefix(skill_dir).ok().map(Path::to_path_buf))
        .filter(|rel| rel != Path::new(SKILL_MANIFEST_FILE))
        .collect()
}

#[cfg(test)]
mod tests {
    use quiver_catalog::{Catalog, EmbeddedBackend};

    use super::*;

    fn make_skill_dir(root: &Path, name: &str) -> PathBuf {
        let skill_dir = root.join(name);
        std::fs::create_dir_all(&skill_dir).unwrap();
        std::fs::write(
            skill_dir.join(SKILL_MANIFEST_FILE),
            format!("---\nname: {name}\ndescription: A test skill.\n---\n# Body\nHello"),
        )
        .unwrap();
        skill_dir
    }

    fn catalog() -> Catalog {
        Catalog::new(EmbeddedBackend::new([
            (
                "skills/index.json",
                r#"{"version":"1.0.0","resources":[{"name":"foo","path":"foo/SKILL.md"}]}"#,
            ),
            ("skills/foo/SKILL.md", "---\nname: foo\ndescription: d\n---\nbody"),
            ("skills/foo/scripts/run.sh", "echo run"),
            ("skills/foo/reference.md", "# ref"),
        ]))
    }

    #[test]
    fn scan_with_skills() {
        let dir = tempfile::tempdir().unwrap();
        make_skill_dir(dir.path(), "skill-b");
        make_skill_dir(dir.path(), "skill-a");

        let found = SkillShape.scan(ResourceKind::Skill, dir.path(), Scope::Project);
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].name, "skill-a");
        assert_eq!(found[1].name, "skill-b");
    }

    #[test]
    fn scan_skips_dirs_without_valid_manifest() {
        let dir = tempfile::tempdir().unwrap();
        make_skill_dir(dir.path(), "valid-skill");
        std::fs::create_dir_all(dir.path().join("no-md-dir")).unwrap();
        let broken = dir.path().join("broken");
        std::fs::create_dir_all(&broken).unwrap();
        std::fs::write(broken.join(SKILL_MANIFEST_FILE), "---\nname: broken\n---\n").unwrap();
        std::fs::write(dir.path().join("stray.md"), "not a dir").unwrap();

        let found = SkillShape.scan(ResourceKind::Skill, dir.path(), Scope::Global);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "valid-skill");
    }

    #[test]
    fn scan_records_auxiliary_files() {
        let dir = tempfile::tempdir().unwrap();
        let skill = make_skill_dir(dir.path(), "with-files");
        std::fs::create_dir_all(skill.join("scripts")).unwrap();
        std::fs::write(skill.join("scripts/run.sh"), "#!/bin/bash").unwrap();
        std::fs::write(skill.join("notes.md"), "n").unwrap();

        let found = SkillShape.scan(ResourceKind::Skill, dir.path(), Scope::Project);
        assert_eq!(
            found[0].files(),
            [PathBuf::from("notes.md"), PathBuf::from("scripts/run.sh")]
        );
    }

    #[test]
    fn materialize_copies_manifest_and_aux_files() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("skills/foo");
        let catalog = catalog();
        let content = catalog.load_template(ResourceKind::Skill, "foo/SKILL.md").unwrap();

        SkillShape
            .materialize(&Materialize {
                catalog: &catalog,
                kind: ResourceKind::Skill,
                name: "foo",
                content: &content,
                target: &target,
                force: false,
            })
            .unwrap();

        assert!(target.join(SKILL_MANIFEST_FILE).is_file());
        assert_eq!(
            std::fs::read_to_string(target.join("scripts/run.sh")).unwrap(),
            "echo run"
        );
        assert!(target.join("reference.md").is_file());
        let leftovers = std::fs::read_dir(dir.path().join("skills"))
            .unwrap()
            .flatten()
            .filter(|e| e.file_name().to_string_lossy().starts_with(".quiver-"))
            .count();
        assert_eq!(leftovers, 0);
    }

    #[test]
    fn materialize_force_replaces_stale_files() {
        let dir = tempfile::tempdir().unwrap();
        let target = make_skill_dir(&dir.path().join("skills"), "foo");
        std::fs::write(target.join("stale.txt"), "old").unwrap();
        let catalog = catalog();

        SkillShape
            .materialize(&Materialize {
                catalog: &catalog,
                kind: ResourceKind::Skill,
                name: "foo",
                content: "---\nname: foo\ndescription: d\n---\nnew",
                target: &target,
                force: true,
            })
            .unwrap();

        assert!(!target.join("stale.txt").exists());
        assert!(target.join("scripts/run.sh").exists());
    }
}
