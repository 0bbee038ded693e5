//! Skill discovery inside a cloned source.

use std::path::{Path, PathBuf};

use quiver_catalog::{ResourceManifestEntry, SKILL_MANIFEST_FILE};
use quiver_resources::parse_template;
use serde::Serialize;
use walkdir::WalkDir;

use crate::config::{SourceConfig, is_safe_name};

/// A skill found during one sync run. Never persisted directly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScannedSkill {
    pub name: String,
    pub description: String,
    /// Skill directory inside the clone.
    pub dir: PathBuf,
    pub source: String,
    pub tags: Vec<String>,
    pub category: String,
}

impl ScannedSkill {
    /// Index entry for the synced copy, tagged with its source.
    #[must_use]
    pub fn to_entry(&self) -> ResourceManifestEntry {
        let mut entry =
            ResourceManifestEntry::new(&self.name, format!("{}/{SKILL_MANIFEST_FILE}", self.name));
        entry.description = Some(self.description.clone());
        entry.category = Some(self.category.clone());
        entry.tags.clone_from(&self.tags);
        entry.source = Some(self.source.clone());
        entry
    }
}

/// Walk `source.skills_dir` inside `clone_dir`.
///
/// A directory holding a manifest is one skill and is not searched further.
/// Hidden directories and directories under an exclude prefix are skipped
/// even when they hold a manifest. Unparseable manifests are logged and
/// skipped. Results are in path order.
#[must_use]
pub fn scan_source_skills(source: &SourceConfig, clone_dir: &Path) -> Vec<ScannedSkill> {
    let skills_dir = source.skills_dir.trim_matches('/');
    let root = if skills_dir.is_empty() || skills_dir == "." {
        clone_dir.to_path_buf()
    } else {
        clone_dir.join(skills_dir)
    };
    if !root.is_dir() {
        tracing::warn!(source = %source.name, "skills directory {} does not exist", root.display());
        return Vec::new();
    }

    let mut found = Vec::new();
    let mut walker = WalkDir::new(&root).sort_by_file_name().into_iter();
    while let Some(entry) = walker.next() {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                tracing::warn!(source = %source.name, "cannot walk skills directory: {e}");
                continue;
            }
        };
        if !entry.file_type().is_dir() {
            continue;
        }
        if entry.depth() > 0 {
            let hidden = entry.file_name().to_string_lossy().starts_with('.');
            let rel = entry.path().strip_prefix(&root).unwrap_or(entry.path());
            if hidden || source.is_excluded(rel) {
                walker.skip_current_dir();
                continue;
            }
        }

        let manifest = entry.path().join(SKILL_MANIFEST_FILE);
        if !manifest.is_file() {
            continue;
        }
        walker.skip_current_dir();
        if let Some(skill) = read_skill(source, entry.path(), &manifest) {
            found.push(skill);
        }
    }
    found
}

fn read_skill(source: &SourceConfig, dir: &Path, manifest: &Path) -> Option<ScannedSkill> {
    let content = match std::fs::read_to_string(manifest) {
        Ok(c) => c,
        Err(e) => {
            tracing::warn!(source = %source.name, "cannot read {}: {e}", manifest.display());
            return None;
        }
    };
    let parsed = match parse_template(&content) {
        Ok(p) => p,
        Err(e) => {
            tracing::warn!(source = %source.name, "skipping {}: {e}", manifest.display());
            return None;
        }
    };
    let header = parsed.header;

    let Some(name) = header.get_str("name") else {
        tracing::warn!(source = %source.name, "skipping {}: missing name", manifest.display());
        return None;
    };
    if !is_safe_name(&name) {
        tracing::warn!(source = %source.name, "skipping {}: unsafe skill name '{name}'", manifest.display());
        return None;
    }
    let Some(description) = header.get_str("description") else {
        tracing::warn!(source = %source.name, "skipping {}: missing description", manifest.display());
        return None;
    };

    let category = source.category_for(&name, header.get_str("category").as_deref());
    Some(ScannedSkill {
        tags: header.get_list("tags"),
        name,
        description,
        dir: dir.to_path_buf(),
        source: source.name.clone(),
        category,
    })
}
