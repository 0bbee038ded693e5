use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use crate::backend::{CatalogBackend, DiskBackend, EmbeddedBackend};
use crate::error::CatalogError;
use crate::kind::ResourceKind;
use crate::manifest::{INDEX_FILE, ResourceManifest, ResourceManifestEntry};
use crate::SKILL_MANIFEST_FILE;

/// Category key used by [`Catalog::list_by_category`] for entries without one.
pub const UNCATEGORIZED: &str = "uncategorized";

/// Read-only view of bundled templates. Cheap to clone.
#[derive(Debug, Clone)]
pub struct Catalog {
    backend: Arc<dyn CatalogBackend>,
}

impl Catalog {
    #[must_use]
    pub fn new(backend: impl CatalogBackend + 'static) -> Self {
        Self {
            backend: Arc::new(backend),
        }
    }

    #[must_use]
    pub fn disk(root: impl Into<std::path::PathBuf>) -> Self {
        Self::new(DiskBackend::new(root))
    }

    #[must_use]
    pub fn embedded(table: &'static [(&'static str, &'static [u8])]) -> Self {
        Self::new(EmbeddedBackend::from_static(table))
    }

    /// Only disk-backed catalogs accept index writes and synced skills.
    #[must_use]
    pub fn is_writable(&self) -> bool {
        self.backend.root().is_some()
    }

    #[must_use]
    pub fn root(&self) -> Option<&Path> {
        self.backend.root()
    }

    /// Load a kind's index.
    ///
    /// A missing or unreadable index yields an empty manifest so a fresh
    /// catalog is usable immediately.
    #[must_use]
    pub fn load_manifest(&self, kind: ResourceKind) -> ResourceManifest {
        let key = format!("{}/{INDEX_FILE}", kind.catalog_dir());
        match self.backend.read(&key) {
            Ok(Some(bytes)) => match serde_json::from_slice(&bytes) {
                Ok(manifest) => manifest,
                Err(e) => {
                    tracing::warn!("invalid catalog index {key}: {e}");
                    ResourceManifest::default()
                }
            },
            Ok(None) => ResourceManifest::default(),
            Err(e) => {
                tracing::warn!("cannot read catalog index {key}: {e}");
                ResourceManifest::default()
            }
        }
    }

    /// Persist a kind's index. Disk catalogs only.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::ReadOnly`] for embedded catalogs, or an IO/JSON
    /// error if the write fails.
    pub fn save_manifest(
        &self,
        kind: ResourceKind,
        manifest: &ResourceManifest,
    ) -> Result<(), CatalogError> {
        let root = self.backend.root().ok_or(CatalogError::ReadOnly)?;
        let dir = root.join(kind.catalog_dir());
        std::fs::create_dir_all(&dir)?;

        let mut json = serde_json::to_string_pretty(manifest)?;
        json.push('\n');

        let mut tmp = tempfile::NamedTempFile::new_in(&dir)?;
        tmp.write_all(json.as_bytes())?;
        tmp.persist(dir.join(INDEX_FILE))
            .map_err(|e| CatalogError::Io(e.error))?;
        Ok(())
    }

    /// Load a template as text. `relative_path` is relative to the kind's subtree.
    ///
    /// # Errors
    ///
    /// Returns an error if the template is missing, unreadable or not UTF-8.
    pub fn load_template(
        &self,
        kind: ResourceKind,
        relative_path: &str,
    ) -> Result<String, CatalogError> {
        let bytes = self.load_file(kind, relative_path)?;
        String::from_utf8(bytes)
            .map_err(|_| CatalogError::NotUtf8(format!("{}/{relative_path}", kind.catalog_dir())))
    }

    /// Load any file from the kind's subtree as raw bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing or unreadable.
    pub fn load_file(&self, kind: ResourceKind, relative_path: &str) -> Result<Vec<u8>, CatalogError> {
        let key = format!("{}/{}", kind.catalog_dir(), relative_path.trim_start_matches('/'));
        self.backend
            .read(&key)?
            .ok_or(CatalogError::TemplateNotFound(key))
    }

    #[must_use]
    pub fn find(&self, kind: ResourceKind, name: &str) -> Option<ResourceManifestEntry> {
        self.load_manifest(kind).find(name).cloned()
    }

    /// Case-insensitive search over name, display name, description, category and tags.
    #[must_use]
    pub fn search(&self, kind: ResourceKind, query: &str) -> Vec<ResourceManifestEntry> {
        let query = query.trim().to_lowercase();
        self.load_manifest(kind)
            .resources
            .into_iter()
            .filter(|e| query.is_empty() || e.matches(&query))
            .collect()
    }

    #[must_use]
    pub fn list_by_category(&self, kind: ResourceKind) -> BTreeMap<String, Vec<ResourceManifestEntry>> {
        let mut grouped: BTreeMap<String, Vec<ResourceManifestEntry>> = BTreeMap::new();
        for entry in self.load_manifest(kind).resources {
            let category = entry
                .category
                .clone()
                .unwrap_or_else(|| UNCATEGORIZED.to_owned());
            grouped.entry(category).or_default().push(entry);
        }
        grouped
    }

    /// Names of every catalog entry of `kind`.
    #[must_use]
    pub fn names(&self, kind: ResourceKind) -> Vec<String> {
        self.load_manifest(kind)
            .resources
            .into_iter()
            .map(|e| e.name)
            .collect()
    }

    /// Files shipped alongside a directory-shaped resource, relative to its
    /// directory and excluding the manifest itself.
    ///
    /// Always empty for single-file kinds.
    #[must_use]
    pub fn list_auxiliary_files(&self, kind: ResourceKind, resource_name: &str) -> Vec<String> {
        if !kind.is_directory() {
            return Vec::new();
        }
        let dir = self
            .find(kind, resource_name)
            .and_then(|e| skill_dir_of(&e.path))
            .unwrap_or_else(|| resource_name.to_owned());

        let prefix = format!("{}/{dir}/", kind.catalog_dir());
        let keys = match self.backend.list(&prefix) {
            Ok(keys) => keys,
            Err(e) => {
                tracing::warn!("cannot list files for {kind} '{resource_name}': {e}");
                return Vec::new();
            }
        };

        keys.into_iter()
            .filter_map(|k| k.strip_prefix(&prefix).map(str::to_owned))
            .filter(|rel| rel != SKILL_MANIFEST_FILE)
            .collect()
    }

    /// Read one file returned by [`Catalog::list_auxiliary_files`].
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing or unreadable.
    pub fn load_auxiliary_file(
        &self,
        kind: ResourceKind,
        resource_name: &str,
        relative_path: &str,
    ) -> Result<Vec<u8>, CatalogError> {
        let dir = self
            .find(kind, resource_name)
            .and_then(|e| skill_dir_of(&e.path))
            .unwrap_or_else(|| resource_name.to_owned());
        self.load_file(kind, &format!("{dir}/{relative_path}"))
    }
}

/// Directory component of a skill entry path (`foo/SKILL.md` → `foo`).
fn skill_dir_of(path: &str) -> Option<String> {
    let trimmed = path.trim_matches('/');
    let dir = trimmed
        .strip_suffix(SKILL_MANIFEST_FILE)
        .map_or(trimmed, |d| d.trim_end_matches('/'));
    (!dir.is_empty()).then(|| dir.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SKILL_INDEX: &str = r#"{"version":"1.0.0","resources":[
        {"name":"code-review","path":"code-review/SKILL.md","category":"quality","tags":["review"]},
        {"name":"typescript-expert","path":"typescript-expert/SKILL.md","description":"TypeScript help"},
        {"name":"lint","path":"lint/SKILL.md","category":"quality"}
    ]}"#;

    fn write(root: &Path, key: &str, content: &str) {
        let path = root.join(key);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    fn fixture_files() -> Vec<(&'static str, &'static str)> {
        vec![
            ("skills/index.json", SKILL_INDEX),
            ("skills/code-review/SKILL.md", "---\nname: code-review\n---\n"),
            ("skills/code-review/scripts/check.sh", "echo ok"),
            ("skills/code-review/reference.md", "# ref"),
            ("skills/typescript-expert/SKILL.md", "---\nname: typescript-expert\n---\n"),
        ]
    }

    fn both_modes() -> (tempfile::TempDir, Vec<Catalog>) {
        let dir = tempfile::tempdir().unwrap();
        for (key, content) in fixture_files() {
            write(dir.path(), key, content);
        }
        let disk = Catalog::disk(dir.path());
        let embedded = Catalog::new(EmbeddedBackend::new(fixture_files()));
        (dir, vec![disk, embedded])
    }

    #[test]
    fn missing_index_is_empty_manifest() {
        let (_dir, catalogs) = both_modes();
        for catalog in catalogs {
            let manifest = catalog.load_manifest(ResourceKind::Persona);
            assert_eq!(manifest, ResourceManifest::default());
        }
    }

    #[test]
    fn corrupt_index_is_empty_manifest() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "commands/index.json", "{ not json");
        let catalog = Catalog::disk(dir.path());
        assert!(catalog.load_manifest(ResourceKind::Command).resources.is_empty());
    }

    #[test]
    fn find_and_load_template_in_both_modes() {
        let (_dir, catalogs) = both_modes();
        for catalog in catalogs {
            let entry = catalog.find(ResourceKind::Skill, "code-review").unwrap();
            let content = catalog.load_template(ResourceKind::Skill, &entry.path).unwrap();
            assert!(content.contains("name: code-review"));
            assert!(catalog.find(ResourceKind::Skill, "nope").is_none());
        }
    }

    #[test]
    fn missing_template_errors() {
        let (_dir, catalogs) = both_modes();
        for catalog in catalogs {
            let err = catalog.load_template(ResourceKind::Skill, "lint/SKILL.md").unwrap_err();
            assert!(matches!(err, CatalogError::TemplateNotFound(_)));
        }
    }

    #[test]
    fn auxiliary_files_exclude_manifest() {
        let (_dir, catalogs) = both_modes();
        for catalog in catalogs {
            let files = catalog.list_auxiliary_files(ResourceKind::Skill, "code-review");
            assert_eq!(files, vec!["reference.md", "scripts/check.sh"]);
            assert!(catalog
                .list_auxiliary_files(ResourceKind::Skill, "typescript-expert")
                .is_empty());
            assert!(catalog
                .list_auxiliary_files(ResourceKind::Persona, "code-review")
                .is_empty());
            let script = catalog
                .load_auxiliary_file(ResourceKind::Skill, "code-review", "scripts/check.sh")
                .unwrap();
            assert_eq!(script, b"echo ok");
        }
    }

    #[test]
    fn search_is_case_insensitive() {
        let (_dir, catalogs) = both_modes();
        for catalog in catalogs {
            let hits = catalog.search(ResourceKind::Skill, "TYPESCRIPT");
            assert_eq!(hits.len(), 1);
            assert_eq!(hits[0].name, "typescript-expert");
            assert_eq!(catalog.search(ResourceKind::Skill, "review").len(), 1);
            assert_eq!(catalog.search(ResourceKind::Skill, "").len(), 3);
        }
    }

    #[test]
    fn groups_by_category() {
        let (_dir, catalogs) = both_modes();
        for catalog in catalogs {
            let grouped = catalog.list_by_category(ResourceKind::Skill);
            assert_eq!(grouped["quality"].len(), 2);
            assert_eq!(grouped[UNCATEGORIZED].len(), 1);
        }
    }

    #[test]
    fn save_manifest_round_trips_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = Catalog::disk(dir.path());
        let mut manifest = ResourceManifest::default();
        manifest.upsert(ResourceManifestEntry::new("foo", "foo/SKILL.md"));
        catalog.save_manifest(ResourceKind::Skill, &manifest).unwrap();

        assert!(dir.path().join("skills/index.json").is_file());
        assert_eq!(catalog.load_manifest(ResourceKind::Skill), manifest);
    }

    #[test]
    fn embedded_catalog_is_read_only() {
        let catalog = Catalog::new(EmbeddedBackend::new(fixture_files()));
        assert!(!catalog.is_writable());
        let err = catalog
            .save_manifest(ResourceKind::Skill, &ResourceManifest::default())
            .unwrap_err();
        assert!(matches!(err, CatalogError::ReadOnly));
    }

    #[test]
    fn skill_dir_from_entry_path() {
        assert_eq!(skill_dir_of("foo/SKILL.md").as_deref(), Some("foo"));
        assert_eq!(skill_dir_of("nested/foo/SKILL.md").as_deref(), Some("nested/foo"));
        assert_eq!(skill_dir_of("foo").as_deref(), Some("foo"));
        assert_eq!(skill_dir_of("SKILL.md"), None);
    }
}
