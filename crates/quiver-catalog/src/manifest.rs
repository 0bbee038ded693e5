//! Catalog index types (`<kind>/index.json`).

use serde::{Deserialize, Serialize};

pub const INDEX_FILE: &str = "index.json";
pub const MANIFEST_VERSION: &str = "1.0.0";

/// One catalog index: `{ version, resources: [...] }`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ResourceManifest {
    pub version: String,
    #[serde(default)]
    pub resources: Vec<ResourceManifestEntry>,
}

impl Default for ResourceManifest {
    fn default() -> Self {
        Self {
            version: MANIFEST_VERSION.to_owned(),
            resources: Vec::new(),
        }
    }
}

impl ResourceManifest {
    #[must_use]
    pub fn find(&self, name: &str) -> Option<&ResourceManifestEntry> {
        self.resources.iter().find(|e| e.name == name)
    }

    /// Insert `entry`, replacing an existing entry of the same name in place.
    ///
    /// Returns the replaced entry, if any.
    pub fn upsert(&mut self, entry: ResourceManifestEntry) -> Option<ResourceManifestEntry> {
        if let Some(slot) = self.resources.iter_mut().find(|e| e.name == entry.name) {
            return Some(std::mem::replace(slot, entry));
        }
        self.resources.push(entry);
        None
    }

    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.resources.iter().map(|e| e.name.as_str()).collect()
    }
}

/// A catalog record pointing at one installable template.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceManifestEntry {
    pub name: String,
    /// Path relative to the kind's catalog subtree. For skills this points at
    /// the manifest file inside the skill directory (`foo/SKILL.md`).
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<String>,
    /// Name of the external source that produced this entry. Entries without
    /// a source are manually curated and survive every sync.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl ResourceManifestEntry {
    #[must_use]
    pub fn new(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            display_name: None,
            category: None,
            tags: Vec::new(),
            description: None,
            dependencies: Vec::new(),
            source: None,
        }
    }

    /// Case-insensitive match against name, display name, description,
    /// category and tags. `query` must already be lowercased.
    #[must_use]
    pub fn matches(&self, query: &str) -> bool {
        let hit = |s: &str| s.to_lowercase().contains(query);
        hit(&self.name)
            || self.display_name.as_deref().is_some_and(hit)
            || self.description.as_deref().is_some_and(hit)
            || self.category.as_deref().is_some_and(hit)
            || self.tags.iter().any(|t| hit(t))
    }

    #[must_use]
    pub fn is_manual(&self) -> bool {
        self.source.is_none()
    }
}
