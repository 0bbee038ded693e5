//! Persisted source list (`sources.json`).

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Component, Path};

use serde::{Deserialize, Serialize};

use crate::error::SourceError;

pub const DEFAULT_BRANCH: &str = "main";
pub const DEFAULT_SKILLS_DIR: &str = "skills";
pub const DEFAULT_CATEGORY: &str = "community";

fn default_branch() -> String {
    DEFAULT_BRANCH.to_owned()
}

fn default_skills_dir() -> String {
    DEFAULT_SKILLS_DIR.to_owned()
}

/// An external git repository that supplies skills.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceConfig {
    pub name: String,
    pub url: String,
    #[serde(default = "default_branch")]
    pub branch: String,
    /// Directory inside the clone that holds skills.
    #[serde(default = "default_skills_dir")]
    pub skills_dir: String,
    /// Path prefixes, relative to `skills_dir`, never scanned.
    #[serde(default)]
    pub exclude: Vec<String>,
    /// Skill name to category.
    #[serde(default)]
    pub category_mapping: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_category: Option<String>,
}

impl SourceConfig {
    #[must_use]
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            branch: default_branch(),
            skills_dir: default_skills_dir(),
            exclude: Vec::new(),
            category_mapping: BTreeMap::new(),
            default_category: None,
        }
    }

    /// Mapping first, then the manifest's own category, then the source default.
    #[must_use]
    pub fn category_for(&self, skill: &str, manifest_category: Option<&str>) -> String {
        self.category_mapping
            .get(skill)
            .map(String::as_str)
            .or(manifest_category)
            .or(self.default_category.as_deref())
            .unwrap_or(DEFAULT_CATEGORY)
            .to_owned()
    }

    /// Whether `rel` (relative to the skills dir) falls under an exclude prefix.
    #[must_use]
    pub fn is_excluded(&self, rel: &Path) -> bool {
        self.exclude.iter().any(|prefix| {
            let prefix = prefix.trim_matches('/');
            !prefix.is_empty() && rel.starts_with(prefix)
        })
    }
}

/// `{ "sources": [...] }`
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct SourceList {
    #[serde(default)]
    pub sources: Vec<SourceConfig>,
}

impl SourceList {
    /// Load the list. A missing file is an empty list.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, SourceError> {
        match std::fs::read(path) {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e.into()),
        }
    }

    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<(), SourceError> {
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        std::fs::create_dir_all(dir)?;

        let mut json = serde_json::to_string_pretty(self)?;
        json.push('\n');
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(json.as_bytes())?;
        tmp.persist(path).map_err(|e| SourceError::Io(e.error))?;
        Ok(())
    }

    #[must_use]
    pub fn find(&self, name: &str) -> Option<&SourceConfig> {
        self.sources.iter().find(|s| s.name == name)
    }
}

/// Optional overrides for `add_source`.
#[derive(Debug, Clone, Default)]
pub struct AddSourceOptions {
    pub name: Option<String>,
    pub branch: Option<String>,
    pub skills_dir: Option<String>,
}

/// Last path segment of a repository URL without `.git`.
///
/// `git@host/repo.git` and `https://host/org/repo/` both yield `repo`.
#[must_use]
pub fn derive_name(url: &str) -> Option<String> {
    let trimmed = url.trim().trim_end_matches('/');
    let tail = trimmed.rsplit(['/', ':']).next()?;
    let name = tail.strip_suffix(".git").unwrap_or(tail);
    is_safe_name(name).then(|| name.to_owned())
}

/// Reject URLs git could misread as an option or that cannot name a repository.
///
/// # Errors
///
/// Returns [`SourceError::InvalidUrl`] for empty URLs, URLs with whitespace,
/// and URLs starting with `-`.
pub fn validate_url(url: &str) -> Result<(), SourceError> {
    if url.is_empty() {
        return Err(SourceError::InvalidUrl("URL must not be empty".into()));
    }
    if url.chars().any(char::is_whitespace) {
        return Err(SourceError::InvalidUrl(format!(
            "URL must not contain whitespace: {url}"
        )));
    }
    if url.starts_with('-') {
        return Err(SourceError::InvalidUrl(format!(
            "URL must not start with '-': {url}"
        )));
    }
    Ok(())
}

/// A single, non-hidden path component.
#[must_use]
pub fn is_safe_name(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(components.next(), Some(Component::Normal(_)))
        && components.next().is_none()
        && !name.starts_with('.')
        && !name.contains(['/', '\\'])
}
