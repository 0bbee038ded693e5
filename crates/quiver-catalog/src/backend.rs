//! Storage backends for the catalog.
//!
//! Keys are catalog-relative paths with `/` separators
//! (`skills/code-review/SKILL.md`). Both backends return keys in the same
//! sorted order so callers never observe which one is active.

use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::path::{Component, Path, PathBuf};

use walkdir::WalkDir;

use crate::error::CatalogError;

pub trait CatalogBackend: Send + Sync + fmt::Debug {
    /// Read one file. `Ok(None)` when the key does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the key exists but cannot be read.
    fn read(&self, key: &str) -> Result<Option<Vec<u8>>, CatalogError>;

    /// List every file key below `prefix`, sorted.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying tree cannot be walked.
    fn list(&self, prefix: &str) -> Result<Vec<String>, CatalogError>;

    /// On-disk root for writable backends.
    fn root(&self) -> Option<&Path> {
        None
    }
}

fn is_safe_key(key: &str) -> bool {
    !key.is_empty()
        && Path::new(key)
            .components()
            .all(|c| matches!(c, Component::Normal(_)))
}

fn normalize_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("{trimmed}/")
    }
}

/// Live directory tree, used when running from a source checkout.
#[derive(Debug, Clone)]
pub struct DiskBackend {
    root: PathBuf,
}

impl DiskBackend {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl CatalogBackend for DiskBackend {
    fn read(&self, key: &str) -> Result<Option<Vec<u8>>, CatalogError> {
        if !is_safe_key(key) {
            return Ok(None);
        }
        let path = self.root.join(key);
        if !path.is_file() {
            return Ok(None);
        }
        Ok(Some(std::fs::read(&path)?))
    }

    fn list(&self, prefix: &str) -> Result<Vec<String>, CatalogError> {
        let prefix = normalize_prefix(prefix);
        let dir = self.root.join(&prefix);
        if !dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut keys = Vec::new();
        for entry in WalkDir::new(&dir).sort_by_file_name() {
            let entry = entry.map_err(|e| CatalogError::Io(e.into()))?;
            if !entry.file_type().is_file() {
                continue;
            }
            let Ok(rel) = entry.path().strip_prefix(&self.root) else {
                continue;
            };
            let key = rel
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            keys.push(key);
        }
        keys.sort();
        Ok(keys)
    }

    fn root(&self) -> Option<&Path> {
        Some(&self.root)
    }
}

/// Precomputed key → content table compiled into the binary.
///
/// Lookups go through a hash index; listing preserves the table order.
pub struct EmbeddedBackend {
    entries: Vec<(Cow<'static, str>, Cow<'static, [u8]>)>,
    index: HashMap<String, usize>,
}

impl EmbeddedBackend {
    /// Wrap a static table generated at build time.
    #[must_use]
    pub fn from_static(table: &'static [(&'static str, &'static [u8])]) -> Self {
        Self::build(
            table
                .iter()
                .map(|(k, v)| (Cow::Borrowed(*k), Cow::Borrowed(*v)))
                .collect(),
        )
    }

    /// Build from owned entries, keeping the given order.
    pub fn new<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<Vec<u8>>,
    {
        Self::build(
            entries
                .into_iter()
                .map(|(k, v)| (Cow::Owned(k.into()), Cow::Owned(v.into())))
                .collect(),
        )
    }

    fn build(entries: Vec<(Cow<'static, str>, Cow<'static, [u8]>)>) -> Self {
        let index = entries
            .iter()
            .enumerate()
            .map(|(i, (k, _))| (k.to_string(), i))
            .collect();
        Self { entries, index }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for EmbeddedBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmbeddedBackend")
            .field("entries", &self.entries.len())
            .finish()
    }
}

impl CatalogBackend for EmbeddedBackend {
    fn read(&self, key: &str) -> Result<Option<Vec<u8>>, CatalogError> {
        Ok(self
            .index
            .get(key)
            .map(|&i| self.entries[i].1.to_vec()))
    }

    fn list(&self, prefix: &str) -> Result<Vec<String>, CatalogError> {
        let prefix = normalize_prefix(prefix);
        let mut keys: Vec<String> = self
            .entries
            .iter()
            .filter(|(k, _)| k.starts_with(prefix.as_str()))
            .map(|(k, _)| k.to_string())
            .collect();
        keys.sort();
        Ok(keys)
    }
}
