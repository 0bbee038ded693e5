//! Source lifecycle: add, remove, pull, scan and sync into the catalog.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use quiver_catalog::{Catalog, CatalogError, ResourceKind, SKILL_MANIFEST_FILE};
use serde::Serialize;

use crate::config::{
    AddSourceOptions, SourceConfig, SourceList, derive_name, is_safe_name, validate_url,
};
use crate::copy::copy_skill;
use crate::error::SourceError;
use crate::git::Git;
use crate::merge::merge_index;
use crate::scan::{ScannedSkill, scan_source_skills};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceStatus {
    /// Configured, no local clone.
    Added,
    Cloned,
    /// Cloned and contributing entries to the skill index.
    Synced,
}

impl std::fmt::Display for SourceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Added => "added",
            Self::Cloned => "cloned",
            Self::Synced => "synced",
        })
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceInfo {
    #[serde(flatten)]
    pub config: SourceConfig,
    pub status: SourceStatus,
    pub clone_path: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PullAction {
    Cloned,
    Pulled,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceFailure {
    pub source: String,
    pub reason: String,
}

#[derive(Debug, Default, Serialize)]
pub struct PullReport {
    pub succeeded: Vec<String>,
    pub failed: Vec<SourceFailure>,
}

impl PullReport {
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

#[derive(Debug, Clone, Default)]
pub struct SyncOptions {
    /// Only this source.
    pub filter: Option<String>,
    pub dry_run: bool,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    pub added: Vec<String>,
    pub updated: Vec<String>,
    /// Sources that are configured but not cloned.
    pub skipped: Vec<String>,
    pub total: usize,
    pub errors: Vec<SourceFailure>,
    /// Manual index entries replaced by a scanned skill of the same name.
    pub overwritten: Vec<String>,
    /// Index entries dropped because their source is gone.
    pub pruned: Vec<String>,
    pub dry_run: bool,
}

impl SyncReport {
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Owns the source list and the clones, and writes synced skills into a
/// disk-backed catalog.
#[derive(Debug, Clone)]
pub struct Synchronizer {
    catalog: Catalog,
    sources_file: PathBuf,
    clone_root: PathBuf,
    git: Git,
}

impl Synchronizer {
    #[must_use]
    pub fn new(
        catalog: Catalog,
        sources_file: impl Into<PathBuf>,
        clone_root: impl Into<PathBuf>,
        git: Git,
    ) -> Self {
        Self {
            catalog,
            sources_file: sources_file.into(),
            clone_root: clone_root.into(),
            git,
        }
    }

    #[must_use]
    pub fn sources_file(&self) -> &Path {
        &self.sources_file
    }

    /// # Errors
    ///
    /// Returns an error if the source list exists but cannot be parsed.
    pub fn load_sources(&self) -> Result<SourceList, SourceError> {
        SourceList::load(&self.sources_file)
    }

    #[must_use]
    pub fn clone_path(&self, name: &str) -> PathBuf {
        self.clone_root.join(name)
    }

    #[must_use]
    pub fn is_cloned(&self, name: &str) -> bool {
        self.clone_path(name).join(".git").exists()
    }

    /// Register a repository. The name defaults to the URL's last segment.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::InvalidUrl`], [`SourceError::InvalidName`] or
    /// [`SourceError::DuplicateSource`] without touching the list.
    pub fn add_source(
        &self,
        url: &str,
        options: &AddSourceOptions,
    ) -> Result<SourceConfig, SourceError> {
        validate_url(url)?;
        let name = match &options.name {
            Some(name) if is_safe_name(name) => name.clone(),
            Some(name) => return Err(SourceError::InvalidName(name.clone())),
            None => derive_name(url).ok_or_else(|| SourceError::InvalidName(url.to_owned()))?,
        };

        let mut list = self.load_sources()?;
        if list.find(&name).is_some() {
            return Err(SourceError::DuplicateSource(name));
        }

        let mut source = SourceConfig::new(name, url);
        if let Some(branch) = &options.branch {
            source.branch.clone_from(branch);
        }
        if let Some(dir) = &options.skills_dir {
            source.skills_dir.clone_from(dir);
        }
        list.sources.push(source.clone());
        list.save(&self.sources_file)?;

        tracing::info!(source = %source.name, url, "source added");
        Ok(source)
    }

    /// Unregister a source, optionally deleting its clone. Clone deletion is
    /// best-effort.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::SourceNotFound`] if no source has that name.
    pub fn remove_source(&self, name: &str, delete_clone: bool) -> Result<SourceConfig, SourceError> {
        let mut list = self.load_sources()?;
        let index = list
            .sources
            .iter()
            .position(|s| s.name == name)
            .ok_or_else(|| SourceError::SourceNotFound(name.to_owned()))?;
        let removed = list.sources.remove(index);
        list.save(&self.sources_file)?;

        if delete_clone && is_safe_name(name) {
            let path = self.clone_path(name);
            if path.exists()
                && let Err(e) = std::fs::remove_dir_all(&path)
            {
                tracing::warn!(source = name, "cannot delete clone {}: {e}", path.display());
            }
        }
        tracing::info!(source = name, "source removed");
        Ok(removed)
    }

    /// Configured sources with their lifecycle state.
    ///
    /// # Errors
    ///
    /// Returns an error if the source list cannot be parsed.
    pub fn sources(&self) -> Result<Vec<SourceInfo>, SourceError> {
        let index = self.catalog.load_manifest(ResourceKind::Skill);
        let contributing: HashSet<&str> = index
            .resources
            .iter()
            .filter_map(|e| e.source.as_deref())
            .collect();

        Ok(self
            .load_sources()?
            .sources
            .into_iter()
            .map(|config| {
                let status = if !self.is_cloned(&config.name) {
                    SourceStatus::Added
                } else if contributing.contains(config.name.as_str()) {
                    SourceStatus::Synced
                } else {
                    SourceStatus::Cloned
                };
                SourceInfo {
                    clone_path: self.clone_path(&config.name),
                    config,
                    status,
                }
            })
            .collect())
    }

    fn find_source(&self, name: &str) -> Result<SourceConfig, SourceError> {
        self.load_sources()?
            .find(name)
            .cloned()
            .ok_or_else(|| SourceError::SourceNotFound(name.to_owned()))
    }

    /// Clone the source if it has no local clone, fast-forward it otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::SourceNotFound`], or git's failure with its
    /// stderr. Partial clones are left in place.
    pub async fn pull(&self, name: &str) -> Result<PullAction, SourceError> {
        let source = self.find_source(name)?;
        self.pull_source(&source).await
    }

    async fn pull_source(&self, source: &SourceConfig) -> Result<PullAction, SourceError> {
        let path = self.clone_path(&source.name);
        if self.is_cloned(&source.name) {
            tracing::info!(source = %source.name, "pulling");
            self.git.pull_ff_only(&path).await?;
            Ok(PullAction::Pulled)
        } else {
            tracing::info!(source = %source.name, branch = %source.branch, "cloning");
            std::fs::create_dir_all(&self.clone_root)?;
            self.git
                .clone_shallow(&source.url, &source.branch, &path)
                .await?;
            Ok(PullAction::Cloned)
        }
    }

    /// Pull every source (or only `filter`) one at a time. Per-source git
    /// failures are collected; an interrupt stops the batch.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::SourceNotFound`] for an unknown filter, or
    /// [`SourceError::Interrupted`].
    pub async fn pull_all(&self, filter: Option<&str>) -> Result<PullReport, SourceError> {
        let targets = Self::targets(&self.load_sources()?, filter)?;
        let mut report = PullReport::default();
        for source in &targets {
            match self.pull_source(source).await {
                Ok(_) => report.succeeded.push(source.name.clone()),
                Err(e @ SourceError::Interrupted(_)) => return Err(e),
                Err(e) => {
                    tracing::warn!(source = %source.name, "pull failed: {e}");
                    report.failed.push(SourceFailure {
                        source: source.name.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }
        Ok(report)
    }

    fn targets(list: &SourceList, filter: Option<&str>) -> Result<Vec<SourceConfig>, SourceError> {
        match filter {
            None => Ok(list.sources.clone()),
            Some(name) => list
                .find(name)
                .cloned()
                .map(|s| vec![s])
                .ok_or_else(|| SourceError::SourceNotFound(name.to_owned())),
        }
    }

    /// Skills in one cloned source.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::SourceNotFound`] or [`SourceError::NotCloned`].
    pub fn scan_source_skills(&self, name: &str) -> Result<Vec<ScannedSkill>, SourceError> {
        let source = self.find_source(name)?;
        if !self.is_cloned(name) {
            return Err(SourceError::NotCloned(name.to_owned()));
        }
        Ok(scan_source_skills(&source, &self.clone_path(name)))
    }

    /// Copy every scanned skill into the catalog and rebuild the skill index.
    ///
    /// Uncloned sources are reported as `skipped`. A skill is `added` when
    /// the catalog has no manifest for it yet, `updated` otherwise. When two
    /// sources provide the same skill name the first source wins. A dry run
    /// classifies and merges without writing anything.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::ReadOnly`] for an embedded catalog, or an error
    /// if the source list or the index cannot be read or written.
    pub fn sync_all(&self, options: &SyncOptions) -> Result<SyncReport, SourceError> {
        let skills_root = self
            .catalog
            .root()
            .ok_or(CatalogError::ReadOnly)?
            .join(ResourceKind::Skill.catalog_dir());
        let list = self.load_sources()?;
        let targets = Self::targets(&list, options.filter.as_deref())?;

        let mut report = SyncReport {
            dry_run: options.dry_run,
            ..SyncReport::default()
        };
        let mut scanned_sources = HashSet::new();
        let mut synced: Vec<ScannedSkill> = Vec::new();
        let mut seen = HashSet::new();

        for source in &targets {
            if !self.is_cloned(&source.name) {
                tracing::warn!(source = %source.name, "not cloned, skipping");
                report.skipped.push(source.name.clone());
                continue;
            }
            scanned_sources.insert(source.name.clone());

            for skill in scan_source_skills(source, &self.clone_path(&source.name)) {
                if !seen.insert(skill.name.clone()) {
                    tracing::warn!(source = %source.name, skill = %skill.name, "duplicate skill name, keeping the first");
                    continue;
                }
                let dest = skills_root.join(&skill.name);
                let existed = dest.join(SKILL_MANIFEST_FILE).is_file();

                if !options.dry_run
                    && let Err(e) = copy_skill(&skill.dir, &dest)
                {
                    tracing::warn!(source = %source.name, skill = %skill.name, "copy failed: {e}");
                    report.errors.push(SourceFailure {
                        source: source.name.clone(),
                        reason: format!("{}: {e}", skill.name),
                    });
                    continue;
                }

                tracing::debug!(source = %source.name, skill = %skill.name, existed, "synced");
                if existed {
                    report.updated.push(skill.name.clone());
                } else {
                    report.added.push(skill.name.clone());
                }
                synced.push(skill);
            }
        }
        report.total = report.added.len() + report.updated.len();

        let configured: HashSet<String> = list.sources.into_iter().map(|s| s.name).collect();
        let existing = self.catalog.load_manifest(ResourceKind::Skill);
        let merged = merge_index(&existing, &synced, &scanned_sources, &configured);
        for name in &merged.overwritten {
            tracing::warn!(skill = %name, "manual index entry overwritten by synced skill");
        }
        for name in &merged.pruned {
            tracing::info!(skill = %name, "pruned index entry of removed source");
        }
        report.overwritten = merged.overwritten;
        report.pruned = merged.pruned;

        if !options.dry_run {
            self.catalog
                .save_manifest(ResourceKind::Skill, &merged.manifest)?;
        }
        tracing::info!(
            added = report.added.len(),
            updated = report.updated.len(),
            skipped = report.skipped.len(),
            dry_run = options.dry_run,
            "sync finished"
        );
        Ok(report)
    }
}
