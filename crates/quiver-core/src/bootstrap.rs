//! Application bootstrap: config resolution, catalog selection, resolver and
//! synchronizer construction.

use std::path::{Path, PathBuf};

use anyhow::Context;
use quiver_catalog::Catalog;
use quiver_resources::{ResourceKind, ResourceStore, Resolver, ValidationRules};
use quiver_sources::{Git, Synchronizer};

use crate::config::{CatalogMode, Config};

/// Table of `(catalog key, bytes)` compiled into the binary.
pub type EmbeddedTable = &'static [(&'static str, &'static [u8])];

/// Settings resolved once per run. Paths that need the home or data
/// directory are resolved only when a resolver or the synchronizer is asked
/// for, so commands that never touch them cannot fail on them.
pub struct App {
    config: Config,
    config_path: PathBuf,
    mode: CatalogMode,
    catalog: Catalog,
    project_root: PathBuf,
    rules: ValidationRules,
}

impl App {
    /// Load and validate the config at `config_path`, then build against the
    /// current working directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the config is invalid or the catalog directory
    /// cannot be used.
    pub fn from_path(config_path: PathBuf, embedded: EmbeddedTable) -> anyhow::Result<Self> {
        let config = Config::load(&config_path)?;
        config.validate()?;
        let cwd = std::env::current_dir().context("cannot determine working directory")?;
        Self::build(config, config_path, embedded, &cwd)
    }

    /// Select the catalog backend once.
    ///
    /// # Errors
    ///
    /// Returns an error if `disk` mode is forced and the directory is missing.
    pub fn build(
        config: Config,
        config_path: PathBuf,
        embedded: EmbeddedTable,
        cwd: &Path,
    ) -> anyhow::Result<Self> {
        let mode = config.catalog_mode(cwd)?;
        let catalog = match &mode {
            CatalogMode::Disk(dir) => Catalog::disk(dir),
            CatalogMode::Embedded => Catalog::embedded(embedded),
        };
        tracing::debug!(?mode, "catalog selected");

        Ok(Self {
            project_root: config.project_root(cwd),
            rules: ValidationRules {
                reserved_words: config.skills.reserved_words.clone(),
            },
            config,
            config_path,
            mode,
            catalog,
        })
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    #[must_use]
    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    #[must_use]
    pub fn mode(&self) -> &CatalogMode {
        &self.mode
    }

    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Resolver for `kind` over the project and global scopes.
    ///
    /// # Errors
    ///
    /// Returns an error if no global dir is configured and the home
    /// directory cannot be determined.
    pub fn resolver(&self, kind: ResourceKind) -> anyhow::Result<Resolver> {
        let store = ResourceStore::new(&self.project_root, self.config.global_root()?);
        Ok(Resolver::new(
            kind,
            self.catalog.clone(),
            store,
            self.rules.clone(),
        ))
    }

    /// # Errors
    ///
    /// Returns an error if the source file or clone dir defaults to the data
    /// directory and it cannot be determined.
    pub fn synchronizer(&self) -> anyhow::Result<Synchronizer> {
        Ok(Synchronizer::new(
            self.catalog.clone(),
            self.config.sources_file(&self.mode)?,
            self.config.clone_dir()?,
            Git::new(&self.config.sources.git_program),
        ))
    }
}

/// Priority: `--config` > `QUIVER_CONFIG` > `config/default.toml`.
#[must_use]
pub fn resolve_config_path(cli: Option<&Path>) -> PathBuf {
    if let Some(path) = cli {
        return path.to_path_buf();
    }
    if let Ok(path) = std::env::var("QUIVER_CONFIG") {
        return PathBuf::from(path);
    }
    PathBuf::from("config/default.toml")
}
