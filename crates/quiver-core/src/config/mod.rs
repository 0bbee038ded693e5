mod env;
mod types;

#[cfg(test)]
mod tests;

pub use types::*;

use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use quiver_catalog::{INDEX_FILE, ResourceKind};

pub const SOURCES_FILE: &str = "sources.json";
const GLOBAL_DIR_NAME: &str = ".claude";
const DATA_DIR_NAME: &str = "quiver";

/// Resolved catalog backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogMode {
    Disk(PathBuf),
    Embedded,
}

impl Config {
    /// Load configuration from a TOML file with env var overrides.
    ///
    /// Falls back to defaults when the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path).context("failed to read config file")?;
            toml::from_str::<Self>(&content).context("failed to parse config file")?
        } else {
            Self::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// # Errors
    ///
    /// Returns an error describing the first invalid setting.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.sources.git_program.trim().is_empty() {
            bail!("sources.git_program must not be empty");
        }
        if self.scopes.project_dir.trim().is_empty() {
            bail!("scopes.project_dir must not be empty");
        }
        if self.catalog.mode == CatalogModeSetting::Disk && self.catalog.dir.trim().is_empty() {
            bail!("catalog.dir must be set when catalog.mode = \"disk\"");
        }
        for word in &self.skills.reserved_words {
            if word.is_empty() || *word != word.to_lowercase() {
                bail!("skills.reserved_words entries must be non-empty and lowercase: {word:?}");
            }
        }
        Ok(())
    }

    /// Pick the catalog backend. Relative catalog dirs resolve against `cwd`.
    ///
    /// `auto` only takes the directory when it holds a catalog index, so an
    /// unrelated `templates/` in the working directory keeps the embedded one.
    ///
    /// # Errors
    ///
    /// Returns an error when `disk` mode is forced and the directory is missing.
    pub fn catalog_mode(&self, cwd: &Path) -> anyhow::Result<CatalogMode> {
        let dir = cwd.join(&self.catalog.dir);
        match self.catalog.mode {
            CatalogModeSetting::Embedded => Ok(CatalogMode::Embedded),
            CatalogModeSetting::Disk if dir.is_dir() => Ok(CatalogMode::Disk(dir)),
            CatalogModeSetting::Disk => {
                bail!("catalog directory {} does not exist", dir.display())
            }
            CatalogModeSetting::Auto if !self.catalog.dir.is_empty() && is_catalog_dir(&dir) => {
                Ok(CatalogMode::Disk(dir))
            }
            CatalogModeSetting::Auto => Ok(CatalogMode::Embedded),
        }
    }

    #[must_use]
    pub fn project_root(&self, cwd: &Path) -> PathBuf {
        cwd.join(&self.scopes.project_dir)
    }

    /// # Errors
    ///
    /// Returns an error if no global dir is configured and the home
    /// directory cannot be determined.
    pub fn global_root(&self) -> anyhow::Result<PathBuf> {
        if !self.scopes.global_dir.is_empty() {
            return Ok(PathBuf::from(&self.scopes.global_dir));
        }
        let home = dirs::home_dir().context("cannot determine home directory")?;
        Ok(home.join(GLOBAL_DIR_NAME))
    }

    /// Configured path, else beside a disk catalog, else in the data dir.
    ///
    /// # Errors
    ///
    /// Returns an error if a default path is needed and the data directory
    /// cannot be determined.
    pub fn sources_file(&self, mode: &CatalogMode) -> anyhow::Result<PathBuf> {
        if !self.sources.file.is_empty() {
            return Ok(PathBuf::from(&self.sources.file));
        }
        match mode {
            CatalogMode::Disk(dir) => Ok(dir.join(SOURCES_FILE)),
            CatalogMode::Embedded => Ok(data_dir()?.join(SOURCES_FILE)),
        }
    }

    /// # Errors
    ///
    /// Returns an error if no clone dir is configured and the data directory
    /// cannot be determined.
    pub fn clone_dir(&self) -> anyhow::Result<PathBuf> {
        if !self.sources.clone_dir.is_empty() {
            return Ok(PathBuf::from(&self.sources.clone_dir));
        }
        Ok(data_dir()?.join("sources"))
    }
}

/// Whether `dir` has at least one `<kind>/index.json`.
fn is_catalog_dir(dir: &Path) -> bool {
    ResourceKind::ALL
        .iter()
        .any(|kind| dir.join(kind.catalog_dir()).join(INDEX_FILE).is_file())
}

fn data_dir() -> anyhow::Result<PathBuf> {
    Ok(dirs::data_dir()
        .context("cannot determine data directory")?
        .join(DATA_DIR_NAME))
}
