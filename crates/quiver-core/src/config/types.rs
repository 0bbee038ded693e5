use serde::{Deserialize, Serialize};

fn default_catalog_dir() -> String {
    "templates".into()
}

fn default_project_dir() -> String {
    ".claude".into()
}

fn default_reserved_words() -> Vec<String> {
    vec!["anthropic".into(), "claude".into()]
}

fn default_git_program() -> String {
    "git".into()
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub scopes: ScopesConfig,
    #[serde(default)]
    pub skills: SkillsConfig,
    #[serde(default)]
    pub sources: SourcesConfig,
}

/// How the catalog backend is chosen at startup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CatalogModeSetting {
    /// Disk when the catalog directory exists, embedded otherwise.
    #[default]
    Auto,
    Disk,
    Embedded,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct CatalogConfig {
    #[serde(default = "default_catalog_dir")]
    pub dir: String,
    #[serde(default)]
    pub mode: CatalogModeSetting,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            dir: default_catalog_dir(),
            mode: CatalogModeSetting::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ScopesConfig {
    /// Relative to the working directory unless absolute.
    #[serde(default = "default_project_dir")]
    pub project_dir: String,
    /// Empty means `<home>/.claude`.
    #[serde(default)]
    pub global_dir: String,
}

impl Default for ScopesConfig {
    fn default() -> Self {
        Self {
            project_dir: default_project_dir(),
            global_dir: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SkillsConfig {
    #[serde(default = "default_reserved_words")]
    pub reserved_words: Vec<String>,
}

impl Default for SkillsConfig {
    fn default() -> Self {
        Self {
            reserved_words: default_reserved_words(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SourcesConfig {
    /// Empty means `<catalog dir>/sources.json`.
    #[serde(default)]
    pub file: String,
    /// Empty means `<data dir>/quiver/sources`.
    #[serde(default)]
    pub clone_dir: String,
    #[serde(default = "default_git_program")]
    pub git_program: String,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            file: String::new(),
            clone_dir: String::new(),
            git_program: default_git_program(),
        }
    }
}
