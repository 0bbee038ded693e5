use super::{CatalogModeSetting, Config};

impl Config {
    pub(crate) fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("QUIVER_CATALOG_DIR") {
            self.catalog.dir = v;
        }
        if let Ok(v) = std::env::var("QUIVER_CATALOG_MODE") {
            match v.to_lowercase().as_str() {
                "auto" => self.catalog.mode = CatalogModeSetting::Auto,
                "disk" => self.catalog.mode = CatalogModeSetting::Disk,
                "embedded" => self.catalog.mode = CatalogModeSetting::Embedded,
                _ => tracing::warn!("ignoring invalid QUIVER_CATALOG_MODE value: {v}"),
            }
        }
        if let Ok(v) = std::env::var("QUIVER_PROJECT_DIR") {
            self.scopes.project_dir = v;
        }
        if let Ok(v) = std::env::var("QUIVER_GLOBAL_DIR") {
            self.scopes.global_dir = v;
        }
        if let Ok(v) = std::env::var("QUIVER_SOURCES_FILE") {
            self.sources.file = v;
        }
        if let Ok(v) = std::env::var("QUIVER_CLONE_DIR") {
            self.sources.clone_dir = v;
        }
        if let Ok(v) = std::env::var("QUIVER_GIT_PROGRAM") {
            self.sources.git_program = v;
        }
        if let Ok(v) = std::env::var("QUIVER_RESERVED_WORDS") {
            self.skills.reserved_words = v
                .split(',')
                .map(|w| w.trim().to_lowercase())
                .filter(|w| !w.is_empty())
                .collect();
        }
    }
}
