use std::path::PathBuf;

use quiver_catalog::{CatalogError, ResourceKind};

#[derive(Debug, thiserror::Error)]
pub enum ResourceError {
    #[error("{kind} '{name}' not found in catalog{}", format_suggestions(.suggestions))]
    NotFound {
        kind: ResourceKind,
        name: String,
        suggestions: Vec<String>,
    },

    #[error("{kind} '{name}' is already installed at {} (use --force to overwrite)", .path.display())]
    AlreadyInstalled {
        kind: ResourceKind,
        name: String,
        path: PathBuf,
    },

    #[error("{kind} '{name}' is not installed")]
    NotInstalled { kind: ResourceKind, name: String },

    #[error("invalid template '{name}': {reason}")]
    InvalidTemplate { name: String, reason: String },

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("background scan failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl ResourceError {
    /// Suggestions attached to a [`ResourceError::NotFound`].
    #[must_use]
    pub fn suggestions(&self) -> &[String] {
        match self {
            Self::NotFound { suggestions, .. } => suggestions,
            _ => &[],
        }
    }
}

fn format_suggestions(suggestions: &[String]) -> String {
    if suggestions.is_empty() {
        String::new()
    } else {
        format!(" (did you mean: {}?)", suggestions.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_lists_suggestions() {
        let err = ResourceError::NotFound {
            kind: ResourceKind::Skill,
            name: "typescrpit".into(),
            suggestions: vec!["typescript-expert".into()],
        };
        assert_eq!(
            err.to_string(),
            "skill 'typescrpit' not found in catalog (did you mean: typescript-expert?)"
        );
        assert_eq!(err.suggestions(), ["typescript-expert".to_owned()]);
    }

    #[test]
    fn not_found_without_suggestions() {
        let err = ResourceError::NotFound {
            kind: ResourceKind::Persona,
            name: "zzz".into(),
            suggestions: Vec::new(),
        };
        assert_eq!(err.to_string(), "persona 'zzz' not found in catalog");
    }
}
