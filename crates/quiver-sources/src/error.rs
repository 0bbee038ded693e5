use quiver_catalog::CatalogError;

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("source already exists: {0}")]
    DuplicateSource(String),

    #[error("source not found: {0}")]
    SourceNotFound(String),

    #[error("source '{0}' has no local clone; pull it first")]
    NotCloned(String),

    #[error("`{command}` failed: {stderr}")]
    ExternalProcessFailure { command: String, stderr: String },

    #[error("interrupted while running `{0}`")]
    Interrupted(String),

    #[error("invalid source URL: {0}")]
    InvalidUrl(String),

    #[error("invalid source name: {0}")]
    InvalidName(String),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn external_failure_keeps_stderr_verbatim() {
        let err = SourceError::ExternalProcessFailure {
            command: "git pull --ff-only".into(),
            stderr: "fatal: Not possible to fast-forward, aborting.".into(),
        };
        assert_eq!(
            err.to_string(),
            "`git pull --ff-only` failed: fatal: Not possible to fast-forward, aborting."
        );
    }

    #[test]
    fn catalog_error_is_transparent() {
        let err: SourceError = CatalogError::ReadOnly.into();
        assert_eq!(err.to_string(), CatalogError::ReadOnly.to_string());
    }
}
