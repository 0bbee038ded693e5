#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("template not found: {0}")]
    TemplateNotFound(String),

    #[error("template is not valid UTF-8: {0}")]
    NotUtf8(String),

    #[error("catalog is read-only (embedded dataset)")]
    ReadOnly,
}
