//! Template catalog: manifest indexes and template content, read from a live
//! directory tree or from a dataset embedded in the binary.

pub mod backend;
pub mod catalog;
mod error;
pub mod kind;
pub mod manifest;

pub use backend::{CatalogBackend, DiskBackend, EmbeddedBackend};
pub use catalog::{Catalog, UNCATEGORIZED};
pub use error::CatalogError;
pub use kind::ResourceKind;
pub use manifest::{INDEX_FILE, MANIFEST_VERSION, ResourceManifest, ResourceManifestEntry};

/// Fixed filename of the manifest inside every skill directory.
pub const SKILL_MANIFEST_FILE: &str = "SKILL.md";
