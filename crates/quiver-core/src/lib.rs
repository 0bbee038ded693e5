//! Quiver configuration and bootstrap: loads settings, picks the catalog
//! backend once, and wires the per-kind resolvers and the source synchronizer.

pub mod bootstrap;
pub mod config;

pub use bootstrap::{App, resolve_config_path};
pub use config::{CatalogMode, Config};
