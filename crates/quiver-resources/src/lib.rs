//! Layered resource resolution: bundled catalog, project scope, global scope.

mod error;
pub mod frontmatter;
pub mod resolver;
pub mod resource;
pub mod shape;
pub mod skill;
pub mod store;
pub mod suggest;

pub use error::ResourceError;
pub use frontmatter::{Header, ParsedTemplate, parse_template};
pub use resolver::{
    AddOptions, AddOutcome, DependencyOutcome, ListOptions, Listing, RemoveOptions, Resolver,
    ResourceInfo,
};
pub use resource::{Resource, ResourceDetails, Scope, ValidationRules};
pub use store::ResourceStore;

pub use quiver_catalog::ResourceKind;
