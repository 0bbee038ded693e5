//! External skill sources: a persisted list of git repositories, clone and
//! pull through the git CLI, skill discovery, and an index merge that keeps
//! manually curated catalog entries.

pub mod config;
pub mod copy;
mod error;
pub mod git;
pub mod merge;
pub mod scan;
pub mod sync;

pub use config::{AddSourceOptions, SourceConfig, SourceList};
pub use error::SourceError;
pub use git::Git;
pub use scan::ScannedSkill;
pub use sync::{
    PullAction, PullReport, SourceFailure, SourceInfo, SourceStatus, Synchronizer, SyncOptions,
    SyncReport,
};
