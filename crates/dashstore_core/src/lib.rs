//! Core logic for dashstore: a local store of dashboard backups and templates.
//! This crate is the single source of truth for document tree invariants.

pub mod config;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod storage;

pub use config::{ConfigError, StoreConfig, CONFIG_ENV};
pub use logging::{default_log_level, init_logging, logging_status, LogSink};
pub use model::document::{Document, DocumentError, DocumentKind, DocumentResult};
pub use repo::layout::{Category, Collection, Kind, StoreLayout};
pub use repo::navigator::PathNavigator;
pub use repo::{RepoError, RepoResult};
pub use service::resource_store::{
    ResourceStore, SaveMode, SaveOutcome, StoreError, StoreResult,
};
pub use storage::{BlobStore, FsError, FsResult, LocalBlobStore};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
