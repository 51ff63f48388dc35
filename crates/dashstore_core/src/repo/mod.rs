//! Directory layout and path resolution over stored documents.
//!
//! # Responsibility
//! - Describe where each category/kind lives on disk.
//! - Resolve name paths into listings or document nodes.
//!
//! # Invariants
//! - Structurally invalid paths are rejected before any file is read.
//! - "Not found" stays distinguishable from malformed sources and I/O failures.

use crate::model::document::DocumentError;
use crate::storage::FsError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod layout;
pub mod navigator;

pub type RepoResult<T> = Result<T, RepoError>;

/// Errors from path resolution.
#[derive(Debug)]
pub enum RepoError {
    /// Path shape is invalid for the addressed collection.
    InvalidPath(String),
    /// Addressed file or named child is absent.
    NotFound(String),
    /// Stored source could not be turned into a document.
    Document(DocumentError),
    /// Filesystem failure other than "not found".
    Fs(FsError),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidPath(message) => write!(f, "{message}"),
            Self::NotFound(message) => write!(f, "{message}"),
            Self::Document(err) => write!(f, "{err}"),
            Self::Fs(err) => write!(f, "{err}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Document(err) => Some(err),
            Self::Fs(err) => Some(err),
            Self::InvalidPath(_) => None,
            Self::NotFound(_) => None,
        }
    }
}

impl From<FsError> for RepoError {
    fn from(value: FsError) -> Self {
        match value {
            FsError::NotFound { name, .. } => {
                Self::NotFound(format!("There is no such file: {name}"))
            }
            FsError::InvalidName(name) => Self::InvalidPath(format!("Invalid name: {name:?}")),
            other => Self::Fs(other),
        }
    }
}

impl From<DocumentError> for RepoError {
    fn from(value: DocumentError) -> Self {
        match value {
            DocumentError::ChildNotFound { .. } => Self::NotFound(value.to_string()),
            DocumentError::NoSubNodes => Self::InvalidPath(value.to_string()),
            other => Self::Document(other),
        }
    }
}
