//! Raw blob storage under the configured data directory.
//!
//! # Responsibility
//! - Define the directory/blob contract the store needs from a filesystem.
//! - Report "not found" separately from transport (I/O) failures.
//!
//! # Invariants
//! - Directory arguments are relative to the adapter root.
//! - Blob names are single, non-hidden path components; anything else is
//!   rejected before I/O, so every stored blob shows up in listings.
//! - A write either fully replaces the named blob or leaves it untouched.

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

mod local;

pub use local::LocalBlobStore;

pub type FsResult<T> = Result<T, FsError>;

#[derive(Debug)]
pub enum FsError {
    /// Blob name is empty, hidden (leading `.`), or contains a separator or NUL.
    InvalidName(String),
    /// Named blob does not exist in the directory.
    NotFound { directory: PathBuf, name: String },
    /// Any other filesystem failure.
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl Display for FsError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidName(name) => write!(f, "invalid file name `{name}`"),
            Self::NotFound { directory, name } => {
                write!(f, "file `{name}` not found in `{}`", directory.display())
            }
            Self::Io { path, source } => write!(f, "I/O error at `{}`: {source}", path.display()),
        }
    }
}

impl Error for FsError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::InvalidName(_) => None,
            Self::NotFound { .. } => None,
        }
    }
}

/// Directory and blob operations over one rooted local namespace.
pub trait BlobStore {
    /// Creates `directory` (and missing ancestors) if absent.
    fn ensure(&self, directory: &Path) -> FsResult<()>;
    /// Entry names directly under `directory`, sorted; empty when absent.
    fn list_names(&self, directory: &Path) -> FsResult<Vec<String>>;
    /// Raw bytes of the named blob.
    fn read_blob(&self, directory: &Path, name: &str) -> FsResult<Vec<u8>>;
    /// Creates or replaces the named blob with exactly `bytes`.
    fn write_blob(&self, directory: &Path, name: &str, bytes: &[u8]) -> FsResult<()>;
    /// Deletes the named blob.
    fn remove_blob(&self, directory: &Path, name: &str) -> FsResult<()>;
}

/// Rejects names that would escape the target directory or be hidden from
/// `list_names`.
pub fn validate_name(name: &str) -> FsResult<()> {
    let invalid = name.is_empty() || name.starts_with('.') || name.contains(['/', '\\', '\0']);
    if invalid {
        return Err(FsError::InvalidName(name.to_string()));
    }
    Ok(())
}
