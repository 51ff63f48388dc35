//! Backup / template resource store.
//!
//! # Responsibility
//! - Validate categories and template kinds before touching the filesystem.
//! - Route list/get to the path navigator with the right collection.
//! - Apply the merge-or-create write policy on save and the
//!   remove-child-or-delete policy on remove.
//!
//! # Invariants
//! - A save or remove writes or deletes exactly one file.
//! - A mutated inner node is persisted by rewriting its file root in full.
//! - A new (not merged) template must match the kind directory's variant;
//!   a new backup must be a dashboard.

use crate::config::StoreConfig;
use crate::model::document::{Document, DocumentError, DocumentKind};
use crate::repo::layout::{Category, Collection, Kind, StoreLayout};
use crate::repo::navigator::PathNavigator;
use crate::repo::RepoError;
use crate::storage::{BlobStore, FsError, LocalBlobStore};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;
use std::time::Instant;

pub type StoreResult<T> = Result<T, StoreError>;

/// Errors surfaced by resource store operations.
#[derive(Debug)]
pub enum StoreError {
    /// Unknown category/kind, invalid path shape, or a segment below a leaf.
    InvalidPath(String),
    /// Document variant does not fit the destination, or its source is malformed.
    InvalidDocument(String),
    /// Addressed file or named child is absent.
    DocumentNotFound(String),
    /// Filesystem failure other than "not found".
    Fs(FsError),
}

impl StoreError {
    /// Stable machine-readable error code.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidPath(_) => "invalid_path",
            Self::InvalidDocument(_) => "invalid_document",
            Self::DocumentNotFound(_) => "document_not_found",
            Self::Fs(_) => "io",
        }
    }
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidPath(message) => write!(f, "{message}"),
            Self::InvalidDocument(message) => write!(f, "{message}"),
            Self::DocumentNotFound(message) => write!(f, "{message}"),
            Self::Fs(err) => write!(f, "{err}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Fs(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for StoreError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::InvalidPath(message) => Self::InvalidPath(message),
            RepoError::NotFound(message) => Self::DocumentNotFound(message),
            RepoError::Document(err) => Self::InvalidDocument(err.to_string()),
            RepoError::Fs(err) => Self::Fs(err),
        }
    }
}

impl From<FsError> for StoreError {
    fn from(value: FsError) -> Self {
        RepoError::from(value).into()
    }
}

impl From<DocumentError> for StoreError {
    fn from(value: DocumentError) -> Self {
        RepoError::from(value).into()
    }
}

/// How a save reached the filesystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveMode {
    /// The document was new and written under its own name.
    Created,
    /// The document was merged into an existing one whose file was rewritten.
    Merged,
}

impl SaveMode {
    fn as_str(self) -> &'static str {
        match self {
            Self::Created => "create",
            Self::Merged => "merge",
        }
    }
}

/// Result of a successful save.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveOutcome {
    /// Name of the file that was written.
    pub file: String,
    pub mode: SaveMode,
}

/// Category-level entry point over one blob store.
pub struct ResourceStore<S: BlobStore> {
    blobs: S,
    layout: StoreLayout,
}

impl ResourceStore<LocalBlobStore> {
    /// Opens the store under `config.data_dir`, creating the layout if needed.
    pub fn open(config: &StoreConfig) -> StoreResult<Self> {
        Self::new(LocalBlobStore::new(config.data_dir.clone()))
    }
}

impl<S: BlobStore> ResourceStore<S> {
    /// Creates the store and ensures the directory layout exists.
    pub fn new(blobs: S) -> StoreResult<Self> {
        let layout = StoreLayout::ensure(&blobs)?;
        Ok(Self { blobs, layout })
    }

    pub fn blobs(&self) -> &S {
        &self.blobs
    }

    /// Lists entries at `category/segments...`.
    ///
    /// For templates the first segment is the kind; with no segments the kind
    /// directories themselves are listed.
    pub fn list(&self, category: &str, segments: &[&str]) -> StoreResult<Vec<String>> {
        let category = parse_category(category)?;
        if category == Category::Template && segments.is_empty() {
            return Ok(self
                .blobs
                .list_names(self.layout.category_dir(category))?);
        }
        let (collection, names) = self.route(category, segments)?;
        Ok(self.navigator().list(&collection, names)?)
    }

    /// Fetches the document node at `category/segments...`.
    pub fn get(&self, category: &str, segments: &[&str]) -> StoreResult<Document> {
        let category = parse_category(category)?;
        if segments.is_empty() {
            return Err(StoreError::InvalidPath("Can not get directory".to_string()));
        }
        let (collection, names) = self.route(category, segments)?;
        Ok(self.navigator().get(&collection, names)?)
    }

    /// Like `get`, but a missing file or child yields `Ok(None)`.
    pub fn find(&self, category: &str, segments: &[&str]) -> StoreResult<Option<Document>> {
        let category = parse_category(category)?;
        if segments.is_empty() {
            return Err(StoreError::InvalidPath("Can not get directory".to_string()));
        }
        let (collection, names) = self.route(category, segments)?;
        Ok(self.navigator().find(&collection, names)?)
    }

    /// Saves `document` at `category/segments...`.
    ///
    /// When a document already exists at the path, `document` is merged into
    /// it and the enclosing file is rewritten. Otherwise `document` must match
    /// the destination variant and is written under its own name.
    ///
    /// # Errors
    /// - `StoreError::InvalidPath` for unknown category/kind or bad path shape.
    /// - `StoreError::InvalidDocument` when the variant does not fit.
    pub fn save(
        &self,
        document: &Document,
        category: &str,
        segments: &[&str],
    ) -> StoreResult<SaveOutcome> {
        let started_at = Instant::now();
        let category = parse_category(category)?;
        let result = match category {
            Category::Backup => self.save_backup(document, segments),
            Category::Template => self.save_template(document, segments),
        };
        match &result {
            Ok(outcome) => info!(
                "event=store_save module=store status=ok category={} file={} mode={} duration_ms={}",
                category,
                outcome.file,
                outcome.mode.as_str(),
                started_at.elapsed().as_millis()
            ),
            Err(err) => log_failure("store_save", category, err, started_at),
        }
        result
    }

    /// Removes the document at `category/segments...`.
    ///
    /// Backups are deleted directly. A nested template row/panel is removed
    /// from its parent and the file root is rewritten; a template file root is
    /// deleted.
    pub fn remove(&self, category: &str, segments: &[&str]) -> StoreResult<()> {
        let started_at = Instant::now();
        let category = parse_category(category)?;
        let result = match category {
            Category::Backup => self.remove_backup(segments),
            Category::Template => self.remove_template(segments),
        };
        match &result {
            Ok(()) => info!(
                "event=store_remove module=store status=ok category={} depth={} duration_ms={}",
                category,
                segments.len(),
                started_at.elapsed().as_millis()
            ),
            Err(err) => log_failure("store_remove", category, err, started_at),
        }
        result
    }

    fn navigator(&self) -> PathNavigator<'_, S> {
        PathNavigator::new(&self.blobs)
    }

    fn route<'p, 'a>(
        &self,
        category: Category,
        segments: &'p [&'a str],
    ) -> StoreResult<(Collection, &'p [&'a str])> {
        match category {
            Category::Backup => Ok((self.layout.backups(), segments)),
            Category::Template => {
                let (kind, names) = parse_kind(segments)?;
                Ok((self.layout.templates(kind), names))
            }
        }
    }

    fn save_backup(&self, document: &Document, segments: &[&str]) -> StoreResult<SaveOutcome> {
        if segments.len() > 1 {
            return Err(StoreError::InvalidPath(format!(
                "Backups are flat dashboard files: {}",
                segments.join("/")
            )));
        }
        let collection = self.layout.backups();
        let existing = if segments.is_empty() {
            None
        } else {
            self.navigator().find(&collection, segments)?
        };

        match existing {
            Some(dashboard) => {
                dashboard.update(document)?;
                self.persist(&collection.directory, &dashboard, SaveMode::Merged)
            }
            None => {
                if document.kind() != DocumentKind::Dashboard {
                    return Err(StoreError::InvalidDocument(format!(
                        "Can not add {} as backup",
                        document.kind()
                    )));
                }
                self.persist(&collection.directory, document, SaveMode::Created)
            }
        }
    }

    fn save_template(&self, document: &Document, segments: &[&str]) -> StoreResult<SaveOutcome> {
        let (kind, names) = parse_kind(segments)?;
        let collection = self.layout.templates(kind);
        let existing = if names.is_empty() {
            None
        } else {
            self.navigator().find(&collection, names)?
        };

        match existing {
            Some(origin) => {
                origin.update(document)?;
                self.persist(&collection.directory, &origin.top(), SaveMode::Merged)
            }
            None => {
                if document.kind() != kind.document_kind() {
                    return Err(StoreError::InvalidDocument(format!(
                        "Can not add {} to {}",
                        document.kind(),
                        kind
                    )));
                }
                self.persist(&collection.directory, document, SaveMode::Created)
            }
        }
    }

    fn remove_backup(&self, segments: &[&str]) -> StoreResult<()> {
        match segments {
            [] => Err(StoreError::InvalidPath(
                "Can not remove directory".to_string(),
            )),
            [name] => Ok(self
                .blobs
                .remove_blob(self.layout.category_dir(Category::Backup), name)?),
            _ => Err(StoreError::InvalidPath(format!(
                "Backups are flat dashboard files: {}",
                segments.join("/")
            ))),
        }
    }

    fn remove_template(&self, segments: &[&str]) -> StoreResult<()> {
        let (kind, names) = parse_kind(segments)?;
        if names.is_empty() {
            return Err(StoreError::InvalidPath(
                "Can not remove directory".to_string(),
            ));
        }
        let collection = self.layout.templates(kind);
        let document = self.navigator().get(&collection, names)?;

        match document.parent() {
            Some(parent) => {
                parent.remove_child(&document.name())?;
                self.persist(&collection.directory, &parent.top(), SaveMode::Merged)?;
                Ok(())
            }
            None => Ok(self
                .blobs
                .remove_blob(&collection.directory, &document.name())?),
        }
    }

    fn persist(
        &self,
        directory: &Path,
        document: &Document,
        mode: SaveMode,
    ) -> StoreResult<SaveOutcome> {
        let file = document.name();
        if file.is_empty() {
            return Err(StoreError::InvalidDocument(format!(
                "Can not store unnamed {}",
                document.kind()
            )));
        }
        let source = document.source()?;
        self.blobs.write_blob(directory, &file, &source)?;
        Ok(SaveOutcome { file, mode })
    }
}

fn parse_category(value: &str) -> StoreResult<Category> {
    Category::parse(value)
        .ok_or_else(|| StoreError::InvalidPath(format!("Invalid local directory: {value}")))
}

fn parse_kind<'p, 'a>(segments: &'p [&'a str]) -> StoreResult<(Kind, &'p [&'a str])> {
    let Some((kind, names)) = segments.split_first() else {
        return Err(StoreError::InvalidPath(
            "Template directory is required".to_string(),
        ));
    };
    let kind = Kind::parse(kind)
        .ok_or_else(|| StoreError::InvalidPath(format!("Invalid template directory: {kind}")))?;
    Ok((kind, names))
}

fn log_failure(event: &str, category: Category, err: &StoreError, started_at: Instant) {
    warn!(
        "event={} module=store status=error category={} duration_ms={} error_code={} error={}",
        event,
        category,
        started_at.elapsed().as_millis(),
        err.kind(),
        err
    );
}
