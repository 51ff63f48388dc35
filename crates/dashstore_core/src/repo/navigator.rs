//! Name-path resolution over stored document files.
//!
//! # Responsibility
//! - Turn `(file, row?, panel?)` name paths into child listings or nodes.
//! - Load and parse the addressed file fresh on every call.
//!
//! # Invariants
//! - Path depth is checked against the collection before any read.
//! - Returned inner nodes carry parent links up to their file root.
//! - A superfluous segment below a panel is reported as either "no sub-nodes"
//!   (the name is one of the row's panel names) or "no such panel" (it is not),
//!   never as not-found.

use crate::model::document::{Document, DocumentKind};
use crate::repo::layout::Collection;
use crate::repo::{RepoError, RepoResult};
use crate::storage::BlobStore;
use log::debug;

/// Read-only resolver of name paths inside one blob store.
pub struct PathNavigator<'s, S: BlobStore + ?Sized> {
    blobs: &'s S,
}

impl<'s, S: BlobStore + ?Sized> PathNavigator<'s, S> {
    pub fn new(blobs: &'s S) -> Self {
        Self { blobs }
    }

    /// Lists immediate children at `names` inside `collection`.
    ///
    /// With no names, returns the blob store listing of the directory as-is.
    ///
    /// # Errors
    /// - `RepoError::InvalidPath` for any name under a panel collection, for
    ///   paths deeper than the collection allows, and for a segment below a panel.
    /// - `RepoError::NotFound` when the file or an intermediate child is absent.
    pub fn list(&self, collection: &Collection, names: &[&str]) -> RepoResult<Vec<String>> {
        let Some((file, nested)) = names.split_first() else {
            return Ok(self.blobs.list_names(&collection.directory)?);
        };
        if collection.root_kind == DocumentKind::Panel {
            return Err(RepoError::InvalidPath(
                "Panels contain no sub-nodes".to_string(),
            ));
        }
        check_depth(collection, names)?;

        let mut node = self.load(collection, file)?;
        for name in nested {
            if node.kind() == DocumentKind::Row {
                return Err(panel_has_no_sub_nodes(&node, name));
            }
            node = node.child(name)?;
        }
        Ok(node.child_names()?)
    }

    /// Resolves `names` to a document node, or `None` when the file or a named
    /// child does not exist.
    ///
    /// # Errors
    /// - `RepoError::InvalidPath` for an empty or too deep path.
    /// - `RepoError::Document` / `RepoError::Fs` for unreadable files.
    pub fn find(&self, collection: &Collection, names: &[&str]) -> RepoResult<Option<Document>> {
        match self.get(collection, names) {
            Ok(document) => Ok(Some(document)),
            Err(RepoError::NotFound(_)) => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// Resolves `names` to a document node.
    ///
    /// # Errors
    /// - Same as `find`, plus `RepoError::NotFound` naming the missing file or child.
    pub fn get(&self, collection: &Collection, names: &[&str]) -> RepoResult<Document> {
        let Some((file, nested)) = names.split_first() else {
            return Err(RepoError::InvalidPath("Can not get directory".to_string()));
        };
        check_depth(collection, names)?;

        let mut node = self.load(collection, file)?;
        for name in nested {
            node = node.child(name)?;
        }
        Ok(node)
    }

    fn load(&self, collection: &Collection, file: &str) -> RepoResult<Document> {
        let source = self.blobs.read_blob(&collection.directory, file)?;
        let document = Document::parse(collection.root_kind, &source, Some(file))?;
        debug!(
            "event=document_load module=repo status=ok kind={} bytes={}",
            collection.root_kind.as_str(),
            source.len()
        );
        Ok(document)
    }
}

fn check_depth(collection: &Collection, names: &[&str]) -> RepoResult<()> {
    if names.len() > collection.max_depth() {
        return Err(RepoError::InvalidPath(format!(
            "Path is too deep: {}",
            names.join("/")
        )));
    }
    Ok(())
}

fn panel_has_no_sub_nodes(row: &Document, panel_name: &str) -> RepoError {
    match row.child_names() {
        Ok(names) if names.iter().any(|name| name == panel_name) => {
            RepoError::InvalidPath("Panel contains no sub-nodes".to_string())
        }
        Ok(_) => RepoError::InvalidPath(format!("There is no such panel: {panel_name}")),
        Err(err) => err.into(),
    }
}
