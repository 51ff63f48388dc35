//! Fixed on-disk layout of backups and templates.
//!
//! # Responsibility
//! - Name the valid categories and template kinds.
//! - Bind every directory to the document variant its files hold.
//! - Create the directory skeleton once, when the layout is constructed.

use crate::model::document::DocumentKind;
use crate::storage::{BlobStore, FsResult};
use log::info;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

pub const BACKUPS_DIR: &str = "backups";
pub const TEMPLATES_DIR: &str = "templates";

/// Top-level resource class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    /// Durable dashboard snapshots, one dashboard per file.
    Backup,
    /// Reusable building blocks, split by kind.
    Template,
}

impl Category {
    pub const ALL: [Self; 2] = [Self::Backup, Self::Template];

    /// Parses a category directory name (`backups` / `templates`).
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            BACKUPS_DIR => Some(Self::Backup),
            TEMPLATES_DIR => Some(Self::Template),
            _ => None,
        }
    }

    pub fn dir_name(self) -> &'static str {
        match self {
            Self::Backup => BACKUPS_DIR,
            Self::Template => TEMPLATES_DIR,
        }
    }
}

impl Display for Category {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.dir_name())
    }
}

/// Template sub-directory, bound one-to-one to a document variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Dashboards,
    Rows,
    Panels,
}

impl Kind {
    pub const ALL: [Self; 3] = [Self::Dashboards, Self::Rows, Self::Panels];

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "dashboards" => Some(Self::Dashboards),
            "rows" => Some(Self::Rows),
            "panels" => Some(Self::Panels),
            _ => None,
        }
    }

    pub fn dir_name(self) -> &'static str {
        match self {
            Self::Dashboards => "dashboards",
            Self::Rows => "rows",
            Self::Panels => "panels",
        }
    }

    /// Variant every file in this kind directory must hold.
    pub fn document_kind(self) -> DocumentKind {
        match self {
            Self::Dashboards => DocumentKind::Dashboard,
            Self::Rows => DocumentKind::Row,
            Self::Panels => DocumentKind::Panel,
        }
    }
}

impl Display for Kind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.dir_name())
    }
}

/// A directory whose files are all roots of one document variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collection {
    /// Directory relative to the data root.
    pub directory: PathBuf,
    /// Variant of every file stored directly in `directory`.
    pub root_kind: DocumentKind,
}

impl Collection {
    /// Longest name path this collection can address (file + nested children).
    pub fn max_depth(&self) -> usize {
        match self.root_kind {
            DocumentKind::Dashboard => 3,
            DocumentKind::Row => 2,
            DocumentKind::Panel => 1,
        }
    }
}

/// Relative directory layout below the data root.
#[derive(Debug, Clone)]
pub struct StoreLayout {
    backups: PathBuf,
    templates: PathBuf,
}

impl StoreLayout {
    /// Builds the layout and creates any missing directory.
    ///
    /// # Side effects
    /// - Creates the data root, `backups/`, `templates/` and one directory per kind.
    pub fn ensure<S: BlobStore + ?Sized>(blobs: &S) -> FsResult<Self> {
        let layout = Self {
            backups: PathBuf::from(BACKUPS_DIR),
            templates: PathBuf::from(TEMPLATES_DIR),
        };

        blobs.ensure(Path::new(""))?;
        blobs.ensure(&layout.backups)?;
        blobs.ensure(&layout.templates)?;
        for kind in Kind::ALL {
            blobs.ensure(&layout.kind_dir(kind))?;
        }

        info!("event=layout_ready module=repo status=ok");
        Ok(layout)
    }

    pub fn category_dir(&self, category: Category) -> &Path {
        match category {
            Category::Backup => &self.backups,
            Category::Template => &self.templates,
        }
    }

    pub fn kind_dir(&self, kind: Kind) -> PathBuf {
        self.templates.join(kind.dir_name())
    }

    /// Backup directory: flat dashboard files.
    pub fn backups(&self) -> Collection {
        Collection {
            directory: self.backups.clone(),
            root_kind: DocumentKind::Dashboard,
        }
    }

    /// Template directory of `kind`.
    pub fn templates(&self, kind: Kind) -> Collection {
        Collection {
            directory: self.kind_dir(kind),
            root_kind: kind.document_kind(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Category, Kind};
    use crate::model::document::DocumentKind;

    #[test]
    fn category_parse_accepts_only_directory_names() {
        assert_eq!(Category::parse("backups"), Some(Category::Backup));
        assert_eq!(Category::parse("templates"), Some(Category::Template));
        assert_eq!(Category::parse("Backups"), None);
        assert_eq!(Category::parse("remote"), None);
    }

    #[test]
    fn kind_binds_to_document_variant() {
        assert_eq!(Kind::Dashboards.document_kind(), DocumentKind::Dashboard);
        assert_eq!(Kind::Rows.document_kind(), DocumentKind::Row);
        assert_eq!(Kind::Panels.document_kind(), DocumentKind::Panel);
        assert_eq!(Kind::parse("widgets"), None);
    }
}
