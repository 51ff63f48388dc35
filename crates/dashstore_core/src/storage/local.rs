//! Local filesystem implementation of `BlobStore`.
//!
//! # Responsibility
//! - Map relative directories and blob names onto paths below one root.
//! - Replace blobs through a hidden temp file plus rename.
//!
//! # Invariants
//! - Hidden entries (leading `.`) never appear in listings.
//! - A failed write leaves the previous blob content in place.

use super::{validate_name, BlobStore, FsError, FsResult};
use log::{debug, error};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Instant;

const TEMP_PREFIX: &str = ".";
const TEMP_SUFFIX: &str = ".partial";

/// Blob store rooted at a local data directory.
#[derive(Debug, Clone)]
pub struct LocalBlobStore {
    root: PathBuf,
}

impl LocalBlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn blob_path(&self, directory: &Path, name: &str) -> FsResult<PathBuf> {
        validate_name(name)?;
        Ok(self.root.join(directory).join(name))
    }
}

impl BlobStore for LocalBlobStore {
    fn ensure(&self, directory: &Path) -> FsResult<()> {
        let path = self.root.join(directory);
        fs::create_dir_all(&path).map_err(|source| FsError::Io { path, source })
    }

    fn list_names(&self, directory: &Path) -> FsResult<Vec<String>> {
        let path = self.root.join(directory);
        let entries = match fs::read_dir(&path) {
            Ok(entries) => entries,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => return Err(FsError::Io { path, source }),
        };

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| FsError::Io {
                path: path.clone(),
                source,
            })?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if !name.starts_with(TEMP_PREFIX) {
                names.push(name);
            }
        }
        names.sort();
        Ok(names)
    }

    fn read_blob(&self, directory: &Path, name: &str) -> FsResult<Vec<u8>> {
        let path = self.blob_path(directory, name)?;
        match fs::read(&path) {
            Ok(bytes) => Ok(bytes),
            Err(err) if err.kind() == ErrorKind::NotFound => Err(FsError::NotFound {
                directory: directory.to_path_buf(),
                name: name.to_string(),
            }),
            Err(source) => Err(FsError::Io { path, source }),
        }
    }

    fn write_blob(&self, directory: &Path, name: &str, bytes: &[u8]) -> FsResult<()> {
        let started_at = Instant::now();
        let target = self.blob_path(directory, name)?;
        let partial = self
            .root
            .join(directory)
            .join(format!("{TEMP_PREFIX}{name}{TEMP_SUFFIX}"));

        let result = fs::write(&partial, bytes)
            .map_err(|source| FsError::Io {
                path: partial.clone(),
                source,
            })
            .and_then(|()| {
                fs::rename(&partial, &target).map_err(|source| FsError::Io {
                    path: target.clone(),
                    source,
                })
            });

        match &result {
            Ok(()) => debug!(
                "event=blob_write module=storage status=ok file={} bytes={} duration_ms={}",
                name,
                bytes.len(),
                started_at.elapsed().as_millis()
            ),
            Err(err) => {
                let _ = fs::remove_file(&partial);
                error!(
                    "event=blob_write module=storage status=error file={} duration_ms={} error={}",
                    name,
                    started_at.elapsed().as_millis(),
                    err
                );
            }
        }
        result
    }

    fn remove_blob(&self, directory: &Path, name: &str) -> FsResult<()> {
        let path = self.blob_path(directory, name)?;
        match fs::remove_file(&path) {
            Ok(()) => {
                debug!("event=blob_remove module=storage status=ok file={name}");
                Ok(())
            }
            Err(err) if err.kind() == ErrorKind::NotFound => Err(FsError::NotFound {
                directory: directory.to_path_buf(),
                name: name.to_string(),
            }),
            Err(source) => Err(FsError::Io { path, source }),
        }
    }
}
