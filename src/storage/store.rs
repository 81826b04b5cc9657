//! Reading and writing blobs inside the storage directory.
//!
//! Uploads stream into a uniquely named temporary file next to their final
//! location and are renamed into place only once complete, so a concurrent
//! reader sees either the previous file or the whole new one.

use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tokio::fs::{self, File, OpenOptions};
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use super::naming::is_flat_name;
use super::StorageError;
use crate::logger;

const TEMP_PREFIX: &str = ".upload-";
const TEMP_SUFFIX: &str = ".part";

/// Handle on the storage directory
#[derive(Debug, Clone)]
pub struct ImageStore {
    dir: PathBuf,
}

/// A stored image loaded for serving
#[derive(Debug)]
pub struct StoredImage {
    pub path: PathBuf,
    pub content: Vec<u8>,
    pub modified: Option<SystemTime>,
}

impl StoredImage {
    pub fn extension(&self) -> Option<&str> {
        self.path.extension().and_then(|e| e.to_str())
    }
}

impl ImageStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Location of `name` in the storage directory, if it is a storable name
    pub fn path_for(&self, name: &str) -> Result<PathBuf, StorageError> {
        check_storable(name)?;
        Ok(self.dir.join(name))
    }

    /// Storage directory is present and is a directory
    pub async fn is_available(&self) -> bool {
        fs::metadata(&self.dir).await.is_ok_and(|m| m.is_dir())
    }

    /// Open a fresh temporary file to stream an upload into
    pub async fn begin_upload(&self) -> Result<PendingUpload, StorageError> {
        let temp_path = self
            .dir
            .join(format!("{TEMP_PREFIX}{}{TEMP_SUFFIX}", Uuid::new_v4().simple()));

        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&temp_path)
            .await
            .map_err(|source| StorageError::Create {
                path: temp_path.clone(),
                source,
            })?;

        Ok(PendingUpload {
            file: Some(file),
            temp_path,
            dir: self.dir.clone(),
            written: 0,
            finished: false,
        })
    }

    /// Load a stored image by name.
    ///
    /// Unstorable names, missing files, directories, in-flight temporary
    /// files and anything resolving outside the storage directory all come
    /// back as `Ok(None)`.
    pub async fn open(&self, name: &str) -> Result<Option<StoredImage>, StorageError> {
        let Ok(path) = self.path_for(name) else {
            return Ok(None);
        };

        let resolved = match fs::canonicalize(&path).await {
            Ok(p) => p,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(StorageError::Read { path, source }),
        };
        let root = fs::canonicalize(&self.dir)
            .await
            .map_err(|source| StorageError::Read {
                path: self.dir.clone(),
                source,
            })?;
        if !resolved.starts_with(&root) {
            logger::log_warning(&format!(
                "Path traversal attempt blocked: {name} -> {}",
                resolved.display()
            ));
            return Ok(None);
        }

        let meta = fs::metadata(&resolved)
            .await
            .map_err(|source| StorageError::Read {
                path: path.clone(),
                source,
            })?;
        if !meta.is_file() {
            return Ok(None);
        }

        let content = fs::read(&resolved)
            .await
            .map_err(|source| StorageError::Read {
                path: path.clone(),
                source,
            })?;

        Ok(Some(StoredImage {
            path,
            content,
            modified: meta.modified().ok(),
        }))
    }
}

/// In-flight upload files share the storage directory, so their name shape
/// is reserved
fn is_temp_name(name: &str) -> bool {
    name.starts_with(TEMP_PREFIX) && name.ends_with(TEMP_SUFFIX)
}

/// A name uploads may be stored under and retrieved by
fn check_storable(name: &str) -> Result<(), StorageError> {
    if !is_flat_name(name) || is_temp_name(name) {
        return Err(StorageError::InvalidName {
            name: name.to_string(),
        });
    }
    Ok(())
}

/// An upload being written to its temporary file.
///
/// Failures inside `write_chunk` and `commit` remove the temporary file
/// before returning. Dropping it without `commit` (cancelled request, or
/// the caller bailing out) deletes the file as well.
#[derive(Debug)]
pub struct PendingUpload {
    file: Option<File>,
    temp_path: PathBuf,
    dir: PathBuf,
    written: u64,
    finished: bool,
}

impl PendingUpload {
    pub async fn write_chunk(&mut self, chunk: &[u8]) -> Result<(), StorageError> {
        let Some(file) = self.file.as_mut() else {
            return Err(self.write_error(io::ErrorKind::BrokenPipe.into()));
        };
        if let Err(source) = file.write_all(chunk).await {
            self.discard().await;
            return Err(self.write_error(source));
        }
        self.written += chunk.len() as u64;
        Ok(())
    }

    pub const fn written(&self) -> u64 {
        self.written
    }

    /// Move the finished upload to `<dir>/<name>`, replacing any file there
    pub async fn commit(mut self, name: &str) -> Result<PathBuf, StorageError> {
        if let Err(e) = check_storable(name) {
            self.discard().await;
            return Err(e);
        }

        if let Some(mut file) = self.file.take() {
            if let Err(source) = file.flush().await {
                self.discard().await;
                return Err(self.write_error(source));
            }
        }

        let dest = self.dir.join(name);
        if let Err(source) = fs::rename(&self.temp_path, &dest).await {
            self.discard().await;
            return Err(StorageError::Rename { path: dest, source });
        }
        self.finished = true;
        Ok(dest)
    }

    /// Close and delete the temporary file; `Drop` then has nothing to do
    pub async fn discard(&mut self) {
        self.file.take();
        if let Err(e) = fs::remove_file(&self.temp_path).await {
            if e.kind() != io::ErrorKind::NotFound {
                logger::log_warning(&format!(
                    "Failed to remove temporary upload {}: {e}",
                    self.temp_path.display()
                ));
            }
        }
        self.finished = true;
    }

    fn write_error(&self, source: io::Error) -> StorageError {
        StorageError::Write {
            path: self.temp_path.clone(),
            source,
        }
    }
}

// Backstop for cancelled uploads, where no async cleanup can run
impl Drop for PendingUpload {
    fn drop(&mut self) {
        if !self.finished {
            self.file.take();
            if let Err(e) = std::fs::remove_file(&self.temp_path) {
                if e.kind() != io::ErrorKind::NotFound {
                    logger::log_warning(&format!(
                        "Failed to remove temporary upload {}: {e}",
                        self.temp_path.display()
                    ));
                }
            }
        }
    }
}
