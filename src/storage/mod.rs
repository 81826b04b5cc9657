//! Image storage module
//!
//! Owns the storage directory: creating it at startup, deriving the names
//! uploads are stored under, and moving bytes in and out of it.

mod naming;
mod store;

pub use naming::{is_flat_name, NameSource, NamingStrategy};
pub use store::{ImageStore, PendingUpload, StoredImage};

use std::fs::DirBuilder;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised while touching the storage directory
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage path {} exists but is not a directory", .path.display())]
    NotADirectory { path: PathBuf },
    #[error("failed to create storage directory {}: {source}", .path.display())]
    CreateDir { path: PathBuf, source: io::Error },
    #[error("{name:?} is not a valid filename in the storage directory")]
    InvalidName { name: String },
    #[error("failed to create {}: {source}", .path.display())]
    Create { path: PathBuf, source: io::Error },
    #[error("failed to write {}: {source}", .path.display())]
    Write { path: PathBuf, source: io::Error },
    #[error("failed to move upload into place at {}: {source}", .path.display())]
    Rename { path: PathBuf, source: io::Error },
    #[error("failed to read {}: {source}", .path.display())]
    Read { path: PathBuf, source: io::Error },
}

/// What `bootstrap` found on disk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapOutcome {
    /// The directory was already there, nothing was touched
    Existing,
    /// The directory (and any missing parents) was created
    Created,
}

/// Make sure the storage directory exists, creating it with permissive
/// access rights when missing.
pub fn bootstrap(dir: &Path) -> Result<BootstrapOutcome, StorageError> {
    match std::fs::metadata(dir) {
        Ok(meta) if meta.is_dir() => Ok(BootstrapOutcome::Existing),
        Ok(_) => Err(StorageError::NotADirectory {
            path: dir.to_path_buf(),
        }),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            let mut builder = DirBuilder::new();
            builder.recursive(true);
            #[cfg(unix)]
            {
                use std::os::unix::fs::DirBuilderExt;
                builder.mode(0o777);
            }
            builder
                .create(dir)
                .map_err(|source| StorageError::CreateDir {
                    path: dir.to_path_buf(),
                    source,
                })?;
            Ok(BootstrapOutcome::Created)
        }
        Err(source) => Err(StorageError::CreateDir {
            path: dir.to_path_buf(),
            source,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bootstrap_existing_directory_is_untouched() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("keep.png"), b"x").unwrap();

        assert_eq!(bootstrap(tmp.path()).unwrap(), BootstrapOutcome::Existing);
        assert!(tmp.path().join("keep.png").exists());
    }

    #[test]
    fn test_bootstrap_creates_missing_parents() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("a").join("b").join("images");

        assert_eq!(bootstrap(&dir).unwrap(), BootstrapOutcome::Created);
        assert!(dir.is_dir());
        assert_eq!(bootstrap(&dir).unwrap(), BootstrapOutcome::Existing);
    }

    #[test]
    fn test_bootstrap_rejects_regular_file() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("images");
        std::fs::write(&file, b"not a dir").unwrap();

        assert!(matches!(
            bootstrap(&file),
            Err(StorageError::NotADirectory { .. })
        ));
    }

    #[test]
    fn test_bootstrap_fails_below_a_file() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("blocker");
        std::fs::write(&file, b"x").unwrap();

        assert!(matches!(
            bootstrap(&file.join("images")),
            Err(StorageError::CreateDir { .. })
        ));
    }
}
