//! Deleting duplicate copies.
//!
//! # Overview
//!
//! Every path is deleted independently. A failure (permission denied, file
//! already gone) is recorded for that path and the batch moves on. Nothing
//! is retried.
//!
//! Deletion is permanent by default; [`DeleteConfig::trash`] routes files
//! to the system recycle bin instead.
//!
//! # Example
//!
//! ```no_run
//! use dupsift::actions::delete::{delete_batch, DeleteConfig};
//! use std::path::PathBuf;
//!
//! let marked = vec![PathBuf::from("/tmp/copy-1"), PathBuf::from("/tmp/copy-2")];
//! let result = delete_batch(&marked, &DeleteConfig::permanent());
//! println!("{}", result.summary());
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Error type for deletion operations.
#[derive(Debug, Error)]
pub enum DeleteError {
    /// File was not found (may have been deleted or moved).
    #[error("file not found: {0}")]
    NotFound(PathBuf),

    /// Permission denied when attempting to delete.
    #[error("permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// Trash operation failed.
    #[error("trash operation failed for {path}: {message}")]
    TrashFailed {
        /// File that could not be trashed
        path: PathBuf,
        /// Message from the trash backend
        message: String,
    },

    /// Attempted to delete every copy of a group.
    #[error("cannot delete all copies - at least one file must be preserved")]
    AllCopiesWouldBeDeleted,

    /// General I/O error.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// File that could not be removed
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },
}

impl DeleteError {
    /// Get the path associated with this error (if any).
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::NotFound(p)
            | Self::PermissionDenied(p)
            | Self::TrashFailed { path: p, .. }
            | Self::Io { path: p, .. } => Some(p),
            Self::AllCopiesWouldBeDeleted => None,
        }
    }

    fn from_io(path: &Path, error: io::Error) -> Self {
        match error.kind() {
            io::ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            _ => Self::Io {
                path: path.to_path_buf(),
                source: error,
            },
        }
    }
}

/// A file that was removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteResult {
    /// Path that was deleted.
    pub path: PathBuf,
    /// Size of the deleted file in bytes.
    pub size: u64,
    /// Whether deletion was permanent (true) or to trash (false).
    pub permanent: bool,
}

/// Outcome of a batch, split into successes and per-path failures.
#[derive(Debug, Clone, Default)]
pub struct BatchDeleteResult {
    /// Successfully deleted files.
    pub successes: Vec<DeleteResult>,
    /// Failed deletions with their error messages.
    pub failures: Vec<(PathBuf, String)>,
    /// Total bytes freed.
    pub bytes_freed: u64,
}

impl BatchDeleteResult {
    /// Number of successful deletions.
    #[must_use]
    pub fn success_count(&self) -> usize {
        self.successes.len()
    }

    /// Number of failed deletions.
    #[must_use]
    pub fn failure_count(&self) -> usize {
        self.failures.len()
    }

    /// Check if all deletions succeeded.
    #[must_use]
    pub fn all_succeeded(&self) -> bool {
        self.failures.is_empty()
    }

    /// Paths that are gone after the batch.
    pub fn deleted_paths(&self) -> impl Iterator<Item = &Path> {
        self.successes.iter().map(|r| r.path.as_path())
    }

    /// Human-readable summary of the operation.
    #[must_use]
    pub fn summary(&self) -> String {
        if self.all_succeeded() {
            format!("Deleted {} file(s).", self.success_count())
        } else {
            format!(
                "Deleted {} file(s), {} failed.",
                self.success_count(),
                self.failure_count()
            )
        }
    }
}

/// How files are removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeleteConfig {
    /// Remove permanently instead of moving to the trash.
    pub permanent: bool,
}

impl Default for DeleteConfig {
    fn default() -> Self {
        Self::permanent()
    }
}

impl DeleteConfig {
    /// Move files to the system trash.
    #[must_use]
    pub fn trash() -> Self {
        Self { permanent: false }
    }

    /// Remove files permanently.
    #[must_use]
    pub fn permanent() -> Self {
        Self { permanent: true }
    }
}

/// Delete a single file.
///
/// # Errors
///
/// - `NotFound` if the file doesn't exist
/// - `PermissionDenied` if deletion is not allowed
/// - `TrashFailed` if the trash backend refuses the file
/// - `Io` for any other failure
pub fn delete_one(path: &Path, config: &DeleteConfig) -> Result<DeleteResult, DeleteError> {
    let metadata = fs::symlink_metadata(path).map_err(|e| DeleteError::from_io(path, e))?;
    let size = metadata.len();

    if config.permanent {
        fs::remove_file(path).map_err(|e| DeleteError::from_io(path, e))?;
        log::info!("Deleted: {} ({} bytes)", path.display(), size);
    } else {
        trash::delete(path).map_err(|e| DeleteError::TrashFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        log::info!("Moved to trash: {} ({} bytes)", path.display(), size);
    }

    Ok(DeleteResult {
        path: path.to_path_buf(),
        size,
        permanent: config.permanent,
    })
}

/// Delete every path, isolating failures per path.
#[must_use]
pub fn delete_batch(paths: &[PathBuf], config: &DeleteConfig) -> BatchDeleteResult {
    let mut result = BatchDeleteResult::default();

    for path in paths {
        match delete_one(path, config) {
            Ok(deleted) => {
                result.bytes_freed += deleted.size;
                result.successes.push(deleted);
            }
            Err(e) => {
                log::warn!("Failed to delete {}: {}", path.display(), e);
                result.failures.push((path.clone(), e.to_string()));
            }
        }
    }

    log::debug!(
        "Batch delete: {} succeeded, {} failed",
        result.success_count(),
        result.failure_count()
    );
    result
}

/// Check that deleting `to_delete` leaves at least one path of `group`.
///
/// # Errors
///
/// Returns `AllCopiesWouldBeDeleted` if every member of the group is listed.
pub fn validate_preserves_copy(
    group: &[PathBuf],
    to_delete: &[PathBuf],
) -> Result<(), DeleteError> {
    if group.is_empty() {
        return Ok(());
    }
    let survivor = group.iter().any(|p| !to_delete.contains(p));
    if survivor {
        Ok(())
    } else {
        Err(DeleteError::AllCopiesWouldBeDeleted)
    }
}
