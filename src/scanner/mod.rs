//! File listing and per-path comparison keys.
//!
//! - [`walker`]: enumerates candidate files under one or more roots
//! - [`hasher`]: the three key extractors (size, partial digest, full digest)
//!
//! Both halves report unreadable or vanished files as [`AccessError`]
//! values. Callers drop the path and keep going; nothing here aborts a run.

pub mod hasher;
pub mod walker;

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

pub use hasher::{
    full_digest_key, partial_digest_key, size_key, Digest, HashAlgorithm, FULL_CHUNK_SIZE,
    PARTIAL_FALLBACK_SIZE,
};
pub use walker::{resolve_roots, Walker, WalkerConfig};

/// A file could not be read while listing or hashing it.
#[derive(thiserror::Error, Debug)]
pub enum AccessError {
    /// Permission was denied.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// The file disappeared after it was listed.
    #[error("File vanished: {0}")]
    Vanished(PathBuf),

    /// Any other I/O failure.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

impl AccessError {
    /// Classify an I/O error raised for `path`.
    #[must_use]
    pub fn from_io(path: &Path, error: std::io::Error) -> Self {
        match error.kind() {
            ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            ErrorKind::NotFound => Self::Vanished(path.to_path_buf()),
            _ => Self::Io {
                path: path.to_path_buf(),
                source: error,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_io_classifies_kinds() {
        let path = Path::new("/tmp/x");
        assert!(matches!(
            AccessError::from_io(path, std::io::Error::from(ErrorKind::NotFound)),
            AccessError::Vanished(_)
        ));
        assert!(matches!(
            AccessError::from_io(path, std::io::Error::from(ErrorKind::PermissionDenied)),
            AccessError::PermissionDenied(_)
        ));
        assert!(matches!(
            AccessError::from_io(path, std::io::Error::other("disk on fire")),
            AccessError::Io { .. }
        ));
    }

    #[test]
    fn test_display_names_path() {
        let err = AccessError::Vanished(PathBuf::from("/gone"));
        assert_eq!(err.to_string(), "File vanished: /gone");
    }
}
