//! Candidate file listing using jwalk.
//!
//! # Overview
//!
//! [`Walker`] yields absolute paths of regular files under one or more
//! roots. Symlinks are never followed or yielded. Hidden entries and files
//! below the minimum size are filtered here, so the pipeline only sees
//! real candidates. A path reachable from two overlapping roots is yielded
//! once.
//!
//! Per-entry failures come out as `Err(AccessError)` items and the walk
//! continues past them.
//!
//! # Example
//!
//! ```no_run
//! use dupsift::scanner::{resolve_roots, Walker, WalkerConfig};
//! use std::path::PathBuf;
//!
//! let roots = resolve_roots(&[PathBuf::from(".")]).unwrap();
//! let walker = Walker::new(roots, WalkerConfig::default());
//! for entry in walker.walk() {
//!     match entry {
//!         Ok(path) => println!("{}", path.display()),
//!         Err(e) => eprintln!("Warning: {e}"),
//!     }
//! }
//! ```

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use jwalk::WalkDir;

use super::AccessError;
use crate::error::FatalError;

/// Filtering policy for the walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkerConfig {
    /// Descend into and yield entries whose name starts with `.`.
    pub include_hidden: bool,
    /// Files smaller than this are skipped. `0` keeps empty files.
    pub min_size: u64,
}

impl Default for WalkerConfig {
    fn default() -> Self {
        Self {
            include_hidden: false,
            min_size: 1,
        }
    }
}

impl WalkerConfig {
    /// Include hidden files and directories.
    #[must_use]
    pub fn with_hidden(mut self, include_hidden: bool) -> Self {
        self.include_hidden = include_hidden;
        self
    }

    /// Set the minimum file size in bytes.
    #[must_use]
    pub fn with_min_size(mut self, min_size: u64) -> Self {
        self.min_size = min_size;
        self
    }
}

/// Validate and canonicalize the requested roots.
///
/// This is the only fatal check in a scan: a missing root or a root that is
/// not a directory stops the run before any listing happens.
///
/// # Errors
///
/// Returns a [`FatalError`] for the first root that is missing, not a
/// directory, or cannot be resolved.
pub fn resolve_roots(paths: &[PathBuf]) -> Result<Vec<PathBuf>, FatalError> {
    let mut roots = Vec::with_capacity(paths.len());
    for path in paths {
        let canonical = path.canonicalize().map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                FatalError::RootNotFound(path.clone())
            } else {
                FatalError::RootInaccessible {
                    path: path.clone(),
                    source,
                }
            }
        })?;
        if !canonical.is_dir() {
            return Err(FatalError::RootNotDirectory(path.clone()));
        }
        if !roots.contains(&canonical) {
            roots.push(canonical);
        }
    }
    Ok(roots)
}

/// Lazy, restartable listing of candidate files.
#[derive(Debug, Clone)]
pub struct Walker {
    roots: Vec<PathBuf>,
    config: WalkerConfig,
}

impl Walker {
    /// Create a walker over already resolved roots.
    #[must_use]
    pub fn new(roots: Vec<PathBuf>, config: WalkerConfig) -> Self {
        Self { roots, config }
    }

    /// The roots this walker lists.
    #[must_use]
    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    /// Walk every root in order, children sorted by name.
    ///
    /// Each call starts a fresh traversal.
    pub fn walk(&self) -> impl Iterator<Item = Result<PathBuf, AccessError>> + '_ {
        let mut seen = HashSet::new();
        self.roots
            .iter()
            .flat_map(move |root| self.walk_root(root))
            .filter(move |item| match item {
                Ok(path) => seen.insert(path.clone()),
                Err(_) => true,
            })
    }

    fn walk_root<'a>(
        &'a self,
        root: &'a Path,
    ) -> impl Iterator<Item = Result<PathBuf, AccessError>> + 'a {
        let walk_dir = WalkDir::new(root)
            .follow_links(false)
            .skip_hidden(!self.config.include_hidden)
            .sort(true);

        walk_dir
            .into_iter()
            .filter_map(move |entry| match entry {
                Ok(entry) => {
                    let file_type = entry.file_type();
                    if file_type.is_dir() {
                        return None;
                    }
                    let path = entry.path();
                    if file_type.is_symlink() {
                        log::trace!("Skipping symlink: {}", path.display());
                        return None;
                    }
                    self.admit(path)
                }
                Err(e) => {
                    let path = e.path().map_or_else(|| root.to_path_buf(), Path::to_path_buf);
                    log::debug!("Walker error for {}: {}", path.display(), e);
                    let source = e
                        .into_io_error()
                        .unwrap_or_else(|| std::io::Error::other("directory loop"));
                    Some(Err(AccessError::from_io(&path, source)))
                }
            })
    }

    /// Apply the size policy to one listed file.
    fn admit(&self, path: PathBuf) -> Option<Result<PathBuf, AccessError>> {
        let metadata = match std::fs::symlink_metadata(&path) {
            Ok(meta) => meta,
            Err(e) => return Some(Err(AccessError::from_io(&path, e))),
        };
        if !metadata.is_file() {
            return None;
        }
        if metadata.len() < self.config.min_size {
            log::trace!(
                "Skipping file below minimum size ({}): {}",
                metadata.len(),
                path.display()
            );
            return None;
        }
        Some(Ok(path))
    }
}
