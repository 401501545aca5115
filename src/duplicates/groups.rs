//! The duplicate set: one entry per distinct content shared by 2+ paths.
//!
//! # Example
//!
//! ```
//! use dupsift::duplicates::DuplicateGroup;
//! use dupsift::scanner::Digest;
//! use std::path::PathBuf;
//!
//! let group = DuplicateGroup::new(
//!     Digest::from_bytes([0; 32]),
//!     1024,
//!     vec![PathBuf::from("/a"), PathBuf::from("/b"), PathBuf::from("/c")],
//! );
//! assert_eq!(group.aggregate_bytes(), 3072);
//! assert_eq!(group.wasted_bytes(), 2048);
//! ```

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::scanner::Digest;

/// Paths sharing one full-content digest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateGroup {
    /// Full-content digest shared by every path
    pub digest: Digest,
    /// Byte length of each copy
    pub size: u64,
    /// Paths in encounter order
    pub paths: Vec<PathBuf>,
}

impl DuplicateGroup {
    /// Create a group.
    #[must_use]
    pub fn new(digest: Digest, size: u64, paths: Vec<PathBuf>) -> Self {
        Self {
            digest,
            size,
            paths,
        }
    }

    /// Number of copies.
    #[must_use]
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    /// `true` if the group holds no paths.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Bytes taken by all copies together.
    #[must_use]
    pub fn aggregate_bytes(&self) -> u64 {
        self.size.saturating_mul(self.paths.len() as u64)
    }

    /// Bytes reclaimable by keeping a single copy.
    #[must_use]
    pub fn wasted_bytes(&self) -> u64 {
        self.size
            .saturating_mul(self.paths.len().saturating_sub(1) as u64)
    }

    /// Hex rendering of the digest.
    #[must_use]
    pub fn digest_hex(&self) -> String {
        self.digest.to_hex()
    }

    /// Paths sorted lexicographically, for stable report output.
    #[must_use]
    pub fn sorted_paths(&self) -> Vec<&Path> {
        let mut paths: Vec<&Path> = self.paths.iter().map(PathBuf::as_path).collect();
        paths.sort();
        paths
    }
}

/// Rank groups by member count, then per-copy size, both descending.
///
/// Ties keep their original order. `top` of `None` keeps every group.
#[must_use]
pub fn rank_groups(groups: &[DuplicateGroup], top: Option<usize>) -> Vec<&DuplicateGroup> {
    let mut ranked: Vec<&DuplicateGroup> = groups.iter().collect();
    ranked.sort_by(|a, b| b.len().cmp(&a.len()).then(b.size.cmp(&a.size)));
    if let Some(limit) = top {
        ranked.truncate(limit);
    }
    ranked
}
