//! Review state over the duplicate set.
//!
//! # Overview
//!
//! [`ReviewModel`] owns the duplicate groups, the set of paths marked for
//! deletion and the current sort key. It enforces one invariant: in every
//! group the number of marked paths stays below the group size, so at
//! least one copy always survives a commit.
//!
//! # Example
//!
//! ```
//! use dupsift::duplicates::DuplicateGroup;
//! use dupsift::scanner::Digest;
//! use dupsift::tui::model::ReviewModel;
//! use std::path::{Path, PathBuf};
//!
//! let group = DuplicateGroup::new(
//!     Digest::from_bytes([0; 32]),
//!     10,
//!     vec![PathBuf::from("/a"), PathBuf::from("/b")],
//! );
//! let mut model = ReviewModel::new(vec![group]);
//!
//! assert!(model.toggle_mark(Path::new("/a")).is_ok());
//! assert!(model.toggle_mark(Path::new("/b")).is_err());
//! assert_eq!(model.marked_count(), 1);
//! ```

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use crate::actions::delete::{
    delete_batch, validate_preserves_copy, BatchDeleteResult, DeleteConfig,
};
use crate::duplicates::DuplicateGroup;

/// Message shown when the last unmarked copy of a group is targeted.
pub const LAST_COPY_MESSAGE: &str = "Cannot mark the last file in a group for deletion.";

/// Metric used to order groups, both descending.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortKey {
    /// Bytes taken by all copies of the group
    #[default]
    Size,
    /// Number of copies
    Count,
}

impl SortKey {
    /// The other key.
    #[must_use]
    pub fn toggled(self) -> Self {
        match self {
            Self::Size => Self::Count,
            Self::Count => Self::Size,
        }
    }

    /// Label for the header.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Size => "size",
            Self::Count => "count",
        }
    }
}

/// Why a mark was refused.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MarkError {
    /// Marking would leave the group without a surviving copy.
    #[error("Cannot mark the last file in a group for deletion.")]
    LastCopy(PathBuf),

    /// The path is not part of any group.
    #[error("Not a duplicate: {0}")]
    UnknownPath(PathBuf),
}

/// What a commit did.
#[derive(Debug, Clone, Default)]
pub struct CommitReport {
    /// Per-path deletion results
    pub result: BatchDeleteResult,
    /// Groups dropped because fewer than two copies remained
    pub groups_removed: usize,
}

/// Groups, marks and sort order.
#[derive(Debug, Clone, Default)]
pub struct ReviewModel {
    groups: Vec<DuplicateGroup>,
    owner: HashMap<PathBuf, usize>,
    marked: HashSet<PathBuf>,
    sort: SortKey,
}

impl ReviewModel {
    /// Start reviewing `groups`. Insertion order is the tie-breaker for sorting.
    #[must_use]
    pub fn new(groups: Vec<DuplicateGroup>) -> Self {
        let mut model = Self {
            groups,
            ..Self::default()
        };
        model.reindex();
        model
    }

    fn reindex(&mut self) {
        self.owner = self
            .groups
            .iter()
            .enumerate()
            .flat_map(|(index, group)| group.paths.iter().map(move |p| (p.clone(), index)))
            .collect();
    }

    /// Groups in insertion order.
    #[must_use]
    pub fn groups(&self) -> &[DuplicateGroup] {
        &self.groups
    }

    /// Group at `index` in insertion order.
    #[must_use]
    pub fn group(&self, index: usize) -> Option<&DuplicateGroup> {
        self.groups.get(index)
    }

    /// Index of the group containing `path`.
    #[must_use]
    pub fn group_of(&self, path: &Path) -> Option<usize> {
        self.owner.get(path).copied()
    }

    /// Current sort key.
    #[must_use]
    pub fn sort_key(&self) -> SortKey {
        self.sort
    }

    /// Switch between size and count ordering.
    pub fn toggle_sort(&mut self) {
        self.sort = self.sort.toggled();
    }

    /// `true` if `path` is marked for deletion.
    #[must_use]
    pub fn is_marked(&self, path: &Path) -> bool {
        self.marked.contains(path)
    }

    /// Number of marked paths.
    #[must_use]
    pub fn marked_count(&self) -> usize {
        self.marked.len()
    }

    /// Bytes the marked paths take.
    #[must_use]
    pub fn marked_bytes(&self) -> u64 {
        self.marked
            .iter()
            .filter_map(|p| self.group_of(p))
            .map(|index| self.groups[index].size)
            .sum()
    }

    /// Marked paths in group order, then path order within the group.
    #[must_use]
    pub fn marked_paths(&self) -> Vec<PathBuf> {
        self.groups
            .iter()
            .flat_map(|g| g.paths.iter())
            .filter(|p| self.marked.contains(*p))
            .cloned()
            .collect()
    }

    /// Marked members of group `index`.
    #[must_use]
    pub fn marked_in_group(&self, index: usize) -> usize {
        self.groups
            .get(index)
            .map_or(0, |g| g.paths.iter().filter(|p| self.marked.contains(*p)).count())
    }

    /// Flip the mark on `path`.
    ///
    /// Returns the new state (`true` = marked).
    ///
    /// # Errors
    ///
    /// [`MarkError::LastCopy`] if marking would leave its group with no
    /// unmarked copy; the marked set is unchanged.
    pub fn toggle_mark(&mut self, path: &Path) -> Result<bool, MarkError> {
        let index = self
            .group_of(path)
            .ok_or_else(|| MarkError::UnknownPath(path.to_path_buf()))?;

        if self.marked.remove(path) {
            return Ok(false);
        }
        if self.marked_in_group(index) + 1 >= self.groups[index].len() {
            return Err(MarkError::LastCopy(path.to_path_buf()));
        }
        self.marked.insert(path.to_path_buf());
        Ok(true)
    }

    /// Group indices ordered by `by`, descending, ties in insertion order.
    #[must_use]
    pub fn sorted_indices(&self, by: SortKey) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.groups.len()).collect();
        match by {
            SortKey::Size => order.sort_by(|&a, &b| {
                self.groups[b]
                    .aggregate_bytes()
                    .cmp(&self.groups[a].aggregate_bytes())
            }),
            SortKey::Count => {
                order.sort_by(|&a, &b| self.groups[b].len().cmp(&self.groups[a].len()));
            }
        }
        order
    }

    /// Groups ordered by `by`.
    #[must_use]
    pub fn sorted_groups(&self, by: SortKey) -> Vec<&DuplicateGroup> {
        self.sorted_indices(by)
            .into_iter()
            .map(|index| &self.groups[index])
            .collect()
    }

    /// Delete every marked path and rebuild the duplicate set.
    ///
    /// Each deletion is independent; failures are reported per path.
    /// Afterwards paths that no longer exist are dropped from their group,
    /// groups left with fewer than two paths are removed, and the marked
    /// set is cleared.
    pub fn commit(&mut self, config: &DeleteConfig) -> CommitReport {
        let mut to_delete = Vec::with_capacity(self.marked.len());
        for group in &self.groups {
            let marked: Vec<PathBuf> = group
                .paths
                .iter()
                .filter(|p| self.marked.contains(*p))
                .cloned()
                .collect();
            if let Err(e) = validate_preserves_copy(&group.paths, &marked) {
                log::error!("Skipping group {}: {}", group.digest_hex(), e);
                continue;
            }
            to_delete.extend(marked);
        }

        let result = delete_batch(&to_delete, config);

        let mut gone: HashSet<&Path> = result.deleted_paths().collect();
        for (path, _) in &result.failures {
            if !path.exists() {
                gone.insert(path.as_path());
            }
        }

        let before = self.groups.len();
        for group in &mut self.groups {
            group.paths.retain(|p| !gone.contains(p.as_path()));
        }
        self.groups.retain(|g| g.len() >= 2);
        let groups_removed = before - self.groups.len();

        self.marked.clear();
        self.reindex();

        log::info!(
            "Commit: {} deleted, {} failed, {} groups resolved",
            result.success_count(),
            result.failure_count(),
            groups_removed
        );

        CommitReport {
            result,
            groups_removed,
        }
    }
}
