//! Non-interactive deletion plan: keep the newest copy of every group.

use std::fs;
use std::path::PathBuf;
use std::time::SystemTime;

use super::delete::{delete_batch, validate_preserves_copy, BatchDeleteResult, DeleteConfig};
use crate::duplicates::DuplicateGroup;

/// Survivor and victims of one group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedGroup {
    /// Most recently modified copy
    pub keep: PathBuf,
    /// Every other readable copy
    pub delete: Vec<PathBuf>,
}

/// Deletions planned across the whole duplicate set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeletionPlan {
    /// One entry per group that had at least two readable copies
    pub groups: Vec<PlannedGroup>,
}

impl DeletionPlan {
    /// Number of files the plan would remove.
    #[must_use]
    pub fn delete_count(&self) -> usize {
        self.groups.iter().map(|g| g.delete.len()).sum()
    }

    /// Run the plan, one path at a time.
    #[must_use]
    pub fn execute(&self, config: &DeleteConfig) -> BatchDeleteResult {
        let mut total = BatchDeleteResult::default();
        for group in &self.groups {
            let mut members = group.delete.clone();
            members.push(group.keep.clone());
            if let Err(e) = validate_preserves_copy(&members, &group.delete) {
                log::error!("Refusing to delete group kept by {}: {}", group.keep.display(), e);
                continue;
            }
            let result = delete_batch(&group.delete, config);
            total.bytes_freed += result.bytes_freed;
            total.successes.extend(result.successes);
            total.failures.extend(result.failures);
        }
        total
    }
}

/// Plan to keep the newest copy (by modification time) of each group.
///
/// Copies whose metadata cannot be read are left alone. Ties keep the
/// copy listed first.
#[must_use]
pub fn keep_newest(groups: &[DuplicateGroup]) -> DeletionPlan {
    let mut plan = DeletionPlan::default();

    for group in groups {
        let mut dated: Vec<(PathBuf, SystemTime)> = Vec::with_capacity(group.len());
        for path in &group.paths {
            match fs::metadata(path).and_then(|m| m.modified()) {
                Ok(mtime) => dated.push((path.clone(), mtime)),
                Err(e) => log::warn!("Leaving {} in place: {}", path.display(), e),
            }
        }
        if dated.len() < 2 {
            continue;
        }

        let newest = dated
            .iter()
            .enumerate()
            .fold(0, |best, (i, (_, mtime))| if *mtime > dated[best].1 { i } else { best });
        let keep = dated.remove(newest).0;
        plan.groups.push(PlannedGroup {
            keep,
            delete: dated.into_iter().map(|(path, _)| path).collect(),
        });
    }

    plan
}
