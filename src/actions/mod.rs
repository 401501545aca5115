//! Filesystem side effects on the duplicate set.
//!
//! - [`delete`]: per-path deletion, permanent or to the OS trash, with
//!   failures isolated to the path that failed
//! - [`plan`]: the non-interactive "keep the newest copy" plan

pub mod delete;
pub mod plan;

pub use delete::{
    delete_batch, delete_one, validate_preserves_copy, BatchDeleteResult, DeleteConfig,
    DeleteError, DeleteResult,
};
pub use plan::{keep_newest, DeletionPlan, PlannedGroup};
