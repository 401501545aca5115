//! Progressive duplicate detection.
//!
//! - [`stage`]: one group-and-narrow pass over a candidate set
//! - [`finder`]: the size, partial digest and full digest pipeline
//! - [`groups`]: the resulting duplicate set

pub mod finder;
pub mod groups;
pub mod stage;

pub use finder::{
    default_io_threads, find_in_roots, Completeness, DuplicatePipeline, FinderError, Method,
    PipelineConfig, PipelineResult, StageSummary,
};
pub use groups::{rank_groups, DuplicateGroup};
pub use stage::{StageOutcome, StageRunner, StageSpec, StageStats};
