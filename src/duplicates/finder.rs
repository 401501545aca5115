//! The staged duplicate pipeline.
//!
//! # Overview
//!
//! Candidates flow through up to three [`StageRunner`] passes:
//!
//! 1. **By Size** - sequential, cheapest
//! 2. **By Partial Hash** - digest of the first block (skipped with
//!    [`Method::Thorough`])
//! 3. **By Full Hash** - whole-file digest, always uncapped
//!
//! The digest stages run on a bounded rayon pool of `io_threads` workers.
//!
//! In fast mode the earlier stages keep only their largest groups: `top²`
//! after the size stage and `top·2` after the partial stage. The result is
//! then a lower bound. Every reported group is a true duplicate group, but
//! smaller groups may have been dropped on the way.
//!
//! The shutdown flag is only consulted between stages.
//!
//! # Example
//!
//! ```no_run
//! use dupsift::duplicates::{find_in_roots, PipelineConfig};
//! use dupsift::progress::SilentSink;
//! use dupsift::scanner::WalkerConfig;
//! use std::path::PathBuf;
//!
//! let config = PipelineConfig::default().with_fast(true).with_top(Some(5));
//! let result = find_in_roots(
//!     &[PathBuf::from(".")],
//!     WalkerConfig::default(),
//!     config,
//!     &mut SilentSink,
//! )?;
//! println!("{} groups (lower bound: {})", result.groups.len(), result.is_lower_bound());
//! # Ok::<(), dupsift::duplicates::FinderError>(())
//! ```

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rayon::ThreadPool;
use serde::{Deserialize, Serialize};

use super::groups::{rank_groups, DuplicateGroup};
use super::stage::{StageOutcome, StageRunner, StageSpec, StageStats};
use crate::error::{ExitCode, FatalError};
use crate::progress::ProgressSink;
use crate::scanner::{
    full_digest_key, partial_digest_key, resolve_roots, size_key, HashAlgorithm, Walker,
    WalkerConfig,
};

/// Progress label of the size stage.
pub const SIZE_STAGE: &str = "By Size";
/// Progress label of the partial digest stage.
pub const PARTIAL_STAGE: &str = "By Partial Hash";
/// Progress label of the full digest stage.
pub const FULL_STAGE: &str = "By Full Hash";

/// Which stages run between size and full digest.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Method {
    /// Insert the partial digest pre-filter
    #[default]
    Prefilter,
    /// Go straight from size to full digest
    Thorough,
}

/// Whether the duplicate set is known to be complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Completeness {
    /// No stage was capped
    Exhaustive,
    /// Fast-mode caps were in effect; more duplicates may exist
    LowerBound,
}

/// Pipeline tuning.
#[derive(Clone)]
pub struct PipelineConfig {
    /// Result count targeted by fast mode. `None` means unlimited.
    pub top: Option<usize>,
    /// Cap intermediate stages
    pub fast: bool,
    /// Stage selection
    pub method: Method,
    /// Digest used by both digest stages
    pub algorithm: HashAlgorithm,
    /// Workers for the digest stages
    pub io_threads: usize,
    /// Checked between stages
    pub shutdown_flag: Option<Arc<AtomicBool>>,
}

impl std::fmt::Debug for PipelineConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineConfig")
            .field("top", &self.top)
            .field("fast", &self.fast)
            .field("method", &self.method)
            .field("algorithm", &self.algorithm)
            .field("io_threads", &self.io_threads)
            .field("shutdown_flag", &self.shutdown_flag.is_some())
            .finish()
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            top: Some(3),
            fast: false,
            method: Method::default(),
            algorithm: HashAlgorithm::default(),
            io_threads: default_io_threads(),
            shutdown_flag: None,
        }
    }
}

/// Worker count bounded by available CPU parallelism.
#[must_use]
pub fn default_io_threads() -> usize {
    std::thread::available_parallelism().map_or(4, std::num::NonZeroUsize::get)
}

impl PipelineConfig {
    /// Set the result count. `Some(0)` is treated as unlimited.
    #[must_use]
    pub fn with_top(mut self, top: Option<usize>) -> Self {
        self.top = top.filter(|&n| n > 0);
        self
    }

    /// Enable the fast-mode caps.
    #[must_use]
    pub fn with_fast(mut self, fast: bool) -> Self {
        self.fast = fast;
        self
    }

    /// Choose the stage sequence.
    #[must_use]
    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Choose the digest algorithm.
    #[must_use]
    pub fn with_algorithm(mut self, algorithm: HashAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Set the number of hashing workers (at least 1).
    #[must_use]
    pub fn with_io_threads(mut self, threads: usize) -> Self {
        self.io_threads = threads.max(1);
        self
    }

    /// Set the shutdown flag.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// Keep-cap after the size stage.
    #[must_use]
    pub fn size_cap(&self) -> Option<usize> {
        self.top
            .filter(|_| self.fast)
            .map(|n| n.saturating_mul(n))
    }

    /// Keep-cap after the partial digest stage.
    #[must_use]
    pub fn partial_cap(&self) -> Option<usize> {
        self.top
            .filter(|_| self.fast)
            .map(|n| n.saturating_mul(2))
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }
}

/// Errors that stop a pipeline run.
#[derive(Debug, thiserror::Error)]
pub enum FinderError {
    /// Ctrl+C was received between stages.
    #[error("Interrupted by user")]
    Interrupted,

    /// The hashing pool could not be created.
    #[error("Failed to build hashing thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    /// A root failed validation.
    #[error(transparent)]
    Fatal(#[from] FatalError),
}

impl FinderError {
    /// Exit code matching this error.
    #[must_use]
    pub fn exit_code(&self) -> ExitCode {
        match self {
            Self::Interrupted => ExitCode::Interrupted,
            _ => ExitCode::GeneralError,
        }
    }
}

/// Counters of one finished stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageSummary {
    /// Progress label
    pub name: &'static str,
    /// Counters before the cap
    pub stats: StageStats,
    /// Groups handed to the next stage
    pub kept_groups: usize,
    /// Groups dropped by the cap
    pub capped_groups: usize,
}

impl StageSummary {
    fn of<K>(name: &'static str, outcome: &StageOutcome<K>) -> Self {
        Self {
            name,
            stats: outcome.stats,
            kept_groups: outcome.groups.len(),
            capped_groups: outcome.capped_groups,
        }
    }
}

/// The duplicate set plus run diagnostics.
#[derive(Debug, Clone)]
pub struct PipelineResult {
    /// Full-digest groups in encounter order
    pub groups: Vec<DuplicateGroup>,
    /// Exhaustive or lower bound
    pub completeness: Completeness,
    /// One entry per stage that ran
    pub stages: Vec<StageSummary>,
    /// Candidates handed to the first stage
    pub listed: usize,
    /// Entries the file listing could not read
    pub listing_skipped: usize,
}

impl PipelineResult {
    /// `true` when fast-mode caps may have hidden duplicates.
    #[must_use]
    pub fn is_lower_bound(&self) -> bool {
        self.completeness == Completeness::LowerBound
    }

    /// Total paths across all groups.
    #[must_use]
    pub fn duplicate_files(&self) -> usize {
        self.groups.iter().map(DuplicateGroup::len).sum()
    }

    /// Bytes freed by keeping one copy per group.
    #[must_use]
    pub fn reclaimable_bytes(&self) -> u64 {
        self.groups.iter().map(DuplicateGroup::wasted_bytes).sum()
    }

    /// Paths dropped anywhere in the run because they could not be read.
    #[must_use]
    pub fn skipped(&self) -> usize {
        self.listing_skipped + self.stages.iter().map(|s| s.stats.skipped).sum::<usize>()
    }

    /// Groups ordered for the verbose report.
    #[must_use]
    pub fn ranked(&self, top: Option<usize>) -> Vec<&DuplicateGroup> {
        rank_groups(&self.groups, top)
    }

    /// One-line summary for the end of a run.
    #[must_use]
    pub fn summary_line(&self) -> String {
        match self.completeness {
            Completeness::Exhaustive => format!(
                "Found {} duplicates ({} duplicate files total)",
                self.groups.len(),
                self.duplicate_files()
            ),
            Completeness::LowerBound => format!(
                "Found {} duplicates at least ({} duplicate files total) -- More duplicates may exist.",
                self.groups.len(),
                self.duplicate_files()
            ),
        }
    }
}

/// Runs the configured stage sequence over a candidate set.
pub struct DuplicatePipeline {
    config: PipelineConfig,
    pool: Option<ThreadPool>,
}

impl DuplicatePipeline {
    /// Create a pipeline and its hashing pool.
    ///
    /// # Errors
    ///
    /// Returns [`FinderError::ThreadPool`] if the worker pool cannot be built.
    pub fn new(config: PipelineConfig) -> Result<Self, FinderError> {
        let pool = if config.io_threads > 1 {
            Some(
                rayon::ThreadPoolBuilder::new()
                    .num_threads(config.io_threads)
                    .thread_name(|i| format!("dupsift-hash-{i}"))
                    .build()?,
            )
        } else {
            None
        };
        Ok(Self { config, pool })
    }

    /// Narrow `candidates` down to the duplicate set.
    ///
    /// # Errors
    ///
    /// Returns [`FinderError::Interrupted`] if shutdown was requested before
    /// any stage, between stages or while the last stage ran. Unreadable
    /// files never cause an error.
    pub fn run(
        &self,
        candidates: Vec<PathBuf>,
        sink: &mut dyn ProgressSink,
    ) -> Result<PipelineResult, FinderError> {
        let listed = candidates.len();
        let algorithm = self.config.algorithm;
        let mut stages = Vec::with_capacity(3);

        self.check_shutdown()?;
        let mut runner = StageRunner::new(self.pool.as_ref(), sink);

        let by_size = runner.run(
            StageSpec::new(SIZE_STAGE).with_keep_cap(self.config.size_cap()),
            &candidates,
            size_key,
        );
        stages.push(StageSummary::of(SIZE_STAGE, &by_size));
        let sizes: HashMap<PathBuf, u64> = by_size
            .groups
            .iter()
            .flat_map(|(size, paths)| paths.iter().map(move |p| (p.clone(), *size)))
            .collect();
        let mut next = by_size.candidates;
        self.check_shutdown()?;

        if self.config.method == Method::Prefilter {
            let by_partial = runner.run(
                StageSpec::new(PARTIAL_STAGE)
                    .with_keep_cap(self.config.partial_cap())
                    .with_parallel(true),
                &next,
                |path| partial_digest_key(path, algorithm),
            );
            stages.push(StageSummary::of(PARTIAL_STAGE, &by_partial));
            next = by_partial.candidates;
            self.check_shutdown()?;
        }

        let by_full = runner.run(
            StageSpec::new(FULL_STAGE).with_parallel(true),
            &next,
            |path| full_digest_key(path, algorithm),
        );
        stages.push(StageSummary::of(FULL_STAGE, &by_full));
        drop(runner);
        sink.finish();
        self.check_shutdown()?;

        let groups = by_full
            .groups
            .into_iter()
            .map(|(digest, paths)| {
                let size = paths
                    .first()
                    .and_then(|p| sizes.get(p))
                    .copied()
                    .unwrap_or_default();
                DuplicateGroup::new(digest, size, paths)
            })
            .collect();

        let capped = self.config.fast && self.config.top.is_some();
        Ok(PipelineResult {
            groups,
            completeness: if capped {
                Completeness::LowerBound
            } else {
                Completeness::Exhaustive
            },
            stages,
            listed,
            listing_skipped: 0,
        })
    }

    fn check_shutdown(&self) -> Result<(), FinderError> {
        if self.config.is_shutdown_requested() {
            log::info!("Shutdown requested, stopping between stages");
            return Err(FinderError::Interrupted);
        }
        Ok(())
    }
}

/// Validate roots, list candidates and run the pipeline.
///
/// # Errors
///
/// Returns [`FinderError::Fatal`] if a root is missing or not a directory,
/// before any listing happens. See [`DuplicatePipeline::run`] for the rest.
pub fn find_in_roots(
    roots: &[PathBuf],
    walker_config: WalkerConfig,
    config: PipelineConfig,
    sink: &mut dyn ProgressSink,
) -> Result<PipelineResult, FinderError> {
    let resolved = resolve_roots(roots)?;
    let pipeline = DuplicatePipeline::new(config)?;
    let walker = Walker::new(resolved, walker_config);

    let mut candidates = Vec::new();
    let mut listing_skipped = 0;
    for entry in walker.walk() {
        match entry {
            Ok(path) => candidates.push(path),
            Err(e) => {
                listing_skipped += 1;
                sink.note(&format!("Skipping (Listing): {e}"));
            }
        }
        sink.update(&format!("(Listing) {} Files found", candidates.len()), false);
    }
    sink.update(&format!("(Listing) {} Files found", candidates.len()), true);
    log::info!(
        "Listed {} candidate files under {} root(s)",
        candidates.len(),
        walker.roots().len()
    );

    let mut result = pipeline.run(candidates, sink)?;
    result.listing_skipped = listing_skipped;
    Ok(result)
}
