//! One narrowing pass of the pipeline.
//!
//! # Overview
//!
//! A stage maps every candidate path to a key, groups paths by key in
//! encounter order, drops singleton groups and optionally keeps only the
//! largest groups (the fast-mode cap). The union of surviving groups becomes
//! the next stage's candidate set.
//!
//! Key extraction may run on a rayon pool. Results are collected per batch
//! in candidate order and reduced on the calling thread, so grouping is
//! deterministic and the progress sink has a single writer.
//!
//! Paths whose key cannot be computed are dropped with a diagnostic.

use std::collections::HashMap;
use std::hash::Hash;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use rayon::ThreadPool;

use crate::progress::ProgressSink;
use crate::scanner::AccessError;

/// Paths reduced between two progress offers when hashing in parallel.
pub const DEFAULT_BATCH_SIZE: usize = 256;

/// Static description of a stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageSpec<'a> {
    /// Label shown in progress lines, e.g. "By Size"
    pub name: &'a str,
    /// Maximum number of groups carried into the next stage
    pub keep_cap: Option<usize>,
    /// Dispatch key extraction to the worker pool
    pub parallel: bool,
}

impl<'a> StageSpec<'a> {
    /// Uncapped, sequential stage.
    #[must_use]
    pub fn new(name: &'a str) -> Self {
        Self {
            name,
            keep_cap: None,
            parallel: false,
        }
    }

    /// Keep at most `cap` groups.
    #[must_use]
    pub fn with_keep_cap(mut self, cap: Option<usize>) -> Self {
        self.keep_cap = cap;
        self
    }

    /// Run key extraction on the pool.
    #[must_use]
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }
}

/// Running counters of a stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StageStats {
    /// Paths processed, including skipped ones
    pub checked: usize,
    /// Groups that reached two members
    pub duplicate_groups: usize,
    /// Paths belonging to those groups
    pub duplicate_files: usize,
    /// Paths dropped because their key could not be computed
    pub skipped: usize,
}

impl StageStats {
    /// The status line offered to the progress sink.
    #[must_use]
    pub fn status_line(&self, stage: &str) -> String {
        format!(
            "({stage}) {} Files checked, {} duplicates found ({} files)",
            self.checked, self.duplicate_groups, self.duplicate_files
        )
    }
}

/// Result of one stage.
#[derive(Debug, Clone)]
pub struct StageOutcome<K> {
    /// Surviving groups: encounter order, or descending size when capped
    pub groups: Vec<(K, Vec<PathBuf>)>,
    /// Flattened paths of `groups`, the next candidate set
    pub candidates: Vec<PathBuf>,
    /// Counters at the end of the stage, before the cap
    pub stats: StageStats,
    /// Groups discarded by the cap
    pub capped_groups: usize,
}

/// Drives stages against a shared progress sink and optional pool.
pub struct StageRunner<'a> {
    pool: Option<&'a ThreadPool>,
    sink: &'a mut dyn ProgressSink,
    batch_size: usize,
}

impl<'a> StageRunner<'a> {
    /// Create a runner. Without a pool every stage runs sequentially.
    pub fn new(pool: Option<&'a ThreadPool>, sink: &'a mut dyn ProgressSink) -> Self {
        Self {
            pool,
            sink,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    /// Override the batch size used for parallel stages.
    #[must_use]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Run one stage over `candidates`.
    ///
    /// # Arguments
    ///
    /// * `spec` - Stage label, keep-cap and dispatch mode
    /// * `candidates` - Paths under consideration, in order
    /// * `extract` - Key function; failures drop the path
    pub fn run<K, F>(
        &mut self,
        spec: StageSpec<'_>,
        candidates: &[PathBuf],
        extract: F,
    ) -> StageOutcome<K>
    where
        K: Eq + Hash + Clone + Send,
        F: Fn(&Path) -> Result<K, AccessError> + Sync,
    {
        log::debug!("Stage {}: {} candidates", spec.name, candidates.len());

        let mut grouping = Grouping::default();

        match self.pool.filter(|_| spec.parallel) {
            Some(pool) => {
                for batch in candidates.chunks(self.batch_size) {
                    let keys: Vec<Result<K, AccessError>> =
                        pool.install(|| batch.par_iter().map(|p| extract(p)).collect());
                    for (path, key) in batch.iter().zip(keys) {
                        self.reduce(&mut grouping, spec.name, path, key);
                    }
                }
            }
            None => {
                for path in candidates {
                    let key = extract(path);
                    self.reduce(&mut grouping, spec.name, path, key);
                }
            }
        }

        self.sink.update(&grouping.stats.status_line(spec.name), true);

        let stats = grouping.stats;
        let mut groups: Vec<(K, Vec<PathBuf>)> = grouping
            .groups
            .into_iter()
            .filter(|(_, paths)| paths.len() >= 2)
            .collect();

        let mut capped_groups = 0;
        if let Some(cap) = spec.keep_cap {
            groups.sort_by(|a, b| b.1.len().cmp(&a.1.len()));
            capped_groups = groups.len().saturating_sub(cap);
            groups.truncate(cap);
        }

        let candidates: Vec<PathBuf> = groups
            .iter()
            .flat_map(|(_, paths)| paths.iter().cloned())
            .collect();

        log::info!(
            "Stage {}: {} checked, {} groups kept ({} capped), {} skipped",
            spec.name,
            stats.checked,
            groups.len(),
            capped_groups,
            stats.skipped
        );

        StageOutcome {
            groups,
            candidates,
            stats,
            capped_groups,
        }
    }

    fn reduce<K: Eq + Hash + Clone>(
        &mut self,
        grouping: &mut Grouping<K>,
        stage: &str,
        path: &Path,
        key: Result<K, AccessError>,
    ) {
        match key {
            Ok(key) => grouping.insert(key, path.to_path_buf()),
            Err(e) => {
                grouping.stats.checked += 1;
                grouping.stats.skipped += 1;
                self.sink.note(&format!("Skipping ({stage}): {e}"));
            }
        }
        self.sink.update(&grouping.stats.status_line(stage), false);
    }
}

/// Key to paths in first-seen order.
struct Grouping<K> {
    index: HashMap<K, usize>,
    groups: Vec<(K, Vec<PathBuf>)>,
    stats: StageStats,
}

impl<K> Default for Grouping<K> {
    fn default() -> Self {
        Self {
            index: HashMap::new(),
            groups: Vec::new(),
            stats: StageStats::default(),
        }
    }
}

impl<K: Eq + Hash + Clone> Grouping<K> {
    fn insert(&mut self, key: K, path: PathBuf) {
        self.stats.checked += 1;
        let slot = match self.index.get(&key) {
            Some(&slot) => slot,
            None => {
                self.index.insert(key.clone(), self.groups.len());
                self.groups.push((key, Vec::new()));
                self.groups.len() - 1
            }
        };
        let members = &mut self.groups[slot].1;
        members.push(path);
        match members.len() {
            2 => {
                self.stats.duplicate_groups += 1;
                self.stats.duplicate_files += 2;
            }
            n if n > 2 => self.stats.duplicate_files += 1,
            _ => {}
        }
    }
}
