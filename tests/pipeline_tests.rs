use dupsift::duplicates::{
    find_in_roots, Completeness, DuplicatePipeline, FinderError, Method, PipelineConfig,
    PipelineResult,
};
use dupsift::cli::OutputFormat;
use dupsift::output::write_results;
use dupsift::progress::{ProgressSink, SilentSink, UpdatePrinter};
use dupsift::scanner::{HashAlgorithm, WalkerConfig};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

fn write(root: &Path, name: &str, content: &[u8]) -> PathBuf {
    let path = root.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, content).unwrap();
    path
}

fn exhaustive() -> PipelineConfig {
    PipelineConfig::default().with_top(None).with_io_threads(2)
}

fn scan(roots: &[PathBuf], config: PipelineConfig) -> PipelineResult {
    find_in_roots(roots, WalkerConfig::default(), config, &mut SilentSink).unwrap()
}

/// Groups of 5, 4, 3, 2 and 2 identical copies, each group with its own size.
fn layered_tree(root: &Path) {
    for (group, count) in [5usize, 4, 3, 2, 2].into_iter().enumerate() {
        let content = vec![b'a' + group as u8; 100 + group * 10];
        for copy in 0..count {
            write(root, &format!("g{group}/copy{copy}"), &content);
        }
    }
    write(root, "unique.bin", b"nothing like it");
}

fn group_sets(result: &PipelineResult) -> BTreeSet<BTreeSet<PathBuf>> {
    result
        .groups
        .iter()
        .map(|g| g.paths.iter().cloned().collect())
        .collect()
}

#[test]
fn test_same_size_different_content_is_not_a_duplicate() {
    let dir = TempDir::new().unwrap();
    let a = write(dir.path(), "A", b"abcd");
    let b = write(dir.path(), "B", b"abcd");
    let c = write(dir.path(), "C", b"abcd");
    write(dir.path(), "D", b"wxyz");

    let result = scan(&[dir.path().to_path_buf()], exhaustive());

    assert_eq!(result.groups.len(), 1);
    let group = &result.groups[0];
    assert_eq!(group.size, 4);
    let mut paths = group.paths.clone();
    paths.sort();
    let expected: Vec<PathBuf> = [a, b, c].iter().map(|p| p.canonicalize().unwrap()).collect();
    assert_eq!(paths, expected);
    assert_eq!(result.completeness, Completeness::Exhaustive);
    assert_eq!(result.reclaimable_bytes(), 8);
    assert_eq!(
        result.summary_line(),
        "Found 1 duplicates (3 duplicate files total)"
    );
}

#[test]
fn test_fast_top_one_finds_the_largest_group() {
    let dir = TempDir::new().unwrap();
    layered_tree(dir.path());

    let config = PipelineConfig::default()
        .with_top(Some(1))
        .with_fast(true)
        .with_io_threads(1);
    let result = scan(&[dir.path().to_path_buf()], config);

    assert_eq!(result.groups.len(), 1);
    assert_eq!(result.groups[0].len(), 5);
    assert_eq!(result.groups[0].size, 100);
    assert!(result.is_lower_bound());
    assert!(result.summary_line().ends_with("-- More duplicates may exist."));
    assert_eq!(result.stages[0].capped_groups, 4);
}

#[test]
fn test_exhaustive_is_superset_of_fast() {
    let dir = TempDir::new().unwrap();
    layered_tree(dir.path());
    let roots = [dir.path().to_path_buf()];

    let fast = scan(&roots, PipelineConfig::default().with_top(Some(2)).with_fast(true));
    let full = scan(&roots, exhaustive());

    assert_eq!(full.groups.len(), 5);
    let full_sets = group_sets(&full);
    for set in group_sets(&fast) {
        assert!(full_sets.contains(&set));
    }
}

#[test]
fn test_methods_agree() {
    let dir = TempDir::new().unwrap();
    layered_tree(dir.path());
    // Same length and first block, different last byte.
    let len = 2 * 1024 * 1024;
    let mut left = vec![0u8; len];
    let mut right = left.clone();
    left[len - 1] = 1;
    right[len - 1] = 2;
    write(dir.path(), "tail/left", &left);
    write(dir.path(), "tail/right", &right);
    let roots = [dir.path().to_path_buf()];

    let prefilter = scan(&roots, exhaustive().with_method(Method::Prefilter));
    let thorough = scan(&roots, exhaustive().with_method(Method::Thorough));

    assert_eq!(group_sets(&prefilter), group_sets(&thorough));
    assert_eq!(prefilter.groups.len(), 5);
    assert_eq!(prefilter.stages.len(), 3);
    assert_eq!(thorough.stages.len(), 2);
}

#[test]
fn test_sha256_finds_the_same_groups() {
    let dir = TempDir::new().unwrap();
    layered_tree(dir.path());
    let roots = [dir.path().to_path_buf()];

    let blake = scan(&roots, exhaustive());
    let sha = scan(&roots, exhaustive().with_algorithm(HashAlgorithm::Sha256));

    assert_eq!(group_sets(&blake), group_sets(&sha));
    assert_ne!(blake.groups[0].digest, sha.groups[0].digest);
}

#[test]
fn test_vanished_file_is_skipped_once() {
    let dir = TempDir::new().unwrap();
    let a = write(dir.path(), "a", b"twin");
    let b = write(dir.path(), "b", b"twin");
    let gone = dir.path().join("gone");

    let pipeline = DuplicatePipeline::new(exhaustive()).unwrap();
    let mut printer = UpdatePrinter::new(Vec::new()).with_min_interval(Duration::ZERO);
    let result = pipeline.run(vec![a, gone, b], &mut printer).unwrap();

    assert_eq!(result.groups.len(), 1);
    assert_eq!(result.skipped(), 1);
    assert_eq!(result.listed, 3);

    let output = String::from_utf8(printer.into_inner()).unwrap();
    assert_eq!(output.matches("Skipping (By Size)").count(), 1);
    assert!(output.contains("(By Full Hash) 2 Files checked, 1 duplicates found (2 files)"));
}

#[test]
fn test_rerun_after_deletion() {
    let dir = TempDir::new().unwrap();
    let a = write(dir.path(), "a", b"copy");
    write(dir.path(), "b", b"copy");
    write(dir.path(), "c", b"copy");
    let roots = [dir.path().to_path_buf()];

    let first = scan(&roots, exhaustive());
    assert_eq!(first.groups[0].len(), 3);

    fs::remove_file(a).unwrap();
    let second = scan(&roots, exhaustive());
    assert_eq!(second.groups.len(), 1);
    assert_eq!(second.groups[0].len(), 2);
}

#[test]
fn test_empty_and_hidden_files_follow_walker_config() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "e1", b"");
    write(dir.path(), "e2", b"");
    write(dir.path(), ".h1", b"hidden");
    write(dir.path(), ".h2", b"hidden");
    let roots = [dir.path().to_path_buf()];

    assert!(scan(&roots, exhaustive()).groups.is_empty());

    let all = find_in_roots(
        &roots,
        WalkerConfig::default().with_hidden(true).with_min_size(0),
        exhaustive(),
        &mut SilentSink,
    )
    .unwrap();
    assert_eq!(all.groups.len(), 2);
}

#[test]
fn test_overlapping_roots_do_not_duplicate_paths() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "sub/a", b"same");
    write(dir.path(), "sub/b", b"same");

    let result = scan(
        &[dir.path().to_path_buf(), dir.path().join("sub")],
        exhaustive(),
    );

    assert_eq!(result.groups.len(), 1);
    assert_eq!(result.groups[0].len(), 2);
}

#[test]
fn test_missing_root_is_fatal() {
    let dir = TempDir::new().unwrap();
    let err = find_in_roots(
        &[dir.path().join("missing")],
        WalkerConfig::default(),
        exhaustive(),
        &mut SilentSink,
    )
    .unwrap_err();
    assert!(matches!(err, FinderError::Fatal(_)));
}

#[test]
fn test_shutdown_before_run_interrupts() {
    let dir = TempDir::new().unwrap();
    let a = write(dir.path(), "a", b"x");
    let flag = Arc::new(AtomicBool::new(true));
    let pipeline = DuplicatePipeline::new(exhaustive().with_shutdown_flag(flag)).unwrap();

    let err = pipeline.run(vec![a], &mut SilentSink).unwrap_err();
    assert!(matches!(err, FinderError::Interrupted));
    assert_eq!(err.exit_code().as_i32(), 130);
}

/// Raises the shutdown flag as soon as the given stage reports progress.
struct InterruptDuring {
    stage: &'static str,
    flag: Arc<AtomicBool>,
}

impl ProgressSink for InterruptDuring {
    fn update(&mut self, text: &str, _force: bool) {
        if text.starts_with(&format!("({})", self.stage)) {
            self.flag.store(true, Ordering::SeqCst);
        }
    }

    fn note(&mut self, _text: &str) {}
}

#[test]
fn test_shutdown_during_full_hash_interrupts() {
    let dir = TempDir::new().unwrap();
    let a = write(dir.path(), "a", b"twin");
    let b = write(dir.path(), "b", b"twin");
    let flag = Arc::new(AtomicBool::new(false));
    let pipeline =
        DuplicatePipeline::new(exhaustive().with_shutdown_flag(Arc::clone(&flag))).unwrap();

    let mut sink = InterruptDuring {
        stage: "By Full Hash",
        flag: Arc::clone(&flag),
    };
    let err = pipeline.run(vec![a, b], &mut sink).unwrap_err();

    assert!(flag.load(Ordering::SeqCst));
    assert!(matches!(err, FinderError::Interrupted));
}

/// Groups of 5, 4, 3, 2 and 2 copies that all share one byte length.
fn same_size_tree(root: &Path) {
    for (group, count) in [5usize, 4, 3, 2, 2].into_iter().enumerate() {
        let content = vec![b'a' + group as u8; 100];
        for copy in 0..count {
            write(root, &format!("g{group}/copy{copy}"), &content);
        }
    }
}

#[test]
fn test_fast_top_one_output_with_shared_size() {
    let dir = TempDir::new().unwrap();
    same_size_tree(dir.path());
    let top = Some(1);

    let config = PipelineConfig::default().with_top(top).with_fast(true);
    let result = scan(&[dir.path().to_path_buf()], config);
    assert!(result.is_lower_bound());
    assert!(result.groups.iter().any(|g| g.len() == 5));

    let render = |format| {
        let mut out = Vec::new();
        write_results(&mut out, &result, format, top, HashAlgorithm::Blake3, false).unwrap();
        String::from_utf8(out).unwrap()
    };

    let script = render(OutputFormat::Script);
    let lines: Vec<&str> = script.lines().collect();
    assert_eq!(lines.len(), 5);
    assert!(lines.iter().all(|l| l.starts_with("0\t") && l.contains("/g0/")));

    let report = render(OutputFormat::Report);
    assert_eq!(report.matches("Found ").count(), 1);
    assert!(report.contains("Found 5 duplicate files (size: 100 Bytes"));

    let json: serde_json::Value = serde_json::from_str(&render(OutputFormat::Json)).unwrap();
    assert_eq!(json["groups"].as_array().unwrap().len(), 1);
    assert_eq!(json["complete"], false);
}
