use dupsift::actions::{
    delete_batch, keep_newest, validate_preserves_copy, DeleteConfig, DeleteError,
};
use dupsift::duplicates::{find_in_roots, PipelineConfig};
use dupsift::error::ExitCode;
use dupsift::progress::SilentSink;
use dupsift::scanner::WalkerConfig;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tempfile::TempDir;

fn write_aged(root: &Path, name: &str, content: &[u8], age_secs: u64) -> PathBuf {
    let path = root.join(name);
    fs::write(&path, content).unwrap();
    File::options()
        .write(true)
        .open(&path)
        .unwrap()
        .set_modified(SystemTime::now() - Duration::from_secs(age_secs))
        .unwrap();
    path.canonicalize().unwrap()
}

#[test]
fn test_delete_older_keeps_one_newest_copy_per_group() {
    let dir = TempDir::new().unwrap();
    let old_a = write_aged(dir.path(), "old_a", b"alpha", 900);
    let new_a = write_aged(dir.path(), "new_a", b"alpha", 10);
    let mid_a = write_aged(dir.path(), "mid_a", b"alpha", 300);
    let old_b = write_aged(dir.path(), "old_b", b"bravo!", 700);
    let new_b = write_aged(dir.path(), "new_b", b"bravo!", 20);
    let lone = write_aged(dir.path(), "lone", b"charlie", 1000);

    let result = find_in_roots(
        &[dir.path().to_path_buf()],
        WalkerConfig::default(),
        PipelineConfig::default().with_top(None),
        &mut SilentSink,
    )
    .unwrap();
    let plan = keep_newest(&result.groups);
    assert_eq!(plan.delete_count(), 3);

    let outcome = plan.execute(&DeleteConfig::permanent());
    assert!(outcome.all_succeeded());
    assert_eq!(outcome.bytes_freed, 5 * 2 + 6);
    assert_eq!(
        ExitCode::from_deletion_failures(outcome.failure_count()),
        ExitCode::Success
    );

    for gone in [old_a, mid_a, old_b] {
        assert!(!gone.exists());
    }
    for kept in [new_a, new_b, lone] {
        assert!(kept.exists());
    }
}

#[test]
fn test_batch_failures_do_not_stop_the_rest() {
    let dir = TempDir::new().unwrap();
    let present = write_aged(dir.path(), "present", b"x", 0);
    let missing = dir.path().join("missing");

    let result = delete_batch(&[missing.clone(), present.clone()], &DeleteConfig::permanent());

    assert_eq!(result.success_count(), 1);
    assert_eq!(result.failure_count(), 1);
    assert_eq!(result.failures[0].0, missing);
    assert!(!present.exists());
    assert_eq!(result.summary(), "Deleted 1 file(s), 1 failed.");
    assert_eq!(
        ExitCode::from_deletion_failures(result.failure_count()),
        ExitCode::PartialSuccess
    );
}

#[test]
fn test_refuses_to_delete_every_copy() {
    let group = vec![PathBuf::from("/a"), PathBuf::from("/b")];
    let err = validate_preserves_copy(&group, &group).unwrap_err();
    assert!(matches!(err, DeleteError::AllCopiesWouldBeDeleted));
    assert!(validate_preserves_copy(&group, &group[..1]).is_ok());
}
