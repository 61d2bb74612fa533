use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use chrono::Utc;
use filetime::FileTime;
use lucidity_git::{sweep_cache, sweep_cache_with, CacheEntry, SENTINEL_FILE};
use tempfile::TempDir;

const DAY: u64 = 86_400;

/// Helper: a fake checkout with a payload file and a sentinel aged `days_ago`.
fn cached_repo(root: &Path, name: &str, days_ago: u64, payload: usize) -> PathBuf {
    let path = root.join(name);
    fs::create_dir_all(path.join(".git")).unwrap();
    fs::write(path.join("payload.bin"), vec![7u8; payload]).unwrap();
    CacheEntry::touch(&path).unwrap();

    let when = SystemTime::now() - Duration::from_secs(days_ago * DAY);
    filetime::set_file_mtime(path.join(SENTINEL_FILE), FileTime::from_system_time(when)).unwrap();
    path
}

#[test]
fn test_stale_entry_removed_fresh_entry_kept() {
    let cache = TempDir::new().unwrap();
    let stale = cached_repo(cache.path(), "stale", 10, 1000);
    let fresh = cached_repo(cache.path(), "fresh", 0, 500);

    let result = sweep_cache(cache.path(), 7, false);

    assert_eq!(result.cache_dir, cache.path());
    assert_eq!(result.scanned, 2);
    assert_eq!(result.removed, 1);
    assert_eq!(result.repositories, vec!["stale".to_string()]);
    assert_eq!(result.freed_bytes, 1000);
    assert!(!result.dry_run);
    assert!(!stale.exists());
    assert!(fresh.exists());
}

#[test]
fn test_dry_run_reports_without_deleting() {
    let cache = TempDir::new().unwrap();
    let stale = cached_repo(cache.path(), "stale", 10, 1000);
    cached_repo(cache.path(), "fresh", 0, 500);

    let result = sweep_cache(cache.path(), 7, true);

    assert!(result.dry_run);
    assert_eq!(result.removed, 1);
    assert_eq!(result.repositories, vec!["stale".to_string()]);
    assert_eq!(result.freed_bytes, 1000);
    assert!(stale.exists());
    assert!(stale.join("payload.bin").exists());
}

#[test]
fn test_threshold_is_inclusive() {
    let cache = TempDir::new().unwrap();
    cached_repo(cache.path(), "exactly-seven", 7, 10);
    cached_repo(cache.path(), "six", 6, 10);

    let result = sweep_cache(cache.path(), 7, true);

    assert_eq!(result.repositories, vec!["exactly-seven".to_string()]);
}

#[test]
fn test_directory_mtime_used_without_sentinel() {
    let cache = TempDir::new().unwrap();
    let path = cache.path().join("legacy");
    fs::create_dir_all(path.join(".git")).unwrap();
    let when = SystemTime::now() - Duration::from_secs(30 * DAY);
    filetime::set_file_mtime(&path, FileTime::from_system_time(when)).unwrap();

    let result = sweep_cache(cache.path(), 7, false);

    assert_eq!(result.repositories, vec!["legacy".to_string()]);
    assert!(!path.exists());
}

#[test]
fn test_non_repositories_are_skipped() {
    let cache = TempDir::new().unwrap();
    let plain = cache.path().join("not-a-repo");
    fs::create_dir_all(&plain).unwrap();
    let when = SystemTime::now() - Duration::from_secs(30 * DAY);
    filetime::set_file_mtime(&plain, FileTime::from_system_time(when)).unwrap();
    fs::write(cache.path().join("stray-file"), "x").unwrap();

    let result = sweep_cache(cache.path(), 7, false);

    assert_eq!(result.scanned, 0);
    assert_eq!(result.removed, 0);
    assert!(plain.exists());
}

#[test]
fn test_missing_cache_dir_yields_empty_result() {
    let cache = TempDir::new().unwrap();
    let missing = cache.path().join("nope");

    let result = sweep_cache(&missing, 7, false);

    assert_eq!(result.cache_dir, missing);
    assert_eq!(result.scanned, 0);
    assert!(result.repositories.is_empty());
}

#[test]
fn test_failed_deletion_is_not_counted() {
    let cache = TempDir::new().unwrap();
    let locked = cached_repo(cache.path(), "locked", 10, 100);
    cached_repo(cache.path(), "other", 10, 200);

    let result = sweep_cache_with(cache.path(), 7, false, Utc::now(), |path| {
        if path.ends_with("locked") {
            Err(io::Error::new(io::ErrorKind::PermissionDenied, "read-only"))
        } else {
            fs::remove_dir_all(path)
        }
    });

    assert_eq!(result.scanned, 2);
    assert_eq!(result.removed, 1);
    assert_eq!(result.freed_bytes, 200);
    assert_eq!(result.repositories, vec!["other".to_string()]);
    assert!(locked.exists());
    assert!(!cache.path().join("other").exists());
}

#[test]
fn test_dry_run_never_calls_remove() {
    let cache = TempDir::new().unwrap();
    cached_repo(cache.path(), "stale", 10, 50);

    let result = sweep_cache_with(cache.path(), 7, true, Utc::now(), |path| {
        panic!("dry run removed {}", path.display())
    });

    assert_eq!(result.removed, 1);
    assert_eq!(result.freed_bytes, 50);
}
