use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::CacheEntry;

/// Summary of one eviction pass over the cache root
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CleanupResult {
    pub cache_dir: PathBuf,
    /// Valid checkouts examined
    pub scanned: usize,
    /// Checkouts deleted (or selected, in a dry run)
    pub removed: usize,
    pub freed_bytes: u64,
    /// Names of the removed checkouts, in directory-name order
    pub repositories: Vec<String>,
    pub dry_run: bool,
}

impl CleanupResult {
    fn empty(cache_dir: &Path, dry_run: bool) -> Self {
        Self {
            cache_dir: cache_dir.to_path_buf(),
            dry_run,
            ..Default::default()
        }
    }

    pub fn freed_megabytes(&self) -> f64 {
        self.freed_bytes as f64 / (1024.0 * 1024.0)
    }
}

/// Remove checkouts under `cache_dir` unused for `max_inactive_days`.
pub fn sweep_cache(cache_dir: &Path, max_inactive_days: u32, dry_run: bool) -> CleanupResult {
    sweep_cache_at(cache_dir, max_inactive_days, dry_run, Utc::now())
}

/// [`sweep_cache`] evaluated against an explicit clock.
///
/// An entry only counts toward `removed`/`freed_bytes` once its deletion has
/// succeeded, or once it has been selected in a dry run.
pub fn sweep_cache_at(
    cache_dir: &Path,
    max_inactive_days: u32,
    dry_run: bool,
    now: DateTime<Utc>,
) -> CleanupResult {
    sweep_cache_with(cache_dir, max_inactive_days, dry_run, now, |path| {
        fs::remove_dir_all(path)
    })
}

/// [`sweep_cache_at`] with the directory removal step supplied by the caller.
pub fn sweep_cache_with<F>(
    cache_dir: &Path,
    max_inactive_days: u32,
    dry_run: bool,
    now: DateTime<Utc>,
    remove: F,
) -> CleanupResult
where
    F: Fn(&Path) -> io::Result<()>,
{
    let mut result = CleanupResult::empty(cache_dir, dry_run);

    let dir_entries = match fs::read_dir(cache_dir) {
        Ok(entries) => entries,
        Err(e) => {
            debug!(cache_dir = %cache_dir.display(), error = %e, "Cache directory not readable, nothing to clean");
            return result;
        }
    };

    let mut candidates: Vec<PathBuf> = dir_entries
        .filter_map(Result::ok)
        // file_type() does not follow symlinks
        .filter(|entry| entry.file_type().map(|t| t.is_dir()).unwrap_or(false))
        .map(|entry| entry.path())
        .collect();
    candidates.sort();

    for path in candidates {
        let entry = match CacheEntry::open(&path) {
            Ok(Some(entry)) => entry,
            Ok(None) => {
                debug!(path = %path.display(), "Skipping non-repository directory");
                continue;
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to read cache entry");
                continue;
            }
        };
        result.scanned += 1;

        if !entry.is_inactive(now, max_inactive_days) {
            debug!(name = %entry.name, last_accessed = %entry.last_accessed, "Cache entry still active");
            continue;
        }

        let size = entry.size_bytes();
        let idle_days = entry.idle_for(now).num_days();

        if dry_run {
            info!(name = %entry.name, idle_days, size, "Would remove inactive repository");
        } else if let Err(e) = remove(&entry.path) {
            warn!(name = %entry.name, error = %e, "Failed to remove inactive repository");
            continue;
        } else {
            info!(name = %entry.name, idle_days, size, "Removed inactive repository");
        }

        result.removed += 1;
        result.freed_bytes += size;
        result.repositories.push(entry.name);
    }

    info!(
        cache_dir = %cache_dir.display(),
        scanned = result.scanned,
        removed = result.removed,
        freed_bytes = result.freed_bytes,
        dry_run,
        "Cache cleanup finished"
    );

    result
}
