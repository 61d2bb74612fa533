use chrono::{DateTime, Duration, Utc};
use filetime::FileTime;
use serde::Serialize;
use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Marker file whose mtime records the last use of a cache entry
pub const SENTINEL_FILE: &str = ".last_accessed";

/// A directory is a checkout iff it owns a `.git` directory
pub fn is_git_repository(path: &Path) -> bool {
    path.join(".git").is_dir()
}

/// One checkout living under the cache root
#[derive(Debug, Clone, Serialize)]
pub struct CacheEntry {
    pub name: String,
    pub path: PathBuf,
    pub last_accessed: DateTime<Utc>,
}

impl CacheEntry {
    /// Load the entry at `path`.
    ///
    /// Returns `Ok(None)` when the directory is not a checkout.
    pub fn open(path: &Path) -> io::Result<Option<Self>> {
        if !is_git_repository(path) {
            return Ok(None);
        }

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        Ok(Some(Self {
            name,
            path: path.to_path_buf(),
            last_accessed: last_accessed(path)?,
        }))
    }

    /// Record a use of the checkout at `path` now.
    pub fn touch(path: &Path) -> io::Result<()> {
        let sentinel = path.join(SENTINEL_FILE);
        OpenOptions::new().create(true).append(true).open(&sentinel)?;
        filetime::set_file_mtime(&sentinel, FileTime::now())
    }

    pub fn idle_for(&self, now: DateTime<Utc>) -> Duration {
        now.signed_duration_since(self.last_accessed)
    }

    /// Whether the entry has gone unused for at least `max_inactive_days`
    pub fn is_inactive(&self, now: DateTime<Utc>, max_inactive_days: u32) -> bool {
        self.idle_for(now) >= Duration::days(i64::from(max_inactive_days))
    }

    pub fn size_bytes(&self) -> u64 {
        directory_size(&self.path)
    }
}

/// Sentinel mtime, falling back to the directory's own mtime
fn last_accessed(path: &Path) -> io::Result<DateTime<Utc>> {
    let modified = match fs::metadata(path.join(SENTINEL_FILE)).and_then(|m| m.modified()) {
        Ok(time) => time,
        Err(_) => fs::metadata(path)?.modified()?,
    };
    Ok(DateTime::<Utc>::from(modified))
}

/// Total size of regular files below `path`.
///
/// Unreadable entries are skipped; symlinks are not followed.
pub fn directory_size(path: &Path) -> u64 {
    WalkDir::new(path)
        .follow_links(false)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .filter_map(|entry| entry.metadata().ok())
        .map(|metadata| metadata.len())
        .sum()
}
