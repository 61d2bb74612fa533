//! # lucidity-git
//!
//! Repository acquisition and diff parsing for lucidity.
//!
//! This crate turns a loosely formatted workspace identifier into a local
//! checkout, keeps cached checkouts of remote repositories current, evicts
//! the ones nobody has used in a while, and parses `git diff` output into
//! per-file records.
//!
//! ## Key Types
//!
//! - [`RepositoryCache`] - Clone-or-update cache of remote checkouts
//! - [`ResolvedWorkspace`] / [`RemoteSpec`] - Result of [`resolve`]
//! - [`CacheEntry`] - One cached checkout and its last access time
//! - [`CleanupResult`] - Summary of an eviction sweep
//! - [`DiffRecord`] / [`CodeChangePair`] - Parsed diff for one file
//! - [`ChangedFiles`] - Staged and unstaged tracked changes
//!
//! ## Usage
//!
//! ```rust,ignore
//! use lucidity_git::{parse_diff, CacheConfig, RepositoryCache};
//! use lucidity_exec::{CommandConfig, GitCommandRunner};
//! use std::sync::Arc;
//!
//! let runner = Arc::new(GitCommandRunner::new(CommandConfig::default()));
//! let cache = RepositoryCache::new(CacheConfig::default(), runner);
//!
//! // Clones on first use, fetches and pulls afterwards
//! let checkout = cache.ensure("owner/repo@develop").await?;
//!
//! for (file, record) in parse_diff(&diff_text) {
//!     let code = record.extract_code();
//!     println!("{file} ({}): {} lines now", record.status, code.modified.lines().count());
//! }
//! ```
//!
//! ## Cache Layout
//!
//! ```text
//! <cache_dir>/
//!   <repo-name>/
//!     .git/
//!     .last_accessed   # mtime = last use
//! ```

mod cache;
mod diff;
mod entry;
mod error;
mod identifier;
mod status;
mod sweep;

pub use cache::{
    CacheConfig, RepositoryCache, DEFAULT_CACHE_DIR_NAME, DEFAULT_CLEANUP_DAYS,
    DEFAULT_CLONE_TIMEOUT,
};
pub use diff::{extract_code, parse_diff, CodeChangePair, DiffRecord, FileDiffs, FileStatus};
pub use entry::{directory_size, is_git_repository, CacheEntry, SENTINEL_FILE};
pub use error::{ErrorKind, RepoError};
pub use identifier::{
    looks_like_local_path, repo_name_from_url, resolve, RemoteSpec, ResolvedWorkspace,
    DEFAULT_HOST, KNOWN_HOSTS,
};
pub use status::{changed_files, ChangedFiles};
pub use sweep::{sweep_cache, sweep_cache_at, sweep_cache_with, CleanupResult};
