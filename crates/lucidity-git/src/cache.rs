use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, info, warn};

use lucidity_exec::{git_args, validate_branch, GitRunner, RunOptions};

use crate::identifier::{looks_like_local_path, resolve, RemoteSpec, ResolvedWorkspace};
use crate::sweep::{sweep_cache, CleanupResult};
use crate::{is_git_repository, CacheEntry, RepoError};

/// Directory name used under the system temp dir when no cache dir is configured
pub const DEFAULT_CACHE_DIR_NAME: &str = "lucidity-mcp-repos";
pub const DEFAULT_CLONE_TIMEOUT: Duration = Duration::from_secs(300);
pub const DEFAULT_CLEANUP_DAYS: u32 = 7;

/// Settings owned by the repository cache
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Root directory holding one checkout per repository name
    pub cache_dir: PathBuf,
    /// Bound for a full clone; updates use the runner's default timeout
    pub clone_timeout: Duration,
    /// Inactivity threshold for eviction
    pub cleanup_days: u32,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            cache_dir: std::env::temp_dir().join(DEFAULT_CACHE_DIR_NAME),
            clone_timeout: DEFAULT_CLONE_TIMEOUT,
            cleanup_days: DEFAULT_CLEANUP_DAYS,
        }
    }
}

impl CacheConfig {
    pub fn new(cache_dir: PathBuf) -> Self {
        Self {
            cache_dir,
            ..Default::default()
        }
    }

    pub fn with_clone_timeout(mut self, timeout: Duration) -> Self {
        self.clone_timeout = timeout;
        self
    }

    pub fn with_cleanup_days(mut self, days: u32) -> Self {
        self.cleanup_days = days;
        self
    }
}

/// Keeps local checkouts of remote repositories current.
///
/// Checkouts live at `cache_dir/<name>`. Calls for the same checkout are
/// serialized, so a second caller waits for the first and then takes the
/// update path instead of racing a clone.
///
/// The locks are in-process and belong to this value. Two processes (or two
/// `RepositoryCache`s) sharing one cache directory are not serialized against
/// each other; share a single cache behind an `Arc` to get the guarantee.
pub struct RepositoryCache {
    config: CacheConfig,
    runner: Arc<dyn GitRunner>,
    locks: Mutex<HashMap<PathBuf, Arc<tokio::sync::Mutex<()>>>>,
}

impl RepositoryCache {
    pub fn new(config: CacheConfig, runner: Arc<dyn GitRunner>) -> Self {
        Self {
            config,
            runner,
            locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    pub fn runner(&self) -> &Arc<dyn GitRunner> {
        &self.runner
    }

    /// Where the checkout for `spec` lives, relative to the configured root
    pub fn entry_path(&self, spec: &RemoteSpec) -> PathBuf {
        self.config.cache_dir.join(&spec.name)
    }

    /// Turn a workspace identifier into a usable local checkout.
    ///
    /// Local checkouts are returned as-is. Remote references are cloned or
    /// updated in the cache first.
    pub async fn ensure(&self, identifier: &str) -> Result<PathBuf, RepoError> {
        debug!(identifier, "Ensuring repository is available");

        match resolve(identifier) {
            ResolvedWorkspace::Local { path } => {
                if is_git_repository(&path) {
                    debug!(path = %path.display(), "Workspace is already a git repository");
                    Ok(path)
                } else {
                    warn!(path = %path.display(), "Path exists but is not a git repository");
                    Err(RepoError::NotARepo(path))
                }
            }
            ResolvedWorkspace::Remote(spec) => {
                info!(url = %spec.url, branch = ?spec.branch, "Workspace is a remote repository");
                self.ensure_remote(&spec).await
            }
            ResolvedWorkspace::Unresolvable => {
                let identifier = identifier.trim();
                let path = Path::new(identifier);
                if !identifier.is_empty() && path.exists() {
                    warn!(identifier, "Path exists but is not a git repository");
                    Err(RepoError::NotARepo(path.to_path_buf()))
                } else if looks_like_local_path(identifier) {
                    warn!(identifier, "Local path does not exist on this machine");
                    Err(RepoError::MissingLocalPath(path.to_path_buf()))
                } else {
                    warn!(identifier, "Could not parse workspace as a local path or remote URL");
                    Err(RepoError::Unresolvable(identifier.to_string()))
                }
            }
        }
    }

    /// Clone or update the cached checkout for `spec`.
    pub async fn ensure_remote(&self, spec: &RemoteSpec) -> Result<PathBuf, RepoError> {
        if let Some(branch) = spec.branch.as_deref() {
            validate_branch(branch)?;
        }

        fs::create_dir_all(&self.config.cache_dir)?;
        // git runs inside the cache dir, so a relative root would be applied twice
        let cache_dir = fs::canonicalize(&self.config.cache_dir)?;
        let path = cache_dir.join(&spec.name);

        let lock = self.lock_for(&path);
        let _guard = lock.lock().await;

        if is_git_repository(&path) {
            info!(path = %path.display(), "Repository already cached, updating");
            match self.update(&path, spec.branch.as_deref()).await {
                Ok(()) => {
                    self.record_access(&path);
                    return Ok(path);
                }
                Err(e) => {
                    warn!(error = %e, "Failed to update cached repository, re-cloning");
                }
            }
        }

        if path.exists() {
            debug!(path = %path.display(), "Removing stale cache directory");
            fs::remove_dir_all(&path)?;
        }

        self.clone_into(spec, &cache_dir, &path).await?;
        self.record_access(&path);
        Ok(path)
    }

    /// Fetch, optionally switch branch, then pull.
    async fn update(&self, path: &Path, branch: Option<&str>) -> Result<(), RepoError> {
        let mut steps = vec![git_args(["fetch", "--all"])];
        if let Some(branch) = branch {
            steps.push(git_args(["checkout", branch]));
        }
        steps.push(git_args(["pull"]));

        for args in steps {
            self.runner
                .run(&args, path, RunOptions::new())
                .await
                .map_err(|source| RepoError::UpdateFailed {
                    path: path.to_path_buf(),
                    source,
                })?;
        }

        info!(path = %path.display(), "Updated cached repository");
        Ok(())
    }

    async fn clone_into(
        &self,
        spec: &RemoteSpec,
        cache_dir: &Path,
        path: &Path,
    ) -> Result<(), RepoError> {
        let target = path.to_string_lossy().into_owned();

        let mut args = git_args(["clone"]);
        if let Some(branch) = spec.branch.as_deref() {
            args.extend(git_args(["--branch", branch]));
        }
        args.extend(git_args(["--", spec.url.as_str(), target.as_str()]));

        info!(url = %spec.url, path = %target, "Cloning repository");

        let options = RunOptions::new().with_timeout(self.config.clone_timeout);
        if let Err(source) = self.runner.run(&args, cache_dir, options).await {
            if path.exists() {
                if let Err(e) = fs::remove_dir_all(path) {
                    warn!(path = %target, error = %e, "Failed to remove partial clone");
                }
            }
            return Err(RepoError::CloneFailed {
                url: spec.url.clone(),
                source,
            });
        }

        info!(path = %target, "Cloned repository");
        Ok(())
    }

    fn record_access(&self, path: &Path) {
        if let Err(e) = CacheEntry::touch(path) {
            warn!(path = %path.display(), error = %e, "Failed to record repository access");
        }
    }

    fn lock_for(&self, path: &Path) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        // Only the table holds an unused lock, so it is safe to forget
        locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        locks.entry(path.to_path_buf()).or_default().clone()
    }

    /// Evict checkouts unused for `max_inactive_days`.
    pub fn sweep(&self, max_inactive_days: u32, dry_run: bool) -> CleanupResult {
        sweep_cache(&self.config.cache_dir, max_inactive_days, dry_run)
    }

    /// Evict using the configured threshold
    pub fn sweep_default(&self, dry_run: bool) -> CleanupResult {
        self.sweep(self.config.cleanup_days, dry_run)
    }
}
