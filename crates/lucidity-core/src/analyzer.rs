use indexmap::IndexMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

use lucidity_exec::{git_args, validate_commit_range, validate_path, GitRunner, RunOptions};
use lucidity_git::{changed_files, extract_code, looks_like_local_path, parse_diff, RepositoryCache};

use crate::error::AnalysisError;
use crate::language::{detect_language, is_excluded};
use crate::report::{ChangeReport, FileAnalysis};
use crate::request::ChangeRequest;

/// Files whose post-image is shorter than this (after trimming) are skipped
pub const DEFAULT_MIN_CODE_CHANGE_BYTES: usize = 10;

/// Turns a workspace into per-file change data.
///
/// The analyzer owns no state of its own beyond settings; checkouts come from
/// the shared [`RepositoryCache`] and every git process goes through its
/// runner.
pub struct ChangeAnalyzer {
    cache: Arc<RepositoryCache>,
    min_code_change_bytes: usize,
}

impl ChangeAnalyzer {
    pub fn new(cache: Arc<RepositoryCache>) -> Self {
        Self {
            cache,
            min_code_change_bytes: DEFAULT_MIN_CODE_CHANGE_BYTES,
        }
    }

    pub fn with_min_code_change_bytes(mut self, bytes: usize) -> Self {
        self.min_code_change_bytes = bytes;
        self
    }

    pub fn cache(&self) -> &Arc<RepositoryCache> {
        &self.cache
    }

    fn runner(&self) -> &Arc<dyn GitRunner> {
        self.cache.runner()
    }

    /// Resolve the workspace to a checkout, cloning or updating as needed.
    pub async fn prepare(&self, request: &ChangeRequest) -> Result<PathBuf, AnalysisError> {
        let workspace = request.workspace.trim();
        if workspace.is_empty() {
            return Err(AnalysisError::MissingWorkspace);
        }
        Ok(self.cache.ensure(workspace).await?)
    }

    /// Fetch `(unstaged, staged)` diff text for a checkout.
    ///
    /// With a commit range only the first element is filled. Any validation
    /// or command failure yields two empty strings.
    pub async fn collect_diff(
        &self,
        repo_path: &Path,
        path: Option<&str>,
        commits: Option<&str>,
    ) -> (String, String) {
        let filter = match path.map(validate_path).transpose() {
            Ok(filter) => filter,
            Err(e) => {
                warn!(error = %e, "Rejected path filter");
                return (String::new(), String::new());
            }
        };

        let with_filter = |mut args: Vec<String>| {
            if let Some(filter) = &filter {
                args.extend(git_args(["--", filter.as_str()]));
            }
            args
        };

        if let Some(commits) = commits {
            let range = match validate_commit_range(commits) {
                Ok(range) => range,
                Err(e) => {
                    warn!(error = %e, "Rejected commit range");
                    return (String::new(), String::new());
                }
            };

            debug!(range, "Collecting diff for commit range");
            return match self.diff(repo_path, with_filter(git_args(["diff", range]))).await {
                Some(diff) => (diff, String::new()),
                None => (String::new(), String::new()),
            };
        }

        debug!(repo = %repo_path.display(), "Collecting working tree diff");
        let unstaged = self.diff(repo_path, with_filter(git_args(["diff"]))).await;
        let staged = self
            .diff(repo_path, with_filter(git_args(["diff", "--cached"])))
            .await;

        match (unstaged, staged) {
            (Some(unstaged), Some(staged)) => (unstaged, staged),
            _ => (String::new(), String::new()),
        }
    }

    async fn diff(&self, repo_path: &Path, args: Vec<String>) -> Option<String> {
        match self.runner().run(&args, repo_path, RunOptions::new()).await {
            Ok(output) => Some(output.stdout),
            Err(e) => {
                warn!(args = ?args, error = %e, "git diff failed");
                None
            }
        }
    }

    /// Tracked files with staged or unstaged changes; empty on failure.
    pub async fn changed_files(&self, repo_path: &Path) -> Vec<String> {
        let repo_path = repo_path.to_path_buf();
        let listed = tokio::task::spawn_blocking(move || changed_files(&repo_path)).await;

        match listed {
            Ok(Ok(changed)) => changed.all(),
            Ok(Err(e)) => {
                warn!(error = %e, "Failed to list changed files");
                Vec::new()
            }
            Err(e) => {
                warn!(error = %e, "Changed file listing task failed");
                Vec::new()
            }
        }
    }

    /// Produce a report for `request`. Never fails; problems become an
    /// `error` report.
    pub async fn analyze(&self, request: &ChangeRequest) -> ChangeReport {
        info!(
            workspace = %request.workspace,
            path = ?request.path,
            commits = ?request.commits,
            "Starting change analysis"
        );

        let repo_path = match self.prepare(request).await {
            Ok(path) => path,
            Err(AnalysisError::MissingWorkspace) => {
                return ChangeReport::error(AnalysisError::MissingWorkspace.to_string());
            }
            Err(e) => {
                warn!(workspace = %request.workspace, error = %e, "Repository not accessible");
                let local = e.is_local_path_problem() || looks_like_local_path(&request.workspace);
                return ChangeReport::inaccessible(request.workspace.trim(), &e.to_string(), local);
            }
        };

        let (unstaged, staged) = self
            .collect_diff(&repo_path, request.path.as_deref(), request.commits.as_deref())
            .await;
        let all_changed_files = self.changed_files(&repo_path).await;

        let combined = match (unstaged.is_empty(), staged.is_empty()) {
            (_, true) => unstaged,
            (true, false) => staged,
            (false, false) => format!("{unstaged}\n{staged}"),
        };
        debug!(bytes = combined.len(), "Combined diff size");

        if combined.is_empty() {
            warn!(commits = ?request.commits, "No changes detected");
            return ChangeReport::empty_diff(request.commits.as_deref());
        }

        let parsed = parse_diff(&combined);
        if parsed.is_empty() {
            warn!("No parseable changes in git diff");
            return ChangeReport::unparseable_diff(all_changed_files);
        }

        info!(files = parsed.len(), "Found files with changes to analyze");

        let mut file_list = Vec::with_capacity(parsed.len());
        let mut results = IndexMap::new();

        for (filename, record) in parsed {
            file_list.push(filename.clone());

            if is_excluded(&filename) {
                debug!(file = %filename, "Skipping excluded file");
                continue;
            }

            let code = extract_code(&record);
            if code.modified.trim().len() < self.min_code_change_bytes {
                debug!(
                    file = %filename,
                    min = self.min_code_change_bytes,
                    "Skipping file with insufficient code changes"
                );
                continue;
            }

            let language = detect_language(&filename);
            debug!(file = %filename, status = %record.status, language, "Prepared file");

            results.insert(
                filename,
                FileAnalysis {
                    status: record.status,
                    language: language.to_string(),
                    raw_diff: record.raw_diff,
                    original_code: code.original,
                    modified_code: code.modified,
                },
            );
        }

        info!(processed = results.len(), "Change analysis complete");
        ChangeReport::success(repo_path, file_list, all_changed_files, results)
    }
}
