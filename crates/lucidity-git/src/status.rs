use git2::{Repository, Status, StatusOptions};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;
use tracing::debug;

use crate::RepoError;

/// Tracked files with uncommitted changes
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChangedFiles {
    /// Changed in the working tree relative to the index
    pub unstaged: Vec<String>,
    /// Changed in the index relative to HEAD
    pub staged: Vec<String>,
}

impl ChangedFiles {
    pub fn is_clean(&self) -> bool {
        self.unstaged.is_empty() && self.staged.is_empty()
    }

    /// Union of staged and unstaged paths, sorted and deduplicated
    pub fn all(&self) -> Vec<String> {
        self.unstaged
            .iter()
            .chain(self.staged.iter())
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

/// List the files `git diff` and `git diff --cached` would report.
///
/// Untracked files are not included, matching what the diffs themselves show.
pub fn changed_files(repo_path: &Path) -> Result<ChangedFiles, RepoError> {
    let worktree_changes =
        Status::WT_MODIFIED | Status::WT_DELETED | Status::WT_RENAMED | Status::WT_TYPECHANGE;
    let index_changes = Status::INDEX_NEW
        | Status::INDEX_MODIFIED
        | Status::INDEX_DELETED
        | Status::INDEX_RENAMED
        | Status::INDEX_TYPECHANGE;

    let repo = Repository::open(repo_path)?;

    let mut opts = StatusOptions::new();
    opts.include_untracked(false)
        .include_ignored(false)
        .renames_head_to_index(true);

    let statuses = repo.statuses(Some(&mut opts))?;
    let mut changed = ChangedFiles::default();

    for entry in statuses.iter() {
        let Some(path) = entry.path() else {
            continue;
        };
        let st = entry.status();

        if st.intersects(worktree_changes) {
            changed.unstaged.push(path.to_string());
        }
        if st.intersects(index_changes) {
            changed.staged.push(path.to_string());
        }
    }

    changed.unstaged.sort();
    changed.staged.sort();

    debug!(
        unstaged = changed.unstaged.len(),
        staged = changed.staged.len(),
        "Collected changed files"
    );

    Ok(changed)
}
