use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use lucidity_git::FileStatus;

const COMMIT_RANGE_HINT: &str = "If you're analyzing a remote repository, use the 'commits' \
parameter to analyze committed changes instead. Examples:\n  \
- commits='HEAD~1..HEAD' (last commit)\n  \
- commits='HEAD~5..HEAD' (last 5 commits)\n  \
- commits='abc123^..abc123' (specific commit)";

const REMOTE_FORMAT_HINT: &str = "This appears to be a local filesystem path. If lucidity is \
running on a different machine than your checkout, provide a remote repository reference \
instead:\n  \
- 'owner/repo' (default branch)\n  \
- 'owner/repo@branch-name'\n  \
- 'git@github.com:owner/repo.git@branch-name'\n\n\
In CI (GitHub Actions and the like), build the reference from the repository environment \
variables rather than passing the local checkout path.";

/// Prepared change data for one file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileAnalysis {
    pub status: FileStatus,
    pub language: String,
    pub raw_diff: String,
    pub original_code: String,
    pub modified_code: String,
}

/// The result of analyzing a workspace
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ChangeReport {
    Success {
        repository: PathBuf,
        /// Number of entries in `results`
        file_count: usize,
        /// Every file in the diff, including skipped ones
        file_list: Vec<String>,
        /// Tracked files with staged or unstaged changes
        all_changed_files: Vec<String>,
        results: IndexMap<String, FileAnalysis>,
    },
    NoChanges {
        message: String,
        file_list: Vec<String>,
    },
    Error {
        message: String,
    },
}

impl ChangeReport {
    pub fn success(
        repository: PathBuf,
        file_list: Vec<String>,
        all_changed_files: Vec<String>,
        results: IndexMap<String, FileAnalysis>,
    ) -> Self {
        Self::Success {
            repository,
            file_count: results.len(),
            file_list,
            all_changed_files,
            results,
        }
    }

    /// Nothing in the diff at all
    pub fn empty_diff(commits: Option<&str>) -> Self {
        let message = match commits {
            Some(range) => format!("No changes detected in commit range: {range}"),
            None => format!(
                "No uncommitted changes detected in the git diff.\n\n{COMMIT_RANGE_HINT}"
            ),
        };
        Self::NoChanges {
            message,
            file_list: Vec::new(),
        }
    }

    /// Diff text was present but yielded no file records
    pub fn unparseable_diff(changed_files: Vec<String>) -> Self {
        Self::NoChanges {
            message: "No parseable changes detected in the git diff".to_string(),
            file_list: changed_files,
        }
    }

    /// A workspace that could not be turned into a checkout
    pub fn inaccessible(workspace: &str, cause: &str, local_path: bool) -> Self {
        let mut message = format!("Could not access or clone repository: {workspace}\n{cause}");
        if local_path {
            message.push_str("\n\n");
            message.push_str(REMOTE_FORMAT_HINT);
        }
        Self::Error { message }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Success { .. } | Self::NoChanges { .. } => 0,
            Self::Error { .. } => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tagged_by_status() {
        let json = serde_json::to_value(ChangeReport::error("boom")).unwrap();
        assert_eq!(json["status"], "error");
        assert_eq!(json["message"], "boom");

        let json = serde_json::to_value(ChangeReport::empty_diff(Some("HEAD~1..HEAD"))).unwrap();
        assert_eq!(json["status"], "no_changes");
        assert_eq!(json["message"], "No changes detected in commit range: HEAD~1..HEAD");
        assert_eq!(json["file_list"], serde_json::json!([]));
    }

    #[test]
    fn test_working_tree_hint_mentions_commits() {
        let ChangeReport::NoChanges { message, .. } = ChangeReport::empty_diff(None) else {
            panic!("expected no_changes");
        };
        assert!(message.contains("commits='HEAD~1..HEAD'"));
    }

    #[test]
    fn test_local_path_guidance_only_for_paths() {
        let ChangeReport::Error { message } =
            ChangeReport::inaccessible("/github/workspace", "missing", true)
        else {
            panic!("expected error");
        };
        assert!(message.contains("'owner/repo@branch-name'"));

        let ChangeReport::Error { message } =
            ChangeReport::inaccessible("nonsense", "unrecognized", false)
        else {
            panic!("expected error");
        };
        assert!(!message.contains("owner/repo"));
    }

    #[test]
    fn test_success_counts_results() {
        let mut results = IndexMap::new();
        results.insert(
            "src/lib.rs".to_string(),
            FileAnalysis {
                status: FileStatus::Added,
                language: "rust".to_string(),
                raw_diff: String::new(),
                original_code: String::new(),
                modified_code: "fn main() {}".to_string(),
            },
        );
        let report = ChangeReport::success(
            PathBuf::from("/repo"),
            vec!["src/lib.rs".to_string(), "Cargo.lock".to_string()],
            vec![],
            results,
        );

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["status"], "success");
        assert_eq!(json["file_count"], 1);
        assert_eq!(json["results"]["src/lib.rs"]["status"], "added");
        assert_eq!(report.exit_code(), 0);
    }
}
