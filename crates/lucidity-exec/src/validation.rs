//! Syntactic checks for strings that end up on a `git` command line.
//!
//! Nothing here escapes or rewrites input. A value either passes and is used
//! verbatim, or it is rejected before any process is spawned.

use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;

/// Characters that are never allowed in an argument handed to `git`.
pub const SHELL_METACHARACTERS: [char; 7] = [';', '&', '|', '$', '`', '\n', '\r'];

lazy_static! {
    static ref SAFE_BRANCH: Regex = Regex::new(r"^[a-zA-Z0-9/_.-]+$").unwrap();
    static ref COMMIT_RANGE: Regex =
        Regex::new(r"^[a-zA-Z0-9~^./_-]+\.\.[a-zA-Z0-9~^./_-]+$").unwrap();
    static ref SAFE_REPO_NAME: Regex = Regex::new(r"^[a-zA-Z0-9_.-]+$").unwrap();
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Invalid branch name: {0}")]
    InvalidBranch(String),

    #[error("Invalid commit range: {0}")]
    InvalidCommitRange(String),

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Argument contains shell metacharacters: {0:?}")]
    UnsafeArgument(String),
}

fn has_metacharacter(value: &str) -> bool {
    value.contains(&SHELL_METACHARACTERS[..])
}

/// Check a branch name against the safe grammar.
///
/// ```
/// use lucidity_exec::is_valid_branch_name;
///
/// assert!(is_valid_branch_name("main"));
/// assert!(is_valid_branch_name("feature/my-feature"));
/// assert!(!is_valid_branch_name("../../etc/passwd"));
/// assert!(!is_valid_branch_name("--option"));
/// ```
pub fn is_valid_branch_name(branch: &str) -> bool {
    if branch.is_empty() {
        return false;
    }

    if branch.contains("..") || branch.starts_with('.') || branch.starts_with('-') {
        return false;
    }

    SAFE_BRANCH.is_match(branch)
}

/// Check a `<ref>..<ref>` commit range such as `HEAD~1..HEAD`.
pub fn is_valid_commit_range(commits: &str) -> bool {
    if commits.is_empty() || has_metacharacter(commits) || commits.starts_with('-') {
        return false;
    }

    COMMIT_RANGE.is_match(commits)
}

/// Check a repository-relative file path.
///
/// Backslashes are treated as separators, so `..\\secret` is rejected the
/// same way `../secret` is.
pub fn is_valid_path(path: &str) -> bool {
    if path.is_empty() {
        return false;
    }

    let normalized = path.replace('\\', "/");
    if normalized.contains("..") {
        return false;
    }

    !path.starts_with('-') && !has_metacharacter(path)
}

/// Check a name used as a single directory component under the cache root.
pub fn is_valid_repo_name(name: &str) -> bool {
    !name.is_empty() && !name.contains("..") && !name.starts_with('.') && SAFE_REPO_NAME.is_match(name)
}

/// Reject any argument carrying a shell metacharacter.
///
/// Arguments that pass are returned unchanged.
pub fn sanitize_command_args<S: AsRef<str>>(args: &[S]) -> Result<Vec<String>, ValidationError> {
    args.iter()
        .map(|arg| {
            let arg = arg.as_ref();
            if has_metacharacter(arg) {
                Err(ValidationError::UnsafeArgument(arg.to_string()))
            } else {
                Ok(arg.to_string())
            }
        })
        .collect()
}

/// Validate a branch, returning it back or a typed error.
pub fn validate_branch(branch: &str) -> Result<&str, ValidationError> {
    if is_valid_branch_name(branch) {
        Ok(branch)
    } else {
        Err(ValidationError::InvalidBranch(branch.to_string()))
    }
}

/// Validate a commit range, returning it back or a typed error.
pub fn validate_commit_range(commits: &str) -> Result<&str, ValidationError> {
    if is_valid_commit_range(commits) {
        Ok(commits)
    } else {
        Err(ValidationError::InvalidCommitRange(commits.to_string()))
    }
}

/// Validate a path and normalise its separators to `/`.
pub fn validate_path(path: &str) -> Result<String, ValidationError> {
    if is_valid_path(path) {
        Ok(path.replace('\\', "/"))
    } else {
        Err(ValidationError::InvalidPath(path.to_string()))
    }
}
