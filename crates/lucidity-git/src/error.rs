use std::path::PathBuf;
use thiserror::Error;

use lucidity_exec::{CommandError, ValidationError};

#[derive(Error, Debug)]
pub enum RepoError {
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Not a recognizable repository reference: {0}")]
    Unresolvable(String),

    #[error("Path does not exist on this machine: {}", .0.display())]
    MissingLocalPath(PathBuf),

    #[error("Not a git repository: {}", .0.display())]
    NotARepo(PathBuf),

    #[error("Failed to clone {url}: {source}")]
    CloneFailed {
        url: String,
        #[source]
        source: CommandError,
    },

    #[error("Failed to update repository at {}: {source}", .path.display())]
    UpdateFailed {
        path: PathBuf,
        #[source]
        source: CommandError,
    },

    #[error("Git command failed: {0}")]
    CommandFailed(#[from] CommandError),

    #[error("Git operation failed: {0}")]
    GitOperationFailed(#[from] git2::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Coarse classification of a [`RepoError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad branch/commit range/path/argument; no process was started
    Validation,
    /// Identifier is neither a local path nor a remote reference
    Resolution,
    /// Local path missing or not a checkout
    Access,
    /// `git` exited nonzero or failed to start
    Command,
    /// `git` exceeded its time bound
    Timeout,
    Io,
}

impl RepoError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RepoError::Validation(_) => ErrorKind::Validation,
            RepoError::Unresolvable(_) => ErrorKind::Resolution,
            RepoError::MissingLocalPath(_) | RepoError::NotARepo(_) => ErrorKind::Access,
            RepoError::CloneFailed { source, .. }
            | RepoError::UpdateFailed { source, .. }
            | RepoError::CommandFailed(source) => command_kind(source),
            RepoError::GitOperationFailed(_) => ErrorKind::Command,
            RepoError::IoError(_) => ErrorKind::Io,
        }
    }
}

fn command_kind(err: &CommandError) -> ErrorKind {
    match err {
        CommandError::Validation(_) => ErrorKind::Validation,
        CommandError::Timeout { .. } => ErrorKind::Timeout,
        CommandError::Failed { .. } | CommandError::SpawnFailed(_) => ErrorKind::Command,
    }
}
