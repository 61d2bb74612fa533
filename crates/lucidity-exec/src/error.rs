use std::time::Duration;
use thiserror::Error;

use crate::ValidationError;

/// Errors that can occur while running a git command
#[derive(Error, Debug)]
pub enum CommandError {
    #[error("Invalid git command arguments: {0}")]
    Validation(#[from] ValidationError),

    #[error("Failed to spawn git process: {0}")]
    SpawnFailed(#[from] std::io::Error),

    #[error("Git command failed: git {} (exit code {exit_code}): {}", .args.join(" "), .stderr.trim())]
    Failed {
        args: Vec<String>,
        stderr: String,
        exit_code: i32,
    },

    #[error("Git command timed out after {}s: git {}", .timeout.as_secs(), .args.join(" "))]
    Timeout { args: Vec<String>, timeout: Duration },
}

impl CommandError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, CommandError::Timeout { .. })
    }

    /// Captured stderr for a failed command, if any
    pub fn stderr(&self) -> Option<&str> {
        match self {
            CommandError::Failed { stderr, .. } => Some(stderr),
            _ => None,
        }
    }
}
