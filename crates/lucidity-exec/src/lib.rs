//! # lucidity-exec
//!
//! The only path by which lucidity launches external processes.
//!
//! Every argument passes through [`sanitize_command_args`] before a `git`
//! process is spawned, every invocation is bounded by a timeout, and failures
//! come back as a typed [`CommandError`] instead of a raw exit status.
//!
//! ## Key Types
//!
//! - [`GitRunner`] - Seam for running `git <args>` in a directory
//! - [`GitCommandRunner`] - Production runner backed by `tokio::process`
//! - [`CommandConfig`] / [`RunOptions`] - Process-wide and per-call settings
//! - [`CommandOutput`] - Captured stdout/stderr/exit code
//!
//! ## Usage
//!
//! ```rust,ignore
//! use lucidity_exec::{git_args, CommandConfig, GitCommandRunner, GitRunner, RunOptions};
//!
//! let runner = GitCommandRunner::new(CommandConfig::default());
//! let output = runner
//!     .run(&git_args(["diff", "HEAD~1..HEAD"]), repo_path, RunOptions::new())
//!     .await?;
//! println!("{}", output.stdout);
//! ```

mod error;
mod output;
mod runner;
mod spawner;
mod validation;

pub use error::CommandError;
pub use output::CommandOutput;
pub use runner::{git_args, CommandConfig, GitRunner, RunOptions, DEFAULT_FETCH_TIMEOUT};
pub use spawner::{GitCommandRunner, INSECURE_SSH_COMMAND};
pub use validation::{
    is_valid_branch_name, is_valid_commit_range, is_valid_path, is_valid_repo_name,
    sanitize_command_args, validate_branch, validate_commit_range, validate_path,
    ValidationError, SHELL_METACHARACTERS,
};
