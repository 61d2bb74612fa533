use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::{CommandError, CommandOutput};

/// Default bound for fetch/pull/diff style commands
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(60);

/// Settings shared by every git invocation
#[derive(Debug, Clone)]
pub struct CommandConfig {
    /// Binary to execute (resolved through PATH when relative)
    pub git_binary: PathBuf,
    /// Timeout used when a call does not pass its own
    pub default_timeout: Duration,
    /// When false, ssh is told to skip host key checking
    pub verify_host_keys: bool,
}

impl Default for CommandConfig {
    fn default() -> Self {
        Self {
            git_binary: PathBuf::from("git"),
            default_timeout: DEFAULT_FETCH_TIMEOUT,
            verify_host_keys: false,
        }
    }
}

impl CommandConfig {
    pub fn new(default_timeout: Duration, verify_host_keys: bool) -> Self {
        Self {
            default_timeout,
            verify_host_keys,
            ..Default::default()
        }
    }

    pub fn with_binary(mut self, binary: impl Into<PathBuf>) -> Self {
        self.git_binary = binary.into();
        self
    }
}

/// Per-call options for [`GitRunner::run`]
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Overrides the configured default timeout
    pub timeout: Option<Duration>,
    /// Return nonzero exits as output instead of [`CommandError::Failed`]
    pub allow_failure: bool,
    /// Extra environment variables for the child
    pub env: HashMap<String, String>,
}

impl RunOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn allow_failure(mut self) -> Self {
        self.allow_failure = true;
        self
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }
}

/// Something that can run `git <args>` inside a directory.
///
/// The production implementation is [`crate::GitCommandRunner`]; tests swap
/// in scripted runners to exercise callers without touching the network.
#[async_trait]
pub trait GitRunner: Send + Sync {
    async fn run(
        &self,
        args: &[String],
        working_dir: &Path,
        options: RunOptions,
    ) -> Result<CommandOutput, CommandError>;
}

/// Build an owned argument vector from string slices
pub fn git_args<I, S>(args: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    args.into_iter().map(Into::into).collect()
}
