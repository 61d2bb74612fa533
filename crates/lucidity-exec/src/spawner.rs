use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use std::time::Instant;
use tokio::process::Command;
use tracing::{debug, error, trace};

use crate::{sanitize_command_args, CommandConfig, CommandError, CommandOutput, GitRunner, RunOptions};

/// ssh invocation used when host key verification is turned off
pub const INSECURE_SSH_COMMAND: &str =
    "ssh -o StrictHostKeyChecking=no -o UserKnownHostsFile=/dev/null";

/// Runs the real `git` binary with sanitized arguments and a hard timeout
#[derive(Debug, Clone, Default)]
pub struct GitCommandRunner {
    config: CommandConfig,
}

impl GitCommandRunner {
    pub fn new(config: CommandConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CommandConfig {
        &self.config
    }

    fn build_command(&self, args: &[String], working_dir: &Path, options: &RunOptions) -> Command {
        let mut cmd = Command::new(&self.config.git_binary);
        cmd.args(args)
            .current_dir(working_dir)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .stdin(Stdio::null()) // Non-interactive
            .env("GIT_TERMINAL_PROMPT", "0")
            .kill_on_drop(true);

        // Own process group so a timeout can take down ssh/remote helpers too
        #[cfg(unix)]
        cmd.process_group(0);

        for (key, value) in &options.env {
            cmd.env(key, value);
        }

        if !self.config.verify_host_keys {
            cmd.env("GIT_SSH_COMMAND", INSECURE_SSH_COMMAND);
            trace!("SSH host key verification disabled");
        }

        cmd
    }
}

#[async_trait]
impl GitRunner for GitCommandRunner {
    async fn run(
        &self,
        args: &[String],
        working_dir: &Path,
        options: RunOptions,
    ) -> Result<CommandOutput, CommandError> {
        let args = sanitize_command_args(args).map_err(|e| {
            error!(error = %e, "Invalid git command arguments");
            e
        })?;

        let timeout = options.timeout.unwrap_or(self.config.default_timeout);
        let start = Instant::now();

        debug!(
            args = ?args,
            working_dir = %working_dir.display(),
            timeout_secs = timeout.as_secs(),
            "Running git command"
        );

        let child = self.build_command(&args, working_dir, &options).spawn()?;
        let pid = child.id();

        let output = match tokio::time::timeout(timeout, child.wait_with_output()).await {
            Ok(result) => result?,
            Err(_) => {
                kill_process_group(pid);
                error!(
                    args = ?args,
                    timeout_secs = timeout.as_secs(),
                    "Git command timed out"
                );
                return Err(CommandError::Timeout { args, timeout });
            }
        };

        let exit_code = output.status.code().unwrap_or(-1);
        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        let duration = start.elapsed();

        if exit_code != 0 && !options.allow_failure {
            error!(args = ?args, exit_code, stderr = %stderr.trim(), "Git command failed");
            return Err(CommandError::Failed {
                args,
                stderr,
                exit_code,
            });
        }

        debug!(
            exit_code,
            stdout_bytes = stdout.len(),
            duration_ms = duration.as_millis(),
            "Git command completed"
        );

        Ok(CommandOutput::new(stdout, stderr, exit_code, duration))
    }
}

#[cfg(unix)]
fn kill_process_group(pid: Option<u32>) {
    if let Some(pid) = pid {
        // The child leads its own group (process_group(0)), so its pid is the pgid.
        // ESRCH just means everything already exited.
        unsafe {
            libc::killpg(pid as libc::pid_t, libc::SIGKILL);
        }
    }
}

#[cfg(not(unix))]
fn kill_process_group(_pid: Option<u32>) {
    // kill_on_drop already reaped the direct child
}
