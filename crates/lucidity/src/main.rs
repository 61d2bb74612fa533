use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};

use lucidity_core::ChangeRequest;
use lucidity_logging::LogFormat;

mod analyze;
mod cleanup;
mod config;

use cleanup::CleanupArgs;
use config::Settings;

#[derive(Parser, Debug)]
#[command(
    name = "lucidity",
    about = "Fetch repositories and prepare their git changes for review",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Log level used when RUST_LOG is not set
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Log output format
    #[arg(long, global = true, value_enum, default_value = "pretty")]
    log_format: LogFormatChoice,

    /// Also write JSON logs to this file
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    /// Settings file (default: ./lucidity.toml, then the user config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Analyze staged and unstaged changes, or a commit range
    Analyze {
        /// Local path, clone URL, host/owner/repo or owner/repo, optionally @branch
        #[arg(short, long)]
        workspace: String,

        /// Only diff this repository-relative path
        #[arg(short, long)]
        path: Option<String>,

        /// Commit range such as HEAD~1..HEAD
        #[arg(short, long)]
        commits: Option<String>,

        /// Pretty-print the JSON report
        #[arg(long)]
        pretty: bool,
    },

    /// Show how a workspace identifier is interpreted
    Resolve {
        identifier: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Remove cached repositories that have not been used recently
    Cleanup(CleanupArgs),
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogFormatChoice {
    Pretty,
    Json,
    Compact,
}

impl From<LogFormatChoice> for LogFormat {
    fn from(choice: LogFormatChoice) -> Self {
        match choice {
            LogFormatChoice::Pretty => LogFormat::Pretty,
            LogFormatChoice::Json => LogFormat::Json,
            LogFormatChoice::Compact => LogFormat::Compact,
        }
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Held until exit so the file writer flushes
    let _log_guard =
        lucidity_logging::init_tracing(&cli.log_level, cli.log_format.into(), cli.log_file.as_deref())
            .context("Failed to initialize logging")?;

    let settings = Settings::load(cli.config.as_deref())?;
    tracing::debug!(?settings, "Loaded settings");

    match cli.command {
        Command::Analyze {
            workspace,
            path,
            commits,
            pretty,
        } => {
            let mut request = ChangeRequest::new(workspace);
            if let Some(path) = path {
                request = request.with_path(path);
            }
            if let Some(commits) = commits {
                request = request.with_commits(commits);
            }
            analyze::handle_analyze_command(request, pretty, &settings).await
        }
        Command::Resolve { identifier, json } => analyze::handle_resolve_command(&identifier, json),
        Command::Cleanup(args) => {
            cleanup::handle_cleanup_command(args, &settings)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}
