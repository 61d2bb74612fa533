use anyhow::Result;
use colored::Colorize;
use std::process::ExitCode;
use std::sync::Arc;

use lucidity_core::{ChangeAnalyzer, ChangeRequest};
use lucidity_exec::GitCommandRunner;
use lucidity_git::{resolve, RepositoryCache, ResolvedWorkspace};

use crate::config::Settings;

pub async fn handle_analyze_command(
    request: ChangeRequest,
    pretty: bool,
    settings: &Settings,
) -> Result<ExitCode> {
    let runner = Arc::new(GitCommandRunner::new(settings.command_config()));
    let cache = RepositoryCache::new(settings.cache_config(), runner);
    let analyzer = ChangeAnalyzer::new(Arc::new(cache))
        .with_min_code_change_bytes(settings.min_code_change_bytes);

    let report = analyzer.analyze(&request).await;

    let json = if pretty {
        serde_json::to_string_pretty(&report)?
    } else {
        serde_json::to_string(&report)?
    };
    println!("{}", json);

    Ok(if report.exit_code() == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

pub fn handle_resolve_command(identifier: &str, json: bool) -> Result<ExitCode> {
    let resolved = resolve(identifier);

    if json {
        println!("{}", serde_json::to_string_pretty(&resolved)?);
    } else {
        match &resolved {
            ResolvedWorkspace::Local { path } => {
                println!("{} {}", "local".green(), path.display());
            }
            ResolvedWorkspace::Remote(spec) => {
                println!("{} {}", "remote".cyan(), spec.url);
                println!("  {} {}", "name:".dimmed(), spec.name);
                if let Some(branch) = &spec.branch {
                    println!("  {} {}", "branch:".dimmed(), branch);
                }
            }
            ResolvedWorkspace::Unresolvable => {
                println!("{} {}", "unresolvable".red(), identifier);
            }
        }
    }

    Ok(match resolved {
        ResolvedWorkspace::Unresolvable => ExitCode::FAILURE,
        _ => ExitCode::SUCCESS,
    })
}
