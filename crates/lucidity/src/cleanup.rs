use anyhow::Result;
use clap::Args;
use colored::Colorize;

use lucidity_git::{sweep_cache, CleanupResult};

use crate::config::Settings;

#[derive(Args, Debug)]
pub struct CleanupArgs {
    /// Remove repositories unused for this many days (default: from settings)
    #[arg(long)]
    days: Option<u32>,

    /// Report what would be removed without deleting anything
    #[arg(long)]
    dry_run: bool,

    /// Output as JSON
    #[arg(long)]
    json: bool,
}

pub fn handle_cleanup_command(args: CleanupArgs, settings: &Settings) -> Result<()> {
    let days = args.days.unwrap_or(settings.cleanup_days);
    let result = sweep_cache(&settings.cache_dir, days, args.dry_run);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_summary(&result, days);
    }
    Ok(())
}

fn print_summary(result: &CleanupResult, days: u32) {
    if result.scanned == 0 {
        println!(
            "{}",
            format!("No cached repositories in {}", result.cache_dir.display()).dimmed()
        );
        return;
    }

    for name in &result.repositories {
        let marker = if result.dry_run { "~" } else { "-" };
        println!("  {} {}", marker.red(), name);
    }
    println!("{}", summary_line(result, days).bold());
}

fn summary_line(result: &CleanupResult, days: u32) -> String {
    let verb = if result.dry_run { "Would remove" } else { "Removed" };
    format!(
        "{} {} of {} cached repositories idle for {}+ days ({:.2} MB)",
        verb,
        result.removed,
        result.scanned,
        days,
        result.freed_megabytes()
    )
}
