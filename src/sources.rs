//! `source` handlers.

use std::process::ExitCode;

use quiver_core::App;
use quiver_sources::{AddSourceOptions, PullReport, SourceFailure, SyncOptions, SyncReport};

use crate::SourceAction;
use crate::output::Output;

pub async fn run(app: &App, action: SourceAction, out: &Output) -> anyhow::Result<ExitCode> {
    let sync = app.synchronizer()?;
    match action {
        SourceAction::Add {
            url,
            name,
            branch,
            skills_dir,
        } => {
            let source = sync.add_source(
                &url,
                &AddSourceOptions {
                    name,
                    branch,
                    skills_dir,
                },
            )?;
            out.emit(&source, || {
                println!(
                    "Added source '{}' ({} @ {}, skills in '{}')",
                    source.name,
                    source.url,
                    source.branch,
                    source.skills_dir
                );
                println!("Run `quiver source pull {}` to clone it", source.name);
            })?;
        }
        SourceAction::Remove { name, delete_clone } => {
            let removed = sync.remove_source(&name, delete_clone)?;
            out.emit(&removed, || {
                println!("Removed source '{}'", removed.name);
            })?;
        }
        SourceAction::List => {
            let sources = sync.sources()?;
            out.emit(&sources, || {
                if sources.is_empty() {
                    println!("No sources configured ({})", sync.sources_file().display());
                }
                for info in &sources {
                    println!(
                        "  {} [{}] {} @ {}",
                        info.config.name,
                        info.status,
                        info.config.url,
                        info.config.branch
                    );
                }
            })?;
        }
        SourceAction::Pull { name } => {
            let report = sync.pull_all(name.as_deref()).await?;
            out.emit(&report, || print_pull(&report))?;
            if !report.is_success() {
                return Ok(ExitCode::FAILURE);
            }
        }
        SourceAction::Sync { name, dry_run } => {
            let report = sync.sync_all(&SyncOptions {
                filter: name,
                dry_run,
            })?;
            out.emit(&report, || print_sync(&report))?;
            if !report.is_success() {
                return Ok(ExitCode::FAILURE);
            }
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn print_failures(failures: &[SourceFailure]) {
    for failure in failures {
        println!("  ! {}: {}", failure.source, failure.reason);
    }
}

fn print_pull(report: &PullReport) {
    for name in &report.succeeded {
        println!("  updated {name}");
    }
    print_failures(&report.failed);
    println!(
        "{} updated, {} failed",
        report.succeeded.len(),
        report.failed.len()
    );
}

fn print_sync(report: &SyncReport) {
    let prefix = if report.dry_run { "[dry run] " } else { "" };
    for name in &report.skipped {
        println!("  skipped {name} (not cloned)");
    }
    for name in &report.overwritten {
        println!("  replaced manual entry '{name}'");
    }
    for name in &report.pruned {
        println!("  pruned '{name}'");
    }
    print_failures(&report.errors);
    println!(
        "{prefix}{} added, {} updated, {} skills indexed from sources",
        report.added.len(),
        report.updated.len(),
        report.total
    );
}
