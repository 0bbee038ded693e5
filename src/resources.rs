//! `agents`, `skills` and `commands` handlers.

use std::process::ExitCode;

use quiver_core::App;
use quiver_resources::{
    AddOptions, DependencyOutcome, ListOptions, RemoveOptions, Resource, ResourceKind,
};

use crate::ResourceAction;
use crate::output::{Output, print_rows};

pub async fn run(
    app: &App,
    kind: ResourceKind,
    action: ResourceAction,
    out: &Output,
) -> anyhow::Result<ExitCode> {
    let resolver = || app.resolver(kind);
    match action {
        ResourceAction::List { global, category } => {
            let listing = resolver()?.list(&ListOptions { global, category }).await?;
            out.emit(&listing, || {
                print_section(&format!("Bundled {kind}s"), &listing.bundled);
                if !global {
                    print_section(&format!("Project {kind}s"), &listing.project);
                }
                print_section(&format!("Global {kind}s"), &listing.global);
            })?;
        }
        ResourceAction::Add {
            name,
            global,
            force,
            dry_run,
            skip_deps,
        } => {
            let outcome = resolver()?.add(
                &name,
                &AddOptions {
                    global,
                    force,
                    dry_run,
                    skip_deps,
                    quiet: false,
                },
            )?;
            out.emit(&outcome, || {
                let verb = if outcome.dry_run { "Would install" } else { "Installed" };
                println!("{verb} {kind} '{}' at {}", outcome.name, outcome.target.display());
                for dep in &outcome.dependencies {
                    match dep {
                        DependencyOutcome::Installed { name, target } => {
                            println!("  + dependency '{name}' at {}", target.display());
                        }
                        DependencyOutcome::AlreadyInstalled { name } => {
                            println!("  = dependency '{name}' already installed");
                        }
                        DependencyOutcome::Failed { name, reason } => {
                            println!("  ! dependency '{name}' failed: {reason}");
                        }
                    }
                }
            })?;
            if outcome.has_failed_dependencies() {
                return Ok(ExitCode::FAILURE);
            }
        }
        ResourceAction::Remove { name, global } => {
            let path = resolver()?.remove(&name, &RemoveOptions { global })?;
            out.emit(&serde_json::json!({ "removed": name, "path": path }), || {
                println!("Removed {kind} '{name}' from {}", path.display());
            })?;
        }
        ResourceAction::Search { query } => {
            let hits = app.catalog().search(kind, &query);
            out.emit(&hits, || {
                if hits.is_empty() {
                    println!("No {kind}s match '{query}'");
                }
                print_rows(
                    hits.iter()
                        .map(|e| (e.name.as_str(), e.description.as_deref().unwrap_or(""))),
                );
            })?;
        }
        ResourceAction::Info { name } => {
            let info = resolver()?.info(&name)?;
            out.emit(&info, || {
                println!("{kind} '{name}'");
                if let Some(resource) = info.bundled.as_ref() {
                    print_details(resource);
                } else if let Some(entry) = info.entry.as_ref() {
                    println!("  catalog:  {} (template unreadable)", entry.path);
                } else {
                    println!("  catalog:  not bundled");
                }
                if info.installed.is_empty() {
                    println!("  installed: no");
                }
                for copy in &info.installed {
                    println!("  installed ({}): {}", copy.scope, copy.path.display());
                }
            })?;
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn print_section(title: &str, resources: &[Resource]) {
    println!("{title} ({}):", resources.len());
    print_rows(
        resources
            .iter()
            .map(|r| (r.name.as_str(), r.description.as_str())),
    );
}

fn print_details(resource: &Resource) {
    if !resource.description.is_empty() {
        println!("  {}", resource.description);
    }
    if let Some(category) = resource.category() {
        println!("  category: {category}");
    }
    if !resource.dependencies().is_empty() {
        println!("  depends on: {}", resource.dependencies().join(", "));
    }
    for file in resource.files() {
        println!("  file: {}", file.display());
    }
}
