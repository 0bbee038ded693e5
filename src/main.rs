use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use quiver_core::{App, resolve_config_path};
use quiver_resources::ResourceKind;

mod output;
mod resources;
mod sources;

use output::Output;

static EMBEDDED_CATALOG: &[(&str, &[u8])] =
    include!(concat!(env!("OUT_DIR"), "/embedded_catalog.rs"));

/// Install personas, skills and slash commands, and sync skills from git sources
#[derive(Parser)]
#[command(name = "quiver", version)]
struct Cli {
    /// Config file (default: $QUIVER_CONFIG, then config/default.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Machine-readable JSON on stdout
    #[arg(long, global = true)]
    json: bool,

    /// Debug logging and full error chains
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Agent personas
    Agents {
        #[command(subcommand)]
        action: ResourceAction,
    },
    /// Skills (directories with a SKILL.md manifest)
    Skills {
        #[command(subcommand)]
        action: ResourceAction,
    },
    /// Slash commands
    Commands {
        #[command(subcommand)]
        action: ResourceAction,
    },
    /// External git repositories that supply skills
    Source {
        #[command(subcommand)]
        action: SourceAction,
    },
}

#[derive(Subcommand)]
pub(crate) enum ResourceAction {
    /// Bundled, project and global resources
    List {
        /// Skip the project scope
        #[arg(long)]
        global: bool,
        #[arg(long)]
        category: Option<String>,
    },
    /// Install from the catalog, with dependencies
    Add {
        name: String,
        /// Install into the global scope
        #[arg(long)]
        global: bool,
        /// Replace an existing install
        #[arg(long)]
        force: bool,
        /// Report the target without writing
        #[arg(long)]
        dry_run: bool,
        #[arg(long)]
        skip_deps: bool,
    },
    /// Delete an installed copy
    Remove {
        name: String,
        /// Only look in the global scope
        #[arg(long)]
        global: bool,
    },
    /// Search the catalog
    Search { query: String },
    /// Catalog entry and installed copies
    Info { name: String },
}

#[derive(Subcommand)]
pub(crate) enum SourceAction {
    /// Register a repository
    Add {
        url: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        branch: Option<String>,
        #[arg(long)]
        skills_dir: Option<String>,
    },
    /// Unregister a repository
    Remove {
        name: String,
        /// Also delete the local clone
        #[arg(long)]
        delete_clone: bool,
    },
    /// Configured sources and their state
    List,
    /// Clone or fast-forward sources
    Pull { name: Option<String> },
    /// Copy source skills into the catalog and rebuild its index
    Sync {
        name: Option<String>,
        #[arg(long)]
        dry_run: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let verbose = cli.verbose;
    init_subscriber(verbose);

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            if verbose {
                eprintln!("error: {e:#}");
            } else {
                eprintln!("error: {e}");
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let config_path = resolve_config_path(cli.config.as_deref());
    tracing::debug!(path = %config_path.display(), "loading config");
    let app = App::from_path(config_path, EMBEDDED_CATALOG)?;
    let out = Output::new(cli.json);

    match cli.command {
        Command::Agents { action } => {
            resources::run(&app, ResourceKind::Persona, action, &out).await
        }
        Command::Skills { action } => resources::run(&app, ResourceKind::Skill, action, &out).await,
        Command::Commands { action } => {
            resources::run(&app, ResourceKind::Command, action, &out).await
        }
        Command::Source { action } => sources::run(&app, action, &out).await,
    }
}

fn init_subscriber(verbose: bool) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let default = if verbose { "debug" } else { "warn" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default));
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .init();
}
