//! skylift command-line tool.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

mod commands;
mod output;
mod prompt;

#[derive(Parser)]
#[command(name = "skylift")]
#[command(about = "Deploy and redeploy applications across clusters", long_about = None)]
#[command(version)]
struct Cli {
    /// Client configuration file
    #[arg(long, global = true, env = skylift_config::CONFIG_ENV)]
    config: Option<PathBuf>,

    /// Affiliation to deploy from, instead of the configured one
    #[arg(long, global = true, env = "SKYLIFT_AFFILIATION")]
    affiliation: Option<String>,

    /// Token used for every cluster instead of the configured ones
    #[arg(long, global = true, env = "SKYLIFT_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Log what is happening to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format for reports and listings
    #[arg(long, global = true, value_enum, default_value_t = Format::Table)]
    format: Format,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    Table,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Deploy applications from their stored configuration
    Deploy {
        #[command(flatten)]
        select: SelectArgs,

        /// Override a configuration file for this deploy: [env/]file:<json>
        #[arg(short, long = "override", value_name = "FILE:JSON")]
        overrides: Vec<String>,
    },
    /// Redeploy running applications without changing configuration
    Redeploy {
        #[command(flatten)]
        select: SelectArgs,
    },
    /// List applications in the affiliation
    Apps {
        /// Only list applications containing this text
        term: Option<String>,
    },
    /// List configured clusters
    Clusters,
}

/// Arguments shared by deploy and redeploy.
#[derive(clap::Args, Debug)]
pub struct SelectArgs {
    /// Applications or environments to select, matched as `env/app` substrings
    #[arg(required = true, value_name = "TERM")]
    terms: Vec<String>,

    /// Accept every match of a term instead of requiring a unique one
    #[arg(long)]
    all: bool,

    /// Drop matches of this regular expression; may be repeated
    #[arg(short, long = "exclude", value_name = "REGEX")]
    excludes: Vec<String>,

    /// Only deploy to this cluster
    #[arg(short, long)]
    cluster: Option<String>,

    /// Do not ask for confirmation
    #[arg(short, long)]
    yes: bool,
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "warn,skylift=debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let global = commands::Global {
        config: cli.config,
        affiliation: cli.affiliation,
        token: cli.token,
        format: cli.format,
    };

    match cli.command {
        Commands::Deploy { select, overrides } => {
            commands::deploy::deploy(&global, select, overrides).await
        }
        Commands::Redeploy { select } => commands::deploy::redeploy(&global, select).await,
        Commands::Apps { term } => commands::list::apps(&global, term).await,
        Commands::Clusters => commands::list::clusters(&global),
    }
}
