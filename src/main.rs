mod commands;
mod feed;
mod render;
mod utils;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "calsync")]
#[command(version, about = "Mirror an ICS feed into a remote calendar")]
struct Cli {
    /// Extra config file layered over ~/.config/calsync/config.toml
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log matching decisions and timezone fallbacks
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct SourceArgs {
    /// Feed URL or path (overrides feed_url from config)
    #[arg(long)]
    feed: Option<String>,

    /// Sync events from this date (YYYY-MM-DD, or "start" for no lower bound)
    #[arg(long)]
    from: Option<String>,

    /// Sync events until this date (YYYY-MM-DD, or "end" for no upper bound)
    #[arg(long)]
    to: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply feed changes to the remote calendar
    Sync {
        #[command(flatten)]
        source: SourceArgs,

        /// Show the plan without touching the remote calendar
        #[arg(long)]
        dry_run: bool,
    },
    /// Show what a sync would do
    Status {
        #[command(flatten)]
        source: SourceArgs,

        /// Print the plan as JSON
        #[arg(long)]
        json: bool,
    },
    /// List the events in the feed
    Events {
        #[command(flatten)]
        source: SourceArgs,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let ctx = commands::Context::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Sync { source, dry_run } => {
            let source = ctx.source(source.feed, source.from, source.to)?;
            commands::sync::run(&ctx, source, dry_run, cli.verbose).await
        }
        Commands::Status { source, json } => {
            let source = ctx.source(source.feed, source.from, source.to)?;
            commands::status::run(&ctx, source, json, cli.verbose).await
        }
        Commands::Events { source } => {
            let source = ctx.source(source.feed, source.from, source.to)?;
            commands::events::run(&ctx, source).await
        }
    }
}

/// Logs go to stderr; RUST_LOG wins over `-v`.
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
