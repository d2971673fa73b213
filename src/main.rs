mod aggregate;
mod analysis;
mod cli;
mod commands;
mod error;
mod extract;
mod merge;
mod model;
mod prompt;
mod resolve;
mod scoring;
mod taxonomy;
mod util;

use anyhow::Result;
use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands};

fn main() {
    init_tracing();

    if let Err(err) = run() {
        error!(error = %err, "command failed");
        for cause in err.chain().skip(1) {
            error!(cause = %cause, "caused by");
        }
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Taxonomy(args) => commands::taxonomy::run(args),
        Commands::Plan(args) => commands::plan::run(args),
        Commands::Review(args) => commands::review::run(args),
        Commands::Aggregate(args) => commands::aggregate::run(args),
        Commands::Status(args) => commands::status::run(args),
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
