//! pkg-analyzer CLI - analyzes and scores registry packages.

mod cli;
mod commands;
mod fetcher;
mod metadata;
mod pipeline;
mod registry;
mod store;
mod types;

use anyhow::Result;
use clap::Parser;
use cli::Cli;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Controlled by RUST_LOG env var
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .init();

    let cli = Cli::parse();
    cli.command.execute().await
}
