//! CLI argument definitions.

use clap::{Parser, Subcommand};

use crate::commands::ProcessCmd;

#[derive(Parser)]
#[command(name = "pkga")]
#[command(about = "pkg-analyzer - analyzes and scores registry packages")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Analyze and score a single package
    Process(ProcessCmd),
}

impl Command {
    pub async fn execute(&self) -> anyhow::Result<()> {
        match self {
            Command::Process(cmd) => cmd.run().await,
        }
    }
}
