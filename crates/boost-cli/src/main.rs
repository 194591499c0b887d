//! `boost` command-line entry point

use anyhow::Result;
use boost_cli::commands::{check_config, replay};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "boost")]
#[command(about = "Boost authorization service tooling", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file path; defaults plus `BOOST_*` overrides when absent
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate the configuration and print the effective values
    CheckConfig,

    /// Replay a JSON scenario script against an in-memory service
    Replay {
        /// Script path
        script: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(log_level)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::CheckConfig => check_config::run(cli.config.as_deref())?,
        Commands::Replay { script } => replay::run(&script, cli.config.as_deref()).await?,
    }

    Ok(())
}
