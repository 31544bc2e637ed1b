use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;
mod state;

use crate::{commands::Command, state::AppState};

/// Personal A-share trade journal
#[derive(Debug, Parser)]
#[command(name = "trade-journal", version)]
struct Cli {
    /// Trade data file, overrides JOURNAL_DATA_FILE
    #[arg(long, global = true)]
    data_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let state = AppState::new(cli.data_file)?;
    tracing::debug!("AppState initialized");

    cli.command.run(&state).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_data_file() {
        let cli = Cli::try_parse_from(["trade-journal", "list", "--data-file", "/tmp/t.csv", "--open"]).unwrap();
        assert_eq!(cli.data_file, Some(PathBuf::from("/tmp/t.csv")));
        assert!(matches!(cli.command, Command::List(ref args) if args.open));
    }
}
