//! Kinship CLI - Command-line interface for the kinship relationship store.

use clap::Parser;
use kinship_cli::commands;
use kinship_cli::{Cli, Config, Formatter};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> kinship_cli::Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(db) = cli.db {
        config.kinship.db_path = db;
    }
    if cli.no_graph {
        config.kinship.graph_enabled = false;
    }

    // Logs go to stderr so table and JSON output stay clean
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.kinship.log_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let format = cli.format.map(Into::into).unwrap_or(config.output.format);
    let color_enabled = !cli.no_color && config.output.color;
    let formatter = Formatter::new(format, color_enabled);

    commands::execute(cli.command, &config, cli.config.as_deref(), &formatter).await
}
