use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use db::open;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

mod cli;
mod commands;
mod db;
mod models;
mod store;
mod tracker;
mod types;
mod utils;

/// Output mode selected by the global `--json` flag.
#[derive(Clone, Copy, PartialEq, Eq)]
pub enum OutputFmt {
    Plain,
    Json,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Quiet unless RUST_LOG says otherwise; normal output stays clean.
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let fmt = if cli.json {
        OutputFmt::Json
    } else {
        OutputFmt::Plain
    };

    let cfg = types::Config::load()?;
    let db_path = cfg.database().to_string();
    assert!(!db_path.is_empty(), "database path must not be empty");

    let pool = open(&db_path).await?;

    match cli.cmd {
        Commands::Session(cmd) => commands::session::handle(cmd, &pool, fmt).await?,
        Commands::Workout(cmd) => commands::workout::handle(cmd, &pool, fmt).await?,
        Commands::Config(cmd) => commands::config::handle(cmd).await?,
    }

    Ok(())
}
