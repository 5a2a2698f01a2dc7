//! MileTracker CLI - mileage and expense tracking backend
//!
//! Usage:
//!   miletracker init                 Initialize database with sample data
//!   miletracker serve --port 8000    Start the API server
//!   miletracker status               Show database status

mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    let db_path = cli.database_path();

    match cli.command {
        Commands::Init => commands::cmd_init(&db_path),
        Commands::Serve {
            port,
            host,
            uploads_dir,
            admin,
        } => commands::cmd_serve(&db_path, &host, port, uploads_dir, admin).await,
        Commands::Status => commands::cmd_status(&db_path),
    }
}
