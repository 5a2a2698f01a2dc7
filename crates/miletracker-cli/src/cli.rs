//! CLI argument definitions using clap
//!
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// MileTracker - mileage and expense tracking backend
#[derive(Parser)]
#[command(name = "miletracker")]
#[command(about = "Self-hosted mileage and expense tracking backend", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Database path (falls back to MILETRACKER_DB, then miletracker.db)
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Resolve the database path: --db flag, then MILETRACKER_DB, then the
    /// default next to the working directory.
    pub fn database_path(&self) -> PathBuf {
        if let Some(db) = &self.db {
            return db.clone();
        }
        std::env::var("MILETRACKER_DB")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("miletracker.db"))
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the database with sample data
    Init,

    /// Start the web server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "8000")]
        port: u16,

        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Directory to store uploaded receipt images (default: ./uploads)
        #[arg(long)]
        uploads_dir: Option<PathBuf>,

        /// Enable the unauthenticated admin endpoints
        ///
        /// WARNING: Do not use this flag when exposing the server to a network.
        #[arg(long)]
        admin: bool,
    },

    /// Show database status
    Status,
}
