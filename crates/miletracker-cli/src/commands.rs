//! CLI command implementations

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use miletracker_core::db::Database;
use miletracker_server::ServerConfig;

/// Open the database, creating the schema if needed
pub fn open_db(db_path: &Path) -> Result<Database> {
    let path_str = db_path
        .to_str()
        .context("Database path is not valid UTF-8")?;
    Database::new(path_str).context("Failed to open database")
}

pub fn cmd_init(db_path: &Path) -> Result<()> {
    println!("🔧 Initializing database at {}...", db_path.display());

    let db = open_db(db_path)?;

    if db.seed_sample_data().context("Failed to seed sample data")? {
        println!("   Seeded sample trips and route data");
    } else {
        println!("   Database already has trips, skipping sample data");
    }

    println!("✅ Database initialized successfully!");
    println!();
    println!("Next steps:");
    println!("  1. Start the server: miletracker serve");
    println!("  2. Point the mobile client at http://127.0.0.1:8000");

    Ok(())
}

pub async fn cmd_serve(
    db_path: &Path,
    host: &str,
    port: u16,
    uploads_dir: Option<PathBuf>,
    admin: bool,
) -> Result<()> {
    println!("🚀 Starting MileTracker server...");
    println!("   Database: {}", db_path.display());
    println!("   Listening: http://{}:{}", host, port);
    if let Some(dir) = &uploads_dir {
        println!("   Uploads: {}", dir.display());
    }
    if admin {
        println!();
        println!("   ⚠️  WARNING: Admin endpoints enabled!");
        println!("   ⚠️  Anyone who can reach this server can reset the database.");
    }

    let db = open_db(db_path)?;

    let config = ServerConfig {
        enable_admin: admin,
        allowed_origins: vec![],
    };

    miletracker_server::serve(db, host, port, config, uploads_dir).await
}

pub fn cmd_status(db_path: &Path) -> Result<()> {
    use std::fs;

    println!();
    println!("📊 MileTracker Status");
    println!("   ─────────────────────────────────────────────");
    println!("   Database: {}", db_path.display());

    if db_path.exists() {
        if let Ok(metadata) = fs::metadata(db_path) {
            let size_kb = metadata.len() as f64 / 1024.0;
            if size_kb < 1024.0 {
                println!("   Size: {:.1} KB", size_kb);
            } else {
                println!("   Size: {:.1} MB", size_kb / 1024.0);
            }
        }
    } else {
        println!("   Size: (database not initialized)");
        println!();
        println!("   Run 'miletracker init' to create it.");
        return Ok(());
    }

    let db = open_db(db_path)?;
    println!();
    for table in db.table_counts().context("Failed to read table counts")? {
        println!("   {:<16} {:>6} rows", table.name, table.count);
    }
    println!();

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_init_seeds_once() {
        let dir = TempDir::new().unwrap();
        let db_path = dir.path().join("test.db");

        cmd_init(&db_path).unwrap();

        let db = open_db(&db_path).unwrap();
        assert_eq!(db.list_trips().unwrap().len(), 2);

        // Running init again leaves the data alone
        cmd_init(&db_path).unwrap();
        let db = open_db(&db_path).unwrap();
        assert_eq!(db.list_trips().unwrap().len(), 2);
    }

    #[test]
    fn test_status_on_missing_db_is_ok() {
        let dir = TempDir::new().unwrap();
        let db_path = dir.path().join("missing.db");

        cmd_status(&db_path).unwrap();
        assert!(!db_path.exists());
    }
}
