//! Database access layer with connection pooling and migrations
//!
//! This module is organized by domain:
//! - `trips` - Trip CRUD and the denormalized stats cache
//! - `receipts` - Receipt rows for uploaded images
//! - `locations` - Append-only GPS pings
//! - `routes` - Ordered per-trip route points
//! - `accounts` - Linked financial accounts (provider integration)

use chrono::{DateTime, Utc};
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use tracing::info;

use crate::error::Result;
use crate::models::{NewRoutePoint, NewTrip, TableCount, TripType};

mod accounts;
mod locations;
mod receipts;
mod routes;
mod trips;

pub type DbPool = Pool<SqliteConnectionManager>;
pub type DbConn = PooledConnection<SqliteConnectionManager>;

/// Parse a SQLite datetime string into a DateTime<Utc>
pub(crate) fn parse_datetime(s: &str) -> DateTime<Utc> {
    // SQLite stores as "YYYY-MM-DD HH:MM:SS" format
    chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .map(|dt| dt.and_utc())
        .unwrap_or_else(|_| Utc::now())
}

/// Format a DateTime<Utc> the way SQLite's CURRENT_TIMESTAMP does
pub(crate) fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Database wrapper with connection pooling
#[derive(Clone)]
pub struct Database {
    pool: DbPool,
    /// Path to the database file
    db_path: String,
}

impl Database {
    /// Create a new database connection pool and run migrations
    pub fn new(path: &str) -> Result<Self> {
        let manager = SqliteConnectionManager::file(path).with_init(|conn| {
            conn.execute_batch("PRAGMA foreign_keys = ON;")?;
            Ok(())
        });
        let pool = Pool::builder().max_size(10).build(manager)?;

        let db = Self {
            pool,
            db_path: path.to_string(),
        };
        db.run_migrations()?;

        Ok(db)
    }

    /// Get the path to the database file
    pub fn path(&self) -> &str {
        &self.db_path
    }

    /// Create a throwaway database (for testing)
    ///
    /// Note: Uses a temporary file rather than `:memory:` because each pooled
    /// connection would otherwise see its own empty in-memory database.
    pub fn in_memory() -> Result<Self> {
        use std::sync::atomic::{AtomicU64, Ordering};
        static COUNTER: AtomicU64 = AtomicU64::new(0);

        let id = COUNTER.fetch_add(1, Ordering::SeqCst);
        let path = format!(
            "{}/miletracker_test_{}_{}.db",
            std::env::temp_dir().display(),
            std::process::id(),
            id
        );

        // Remove any existing file
        let _ = std::fs::remove_file(&path);

        Self::new(&path)
    }

    /// Get a connection from the pool
    pub fn conn(&self) -> Result<DbConn> {
        Ok(self.pool.get()?)
    }

    /// Run database migrations
    fn run_migrations(&self) -> Result<()> {
        let conn = self.conn()?;

        conn.execute_batch(
            r#"
            -- Enable foreign keys
            PRAGMA foreign_keys = ON;

            -- WAL mode: readers don't block writers
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;

            -- Users (single seeded local user; auth hardening out of scope)
            CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY,
                email TEXT NOT NULL UNIQUE,
                password_hash TEXT,
                first_name TEXT,
                last_name TEXT,
                is_active BOOLEAN DEFAULT 1,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
                updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
            );

            -- Trips (one row per recorded drive; date/times are client strings)
            CREATE TABLE IF NOT EXISTS trips (
                id INTEGER PRIMARY KEY,
                date TEXT NOT NULL,
                start_time TEXT NOT NULL,
                end_time TEXT NOT NULL,
                start_location TEXT NOT NULL,
                end_location TEXT NOT NULL,
                distance REAL NOT NULL,
                potential REAL NOT NULL,
                type TEXT NOT NULL,                        -- 'personal' or 'business'
                notes TEXT DEFAULT '',
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
                updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
            );

            -- Receipts (uploaded images, keyed by generated uuid)
            CREATE TABLE IF NOT EXISTS receipts (
                id TEXT PRIMARY KEY,
                url TEXT NOT NULL,
                name TEXT NOT NULL,
                date DATETIME NOT NULL,
                trip_id INTEGER REFERENCES trips(id) ON DELETE SET NULL,
                file_size INTEGER,
                mime_type TEXT,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
                updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
            );

            CREATE INDEX IF NOT EXISTS idx_receipts_trip ON receipts(trip_id);

            -- Locations (append-only GPS pings from the tracking client)
            CREATE TABLE IF NOT EXISTS locations (
                id INTEGER PRIMARY KEY,
                latitude REAL NOT NULL,
                longitude REAL NOT NULL,
                timestamp_ms INTEGER NOT NULL,             -- unix millis
                accuracy REAL,
                altitude REAL,
                speed REAL,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            );

            CREATE INDEX IF NOT EXISTS idx_locations_timestamp ON locations(timestamp_ms);

            -- Trip routes (ordered GPS samples, removed with their trip)
            CREATE TABLE IF NOT EXISTS trip_routes (
                id INTEGER PRIMARY KEY,
                trip_id INTEGER NOT NULL REFERENCES trips(id) ON DELETE CASCADE,
                latitude REAL NOT NULL,
                longitude REAL NOT NULL,
                timestamp_ms INTEGER,
                sequence_order INTEGER NOT NULL,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            );

            CREATE INDEX IF NOT EXISTS idx_trip_routes_trip ON trip_routes(trip_id);

            -- Trip stats cache (single row, id = 1, recomputed on every trip mutation)
            CREATE TABLE IF NOT EXISTS trip_stats (
                id INTEGER PRIMARY KEY,
                total_drives INTEGER DEFAULT 0,
                total_miles REAL DEFAULT 0,
                total_logged REAL DEFAULT 0,
                business_miles REAL DEFAULT 0,
                personal_miles REAL DEFAULT 0,
                updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
            );

            -- Linked financial accounts (provider integration)
            CREATE TABLE IF NOT EXISTS plaid_accounts (
                id INTEGER PRIMARY KEY,
                user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                access_token TEXT NOT NULL,
                item_id TEXT NOT NULL,
                account_id TEXT NOT NULL,
                account_name TEXT,
                institution_name TEXT,
                account_type TEXT,
                account_subtype TEXT,
                mask TEXT,
                is_active BOOLEAN DEFAULT 1,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
                updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
            );

            CREATE INDEX IF NOT EXISTS idx_plaid_accounts_user ON plaid_accounts(user_id, is_active);
            "#,
        )?;

        // Default local user for the single-user deployment
        conn.execute(
            "INSERT OR IGNORE INTO users (id, email) VALUES (1, 'local@miletracker')",
            [],
        )?;

        info!("Database schema initialized");
        Ok(())
    }

    /// Insert sample trips, route points, and a stats row if the trips table
    /// is empty. Returns whether anything was seeded.
    pub fn seed_sample_data(&self) -> Result<bool> {
        {
            let conn = self.conn()?;
            let count: i64 = conn.query_row("SELECT COUNT(*) FROM trips", [], |row| row.get(0))?;
            if count > 0 {
                return Ok(false);
            }
        }

        let sample_trips = [
            NewTrip {
                date: "WED 27".to_string(),
                start_time: "3:20 PM".to_string(),
                end_time: "4:05 PM".to_string(),
                start_location: "Home".to_string(),
                end_location: "Work".to_string(),
                distance: 2.5,
                potential: 1.34,
                trip_type: TripType::Business,
                notes: String::new(),
            },
            NewTrip {
                date: "THU 28".to_string(),
                start_time: "1:15 PM".to_string(),
                end_time: "2:10 PM".to_string(),
                start_location: "Work".to_string(),
                end_location: "Client Meeting".to_string(),
                distance: 3.1,
                potential: 1.66,
                trip_type: TripType::Business,
                notes: String::new(),
            },
        ];

        let sample_route: Vec<NewRoutePoint> = [
            (28.3289978, -81.4928141),
            (28.3279107, -81.4928196),
            (28.3294731, -81.4929894),
            (28.3292194, -81.4939528),
            (28.3291996, -81.4945516),
            (28.3291808, -81.4949539),
            (28.3293274, -81.495393),
            (28.3293372, -81.495501),
            (28.3300992, -81.4952811),
            (28.3307153, -81.4953258),
            (28.3315591, -81.495316),
        ]
        .iter()
        .map(|&(latitude, longitude)| NewRoutePoint {
            latitude,
            longitude,
            timestamp_ms: None,
        })
        .collect();

        for new_trip in &sample_trips {
            let trip = self.create_trip(new_trip)?;
            self.add_route_points(trip.id, &sample_route)?;
        }

        // Seeded headline numbers match the demo client
        let conn = self.conn()?;
        conn.execute(
            "INSERT OR REPLACE INTO trip_stats (id, total_drives, total_miles, total_logged)
             VALUES (1, 89, 732, 385)",
            [],
        )?;

        info!("Seeded sample data");
        Ok(true)
    }

    /// Wipe all user data and re-seed the sample set
    pub fn reset_database(&self) -> Result<()> {
        {
            let conn = self.conn()?;
            conn.execute_batch(
                "DELETE FROM trip_routes;
                 DELETE FROM locations;
                 DELETE FROM receipts;
                 DELETE FROM trips;
                 DELETE FROM trip_stats;
                 DELETE FROM plaid_accounts;",
            )?;
        }

        self.seed_sample_data()?;
        info!("Database reset");
        Ok(())
    }

    /// List user tables with their row counts (admin introspection)
    pub fn table_counts(&self) -> Result<Vec<TableCount>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT name FROM sqlite_master
             WHERE type = 'table' AND name NOT LIKE 'sqlite_%'
             ORDER BY name",
        )?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let mut counts = Vec::with_capacity(names.len());
        for name in names {
            // Table names come from sqlite_master, not user input
            let count: i64 =
                conn.query_row(&format!("SELECT COUNT(*) FROM \"{}\"", name), [], |row| {
                    row.get(0)
                })?;
            counts.push(TableCount { name, count });
        }

        Ok(counts)
    }
}

#[cfg(test)]
mod tests;
