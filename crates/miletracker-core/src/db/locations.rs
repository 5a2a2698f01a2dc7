//! Append-only GPS location pings

use rusqlite::{params, Row};

use super::{parse_datetime, Database};
use crate::error::{Error, Result};
use crate::models::{LocationPing, NewLocationPing};

fn ping_from_row(row: &Row<'_>) -> rusqlite::Result<LocationPing> {
    let created_at: String = row.get(7)?;
    Ok(LocationPing {
        id: row.get(0)?,
        latitude: row.get(1)?,
        longitude: row.get(2)?,
        timestamp_ms: row.get(3)?,
        accuracy: row.get(4)?,
        altitude: row.get(5)?,
        speed: row.get(6)?,
        created_at: parse_datetime(&created_at),
    })
}

const PING_COLUMNS: &str =
    "id, latitude, longitude, timestamp_ms, accuracy, altitude, speed, created_at";

impl Database {
    /// Append a location ping and return the stored row
    pub fn add_location(&self, ping: &NewLocationPing) -> Result<LocationPing> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO locations (latitude, longitude, timestamp_ms, accuracy, altitude, speed)
             VALUES (?, ?, ?, ?, ?, ?)",
            params![
                ping.latitude,
                ping.longitude,
                ping.timestamp_ms,
                ping.accuracy,
                ping.altitude,
                ping.speed,
            ],
        )?;
        let id = conn.last_insert_rowid();

        let stored = conn
            .query_row(
                &format!("SELECT {} FROM locations WHERE id = ?", PING_COLUMNS),
                params![id],
                ping_from_row,
            )
            .map_err(|_| Error::NotFound(format!("Location {} missing after insert", id)))?;
        Ok(stored)
    }

    /// Most recent pings by sample timestamp
    pub fn recent_locations(&self, limit: i64) -> Result<Vec<LocationPing>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM locations ORDER BY timestamp_ms DESC LIMIT ?",
            PING_COLUMNS
        ))?;
        let pings = stmt
            .query_map(params![limit], ping_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(pings)
    }
}
