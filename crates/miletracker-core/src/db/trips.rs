//! Trip operations and the denormalized stats cache

use rusqlite::{params, Row};

use super::{parse_datetime, Database};
use crate::error::{Error, Result};
use crate::models::{NewTrip, Trip, TripPatch, TripStats, TripType};

/// Fixed id of the single stats cache row
const STATS_ROW_ID: i64 = 1;

fn trip_from_row(row: &Row<'_>) -> rusqlite::Result<Trip> {
    let type_str: String = row.get(8)?;
    let created_at: String = row.get(10)?;
    let updated_at: String = row.get(11)?;

    Ok(Trip {
        id: row.get(0)?,
        date: row.get(1)?,
        start_time: row.get(2)?,
        end_time: row.get(3)?,
        start_location: row.get(4)?,
        end_location: row.get(5)?,
        distance: row.get(6)?,
        potential: row.get(7)?,
        trip_type: type_str.parse().unwrap_or(TripType::Personal),
        notes: row.get(9)?,
        created_at: parse_datetime(&created_at),
        updated_at: parse_datetime(&updated_at),
    })
}

const TRIP_COLUMNS: &str = "id, date, start_time, end_time, start_location, end_location, \
                            distance, potential, type, notes, created_at, updated_at";

impl Database {
    /// Insert a trip and return the stored row
    pub fn create_trip(&self, new_trip: &NewTrip) -> Result<Trip> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO trips (date, start_time, end_time, start_location, end_location,
                                distance, potential, type, notes)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                new_trip.date,
                new_trip.start_time,
                new_trip.end_time,
                new_trip.start_location,
                new_trip.end_location,
                new_trip.distance,
                new_trip.potential,
                new_trip.trip_type.as_str(),
                new_trip.notes,
            ],
        )?;
        let id = conn.last_insert_rowid();
        drop(conn);

        self.get_trip(id)?
            .ok_or_else(|| Error::NotFound(format!("Trip {} missing after insert", id)))
    }

    /// Get a trip by id
    pub fn get_trip(&self, id: i64) -> Result<Option<Trip>> {
        let conn = self.conn()?;
        let trip = conn
            .query_row(
                &format!("SELECT {} FROM trips WHERE id = ?", TRIP_COLUMNS),
                params![id],
                trip_from_row,
            )
            .ok();
        Ok(trip)
    }

    /// List all trips, newest first
    pub fn list_trips(&self) -> Result<Vec<Trip>> {
        let conn = self.conn()?;
        let mut stmt =
            conn.prepare(&format!("SELECT {} FROM trips ORDER BY id DESC", TRIP_COLUMNS))?;
        let trips = stmt
            .query_map([], trip_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(trips)
    }

    /// Apply a partial update to a trip
    ///
    /// Only the classification and notes are mutable; the patch struct is the
    /// allow-list. Returns the updated row, or None if the trip doesn't exist.
    pub fn update_trip(&self, id: i64, patch: &TripPatch) -> Result<Option<Trip>> {
        if patch.is_empty() {
            return self.get_trip(id);
        }

        let conn = self.conn()?;
        if let Some(trip_type) = patch.trip_type {
            conn.execute(
                "UPDATE trips SET type = ?, updated_at = CURRENT_TIMESTAMP WHERE id = ?",
                params![trip_type.as_str(), id],
            )?;
        }
        if let Some(notes) = &patch.notes {
            conn.execute(
                "UPDATE trips SET notes = ?, updated_at = CURRENT_TIMESTAMP WHERE id = ?",
                params![notes, id],
            )?;
        }
        drop(conn);

        self.get_trip(id)
    }

    /// Delete a trip. Route points cascade; tagged receipts are nullified.
    /// Returns whether a row was deleted.
    pub fn delete_trip(&self, id: i64) -> Result<bool> {
        let conn = self.conn()?;
        let deleted = conn.execute("DELETE FROM trips WHERE id = ?", params![id])?;
        Ok(deleted > 0)
    }

    /// Read the stats cache row, computing it from the trips table when the
    /// cache is cold (no row yet).
    pub fn trip_stats(&self) -> Result<TripStats> {
        let conn = self.conn()?;
        let cached = conn
            .query_row(
                "SELECT total_drives, total_miles, total_logged, business_miles, personal_miles
                 FROM trip_stats WHERE id = ?",
                params![STATS_ROW_ID],
                |row| {
                    Ok(TripStats {
                        total_drives: row.get(0)?,
                        total_miles: row.get(1)?,
                        total_logged: row.get(2)?,
                        business_miles: row.get(3)?,
                        personal_miles: row.get(4)?,
                    })
                },
            )
            .ok();
        drop(conn);

        match cached {
            Some(stats) => Ok(stats),
            None => self.recompute_trip_stats(),
        }
    }

    /// Recompute aggregates from the live trips table and upsert the cache row.
    ///
    /// Must be called after every trip create/update/delete. The mutation and
    /// this recompute run as separate statements; a crash between them leaves
    /// the cache stale until the next mutation.
    pub fn recompute_trip_stats(&self) -> Result<TripStats> {
        let conn = self.conn()?;
        let stats = conn.query_row(
            "SELECT COUNT(*),
                    COALESCE(SUM(distance), 0),
                    COALESCE(SUM(potential), 0),
                    COALESCE(SUM(CASE WHEN type = 'business' THEN distance ELSE 0 END), 0),
                    COALESCE(SUM(CASE WHEN type = 'personal' THEN distance ELSE 0 END), 0)
             FROM trips",
            [],
            |row| {
                Ok(TripStats {
                    total_drives: row.get(0)?,
                    total_miles: row.get(1)?,
                    total_logged: row.get(2)?,
                    business_miles: row.get(3)?,
                    personal_miles: row.get(4)?,
                })
            },
        )?;

        conn.execute(
            "INSERT INTO trip_stats (id, total_drives, total_miles, total_logged,
                                     business_miles, personal_miles, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, CURRENT_TIMESTAMP)
             ON CONFLICT(id) DO UPDATE SET
                 total_drives = excluded.total_drives,
                 total_miles = excluded.total_miles,
                 total_logged = excluded.total_logged,
                 business_miles = excluded.business_miles,
                 personal_miles = excluded.personal_miles,
                 updated_at = CURRENT_TIMESTAMP",
            params![
                STATS_ROW_ID,
                stats.total_drives,
                stats.total_miles,
                stats.total_logged,
                stats.business_miles,
                stats.personal_miles,
            ],
        )?;

        Ok(stats)
    }
}
