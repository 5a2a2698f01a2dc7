//! Per-trip route points

use rusqlite::params;

use super::Database;
use crate::error::Result;
use crate::models::{NewRoutePoint, RoutePoint};

impl Database {
    /// Route points for a trip, in sequence order
    pub fn trip_route(&self, trip_id: i64) -> Result<Vec<RoutePoint>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT latitude, longitude, timestamp_ms, sequence_order
             FROM trip_routes WHERE trip_id = ? ORDER BY sequence_order",
        )?;
        let points = stmt
            .query_map(params![trip_id], |row| {
                Ok(RoutePoint {
                    latitude: row.get(0)?,
                    longitude: row.get(1)?,
                    timestamp_ms: row.get(2)?,
                    sequence_order: row.get(3)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(points)
    }

    /// Append route points to a trip
    ///
    /// Sequence numbering continues from the trip's current maximum, so
    /// repeated uploads extend the route rather than colliding.
    pub fn add_route_points(&self, trip_id: i64, points: &[NewRoutePoint]) -> Result<()> {
        let conn = self.conn()?;
        let base: i64 = conn.query_row(
            "SELECT COALESCE(MAX(sequence_order) + 1, 0) FROM trip_routes WHERE trip_id = ?",
            params![trip_id],
            |row| row.get(0),
        )?;

        let mut stmt = conn.prepare(
            "INSERT INTO trip_routes (trip_id, latitude, longitude, timestamp_ms, sequence_order)
             VALUES (?, ?, ?, ?, ?)",
        )?;
        for (i, point) in points.iter().enumerate() {
            stmt.execute(params![
                trip_id,
                point.latitude,
                point.longitude,
                point.timestamp_ms,
                base + i as i64,
            ])?;
        }

        Ok(())
    }
}
