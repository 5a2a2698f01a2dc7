//! GPS location ping handlers

use std::sync::Arc;

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::{AppError, AppState};
use miletracker_core::models::{LocationPing, NewLocationPing};

/// How many recent pings the client's map view shows
const RECENT_LOCATION_LIMIT: i64 = 10;

/// A location ping on the wire
#[derive(Debug, Serialize)]
pub struct LocationResponse {
    pub latitude: f64,
    pub longitude: f64,
    /// Unix timestamp in milliseconds
    pub timestamp: i64,
}

impl From<LocationPing> for LocationResponse {
    fn from(ping: LocationPing) -> Self {
        Self {
            latitude: ping.latitude,
            longitude: ping.longitude,
            timestamp: ping.timestamp_ms,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateLocationRequest {
    pub latitude: f64,
    pub longitude: f64,
    pub timestamp: i64,
    pub accuracy: Option<f64>,
    pub altitude: Option<f64>,
    pub speed: Option<f64>,
}

/// GET /api/locations - Most recent location pings
pub async fn list_locations(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<LocationResponse>>, AppError> {
    let pings = state.db.recent_locations(RECENT_LOCATION_LIMIT)?;
    Ok(Json(pings.into_iter().map(LocationResponse::from).collect()))
}

/// POST /api/locations - Record a location ping
pub async fn add_location(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateLocationRequest>,
) -> Result<Json<LocationResponse>, AppError> {
    let ping = state.db.add_location(&NewLocationPing {
        latitude: body.latitude,
        longitude: body.longitude,
        timestamp_ms: body.timestamp,
        accuracy: body.accuracy,
        altitude: body.altitude,
        speed: body.speed,
    })?;

    Ok(Json(ping.into()))
}
