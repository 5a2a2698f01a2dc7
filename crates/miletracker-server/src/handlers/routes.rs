//! Per-trip GPS route handlers

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::{AppError, AppState};
use miletracker_core::models::NewRoutePoint;

/// A route point on the wire (coordinates only)
#[derive(Debug, Serialize)]
pub struct RoutePointResponse {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Serialize)]
pub struct RouteResponse {
    pub route: Vec<RoutePointResponse>,
}

#[derive(Debug, Deserialize)]
pub struct RoutePointRequest {
    pub latitude: f64,
    pub longitude: f64,
    /// Unix timestamp in milliseconds
    pub timestamp: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct RouteAddedResponse {
    pub message: String,
}

/// GET /api/trips/:id/route - Route points for a trip
pub async fn get_trip_route(
    State(state): State<Arc<AppState>>,
    Path(trip_id): Path<i64>,
) -> Result<Json<RouteResponse>, AppError> {
    let points = state.db.trip_route(trip_id)?;
    if points.is_empty() {
        return Err(AppError::not_found("Route not found"));
    }

    let route = points
        .into_iter()
        .map(|p| RoutePointResponse {
            latitude: p.latitude,
            longitude: p.longitude,
        })
        .collect();

    Ok(Json(RouteResponse { route }))
}

/// POST /api/trips/:id/route - Append route points to a trip
pub async fn add_trip_route(
    State(state): State<Arc<AppState>>,
    Path(trip_id): Path<i64>,
    Json(body): Json<Vec<RoutePointRequest>>,
) -> Result<Json<RouteAddedResponse>, AppError> {
    // Verify trip exists
    state
        .db
        .get_trip(trip_id)?
        .ok_or_else(|| AppError::not_found("Trip not found"))?;

    let points: Vec<NewRoutePoint> = body
        .into_iter()
        .map(|p| NewRoutePoint {
            latitude: p.latitude,
            longitude: p.longitude,
            timestamp_ms: p.timestamp,
        })
        .collect();

    state.db.add_route_points(trip_id, &points)?;

    Ok(Json(RouteAddedResponse {
        message: "Route points added successfully".to_string(),
    }))
}
