//! Trip handlers: CRUD plus the aggregate stats endpoint

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{AppError, AppState};
use miletracker_core::models::{NewTrip, Trip, TripPatch, TripType};

/// Trip as it appears on the wire
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TripResponse {
    pub id: i64,
    pub date: String,
    pub start_time: String,
    pub end_time: String,
    pub start_location: String,
    pub end_location: String,
    pub distance: f64,
    pub potential: f64,
    #[serde(rename = "type")]
    pub trip_type: TripType,
    pub notes: String,
}

impl From<Trip> for TripResponse {
    fn from(trip: Trip) -> Self {
        Self {
            id: trip.id,
            date: trip.date,
            start_time: trip.start_time,
            end_time: trip.end_time,
            start_location: trip.start_location,
            end_location: trip.end_location,
            distance: trip.distance,
            potential: trip.potential,
            trip_type: trip.trip_type,
            notes: trip.notes,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTripRequest {
    pub date: String,
    pub start_time: String,
    pub end_time: String,
    pub start_location: String,
    pub end_location: String,
    pub distance: f64,
    pub potential: f64,
    #[serde(rename = "type")]
    pub trip_type: TripType,
    #[serde(default)]
    pub notes: String,
}

/// Only the classification and notes are updatable; any other field in the
/// body is ignored rather than rejected.
#[derive(Debug, Deserialize)]
pub struct UpdateTripRequest {
    #[serde(rename = "type")]
    pub trip_type: Option<TripType>,
    pub notes: Option<String>,
}

/// GET /api/trips - List all trips
pub async fn list_trips(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<TripResponse>>, AppError> {
    let trips = state.db.list_trips()?;
    Ok(Json(trips.into_iter().map(TripResponse::from).collect()))
}

/// GET /api/trips/:id - Get a single trip
pub async fn get_trip(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<TripResponse>, AppError> {
    let trip = state
        .db
        .get_trip(id)?
        .ok_or_else(|| AppError::not_found("Trip not found"))?;

    Ok(Json(trip.into()))
}

/// POST /api/trips - Create a trip
pub async fn create_trip(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateTripRequest>,
) -> Result<Json<TripResponse>, AppError> {
    let new_trip = NewTrip {
        date: body.date,
        start_time: body.start_time,
        end_time: body.end_time,
        start_location: body.start_location,
        end_location: body.end_location,
        distance: body.distance,
        potential: body.potential,
        trip_type: body.trip_type,
        notes: body.notes,
    };

    let trip = state.db.create_trip(&new_trip)?;
    state.db.recompute_trip_stats()?;

    info!(trip_id = trip.id, "Created trip");
    Ok(Json(trip.into()))
}

/// PUT /api/trips/:id - Update a trip's type/notes
pub async fn update_trip(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(body): Json<UpdateTripRequest>,
) -> Result<Json<TripResponse>, AppError> {
    let patch = TripPatch {
        trip_type: body.trip_type,
        notes: body.notes,
    };

    let trip = state
        .db
        .update_trip(id, &patch)?
        .ok_or_else(|| AppError::not_found("Trip not found"))?;
    state.db.recompute_trip_stats()?;

    Ok(Json(trip.into()))
}

#[derive(Debug, Serialize)]
pub struct DeletedResponse {
    pub message: String,
}

/// DELETE /api/trips/:id - Delete a trip
///
/// Route points cascade away; tagged receipts keep their rows with the trip
/// reference cleared.
pub async fn delete_trip(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<DeletedResponse>, AppError> {
    if !state.db.delete_trip(id)? {
        return Err(AppError::not_found("Trip not found"));
    }
    state.db.recompute_trip_stats()?;

    info!(trip_id = id, "Deleted trip");
    Ok(Json(DeletedResponse {
        message: "Trip deleted successfully".to_string(),
    }))
}

/// Headline stats as the client displays them (whole numbers)
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TripStatsResponse {
    pub total_drives: i64,
    pub total_miles: i64,
    pub total_logged: i64,
}

/// GET /api/trips/stats - Aggregate trip statistics
pub async fn get_trip_stats(
    State(state): State<Arc<AppState>>,
) -> Result<Json<TripStatsResponse>, AppError> {
    let stats = state.db.trip_stats()?;

    Ok(Json(TripStatsResponse {
        total_drives: stats.total_drives,
        total_miles: stats.total_miles as i64,
        total_logged: stats.total_logged as i64,
    }))
}
