//! Admin handlers, only routed when admin endpoints are enabled

use std::sync::Arc;

use axum::{extract::State, Json};
use serde::Serialize;
use tracing::warn;

use crate::{AppError, AppState};
use miletracker_core::models::TableCount;

/// Admin endpoints 404 unless explicitly enabled
fn require_admin(state: &AppState) -> Result<(), AppError> {
    if !state.config.enable_admin {
        return Err(AppError::not_found("Not found"));
    }
    Ok(())
}

#[derive(Debug, Serialize)]
pub struct ResetResponse {
    pub message: String,
}

/// POST /api/admin/reset-database - Wipe all data and re-seed the sample set
pub async fn reset_database(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ResetResponse>, AppError> {
    require_admin(&state)?;

    warn!("Resetting database via admin endpoint");
    state.db.reset_database()?;

    Ok(Json(ResetResponse {
        message: "Database reset successfully".to_string(),
    }))
}

#[derive(Debug, Serialize)]
pub struct DatabaseInfoResponse {
    pub tables: Vec<TableCount>,
}

/// GET /api/admin/database-info - Table names and row counts
pub async fn database_info(
    State(state): State<Arc<AppState>>,
) -> Result<Json<DatabaseInfoResponse>, AppError> {
    require_admin(&state)?;

    let tables = state.db.table_counts()?;
    Ok(Json(DatabaseInfoResponse { tables }))
}
