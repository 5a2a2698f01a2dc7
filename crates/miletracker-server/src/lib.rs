//! MileTracker Web Server
//!
//! Axum-based REST API for the MileTracker mileage/expense application.
//!
//! The wire schema is camelCase (what the mobile client speaks); storage
//! models are snake_case. Each handler module defines its wire DTOs and the
//! explicit conversions between the two.

use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
    Json, Router,
};
use tower_http::{
    cors::CorsLayer, services::ServeDir, set_header::SetResponseHeaderLayer, trace::TraceLayer,
};
use tracing::{error, info};

use miletracker_core::db::Database;

mod handlers;
pub mod plaid;

pub use plaid::PlaidClient;

/// Maximum file upload size (10 MB)
pub const MAX_UPLOAD_SIZE: usize = 10 * 1024 * 1024;

/// Server configuration
#[derive(Clone, Default)]
pub struct ServerConfig {
    /// Enable the unauthenticated admin endpoints (development only)
    pub enable_admin: bool,
    /// Allowed CORS origins (empty = any origin, for the mobile client)
    pub allowed_origins: Vec<String>,
}

/// Shared application state
pub struct AppState {
    pub db: Database,
    pub config: ServerConfig,
    /// Financial-data provider client (None when unconfigured)
    pub plaid: Option<PlaidClient>,
    /// Directory uploaded receipt files are stored under (and served from)
    pub uploads_dir: PathBuf,
}

/// Create the application router
pub fn create_router(db: Database, config: ServerConfig) -> Router {
    let plaid = PlaidClient::from_env();
    create_router_with_options(db, config, plaid, None)
}

/// Create the application router with additional options (for testing)
pub fn create_router_with_options(
    db: Database,
    config: ServerConfig,
    plaid: Option<PlaidClient>,
    uploads_dir: Option<PathBuf>,
) -> Router {
    if let Some(ref client) = plaid {
        info!("Provider configured: {}", client.environment());
    } else {
        info!("ℹ️  Provider not configured (set PLAID_CLIENT_ID and PLAID_SECRET to enable account linking)");
    }

    let uploads_dir = uploads_dir.unwrap_or_else(|| PathBuf::from("uploads"));

    let state = Arc::new(AppState {
        db,
        config: config.clone(),
        plaid,
        uploads_dir: uploads_dir.clone(),
    });

    let api_routes = Router::new()
        // Trips
        .route(
            "/trips",
            get(handlers::list_trips).post(handlers::create_trip),
        )
        .route("/trips/stats", get(handlers::get_trip_stats))
        .route(
            "/trips/:id",
            get(handlers::get_trip)
                .put(handlers::update_trip)
                .delete(handlers::delete_trip),
        )
        .route(
            "/trips/:id/route",
            get(handlers::get_trip_route).post(handlers::add_trip_route),
        )
        // Receipts
        .route("/receipts", get(handlers::list_receipts))
        .route("/receipts/upload", post(handlers::upload_receipt))
        .route("/receipts/:id/tag", put(handlers::tag_receipt))
        .route("/receipts/:id", delete(handlers::delete_receipt))
        .route("/receipts/trip/:id", get(handlers::receipts_for_trip))
        // Locations
        .route(
            "/locations",
            get(handlers::list_locations).post(handlers::add_location),
        )
        // Linked financial accounts (provider integration)
        .route("/plaid/link-token", post(handlers::create_link_token))
        .route("/plaid/exchange", post(handlers::exchange_public_token))
        .route("/plaid/accounts", get(handlers::list_linked_accounts))
        .route(
            "/plaid/accounts/:item_id",
            delete(handlers::unlink_account),
        )
        .route("/plaid/transactions", get(handlers::list_transactions))
        // Admin (development only, gated by ServerConfig::enable_admin)
        .route("/admin/reset-database", post(handlers::reset_database))
        .route("/admin/database-info", get(handlers::database_info));

    // Build CORS layer. The mobile client runs from arbitrary origins, so the
    // default is permissive; production deployments pin allowed_origins.
    let cors = if config.allowed_origins.is_empty() {
        CorsLayer::new()
            .allow_origin(tower_http::cors::Any)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::CONTENT_TYPE])
    } else {
        let origins: Vec<HeaderValue> = config
            .allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::CONTENT_TYPE])
    };

    Router::new()
        .route("/health", get(handlers::health))
        .nest("/api", api_routes)
        // Uploaded receipt images served back as static content
        .nest_service("/uploads", ServeDir::new(uploads_dir))
        .with_state(state)
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_SIZE))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        // Security headers
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
}

/// Start the server
pub async fn serve(
    db: Database,
    host: &str,
    port: u16,
    config: ServerConfig,
    uploads_dir: Option<PathBuf>,
) -> anyhow::Result<()> {
    if config.enable_admin {
        tracing::warn!("⚠️  Admin endpoints enabled - do not expose to network!");
    }

    let plaid = PlaidClient::from_env();
    let app = create_router_with_options(db, config, plaid, uploads_dir);
    let addr = format!("{}:{}", host, port);

    info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ============================================================================
// Error Handling
// ============================================================================

/// Application error type with proper HTTP status codes
pub struct AppError {
    status: StatusCode,
    message: String,
    internal: Option<anyhow::Error>,
}

impl AppError {
    pub fn bad_request(msg: &str) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: msg.to_string(),
            internal: None,
        }
    }

    pub fn not_found(msg: &str) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: msg.to_string(),
            internal: None,
        }
    }

    pub fn internal(msg: &str) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: msg.to_string(),
            internal: None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log the full internal error if present
        if let Some(err) = &self.internal {
            error!(error = %err, "Internal error");
        }

        let body = Json(serde_json::json!({
            "error": self.message
        }));

        (self.status, body).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        let err = err.into();
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            // Return generic message to client
            message: "An internal error occurred".to_string(),
            // Keep full error for logging
            internal: Some(err),
        }
    }
}
