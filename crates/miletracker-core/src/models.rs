//! Domain models for MileTracker

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Trip classification for reimbursement purposes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TripType {
    Personal,
    Business,
}

impl TripType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Personal => "personal",
            Self::Business => "business",
        }
    }
}

impl std::str::FromStr for TripType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "personal" => Ok(Self::Personal),
            "business" => Ok(Self::Business),
            _ => Err(format!("Unknown trip type: {}", s)),
        }
    }
}

impl std::fmt::Display for TripType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A recorded drive
///
/// Date and times are stored as the free-text strings the mobile client
/// sends (e.g. "WED 27", "3:20 PM"); the backend never parses them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trip {
    pub id: i64,
    pub date: String,
    pub start_time: String,
    pub end_time: String,
    pub start_location: String,
    pub end_location: String,
    /// Distance driven in miles
    pub distance: f64,
    /// Computed reimbursable value for this trip
    pub potential: f64,
    #[serde(rename = "type")]
    pub trip_type: TripType,
    pub notes: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A new trip before insertion
#[derive(Debug, Clone)]
pub struct NewTrip {
    pub date: String,
    pub start_time: String,
    pub end_time: String,
    pub start_location: String,
    pub end_location: String,
    pub distance: f64,
    pub potential: f64,
    pub trip_type: TripType,
    pub notes: String,
}

/// Partial update for a trip
///
/// Only the classification and notes are mutable after creation; all other
/// fields are fixed at insert time. Fields left `None` are untouched.
#[derive(Debug, Clone, Default)]
pub struct TripPatch {
    pub trip_type: Option<TripType>,
    pub notes: Option<String>,
}

impl TripPatch {
    pub fn is_empty(&self) -> bool {
        self.trip_type.is_none() && self.notes.is_none()
    }
}

/// Aggregate trip statistics (the denormalized cache row)
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TripStats {
    pub total_drives: i64,
    pub total_miles: f64,
    pub total_logged: f64,
    pub business_miles: f64,
    pub personal_miles: f64,
}

/// An uploaded receipt image, optionally tagged to a trip
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Receipt {
    /// Generated uuid string
    pub id: String,
    /// Public URL the file is served back at (e.g. /uploads/receipts/<file>)
    pub url: String,
    /// Original filename as uploaded
    pub name: String,
    pub date: DateTime<Utc>,
    pub trip_id: Option<i64>,
    pub file_size: Option<i64>,
    pub mime_type: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A new receipt row before insertion
#[derive(Debug, Clone)]
pub struct NewReceipt {
    pub id: String,
    pub url: String,
    pub name: String,
    pub date: DateTime<Utc>,
    pub trip_id: Option<i64>,
    pub file_size: i64,
    pub mime_type: String,
}

/// A single GPS sample from the tracking client (append-only)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationPing {
    pub id: i64,
    pub latitude: f64,
    pub longitude: f64,
    /// Unix timestamp in milliseconds
    pub timestamp_ms: i64,
    pub accuracy: Option<f64>,
    pub altitude: Option<f64>,
    pub speed: Option<f64>,
    pub created_at: DateTime<Utc>,
}

/// A new location ping before insertion
#[derive(Debug, Clone)]
pub struct NewLocationPing {
    pub latitude: f64,
    pub longitude: f64,
    pub timestamp_ms: i64,
    pub accuracy: Option<f64>,
    pub altitude: Option<f64>,
    pub speed: Option<f64>,
}

/// An ordered GPS sample belonging to a trip's route
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutePoint {
    pub latitude: f64,
    pub longitude: f64,
    pub timestamp_ms: Option<i64>,
    pub sequence_order: i64,
}

/// A route point before insertion (sequence assigned by the database layer)
#[derive(Debug, Clone)]
pub struct NewRoutePoint {
    pub latitude: f64,
    pub longitude: f64,
    pub timestamp_ms: Option<i64>,
}

/// A bank account linked through the financial-data provider
///
/// Identified by the provider's stable (item_id, account_id) pair. Re-linking
/// the same pair reactivates and updates the row rather than duplicating it;
/// unlinking flips `is_active` off (soft delete).
#[derive(Debug, Clone, Serialize)]
pub struct PlaidAccount {
    pub id: i64,
    pub user_id: i64,
    /// Provider access credential. Never serialized to API responses.
    #[serde(skip_serializing)]
    pub access_token: String,
    pub item_id: String,
    pub account_id: String,
    pub account_name: Option<String>,
    pub institution_name: Option<String>,
    pub account_type: Option<String>,
    pub account_subtype: Option<String>,
    /// Last few digits of the account number
    pub mask: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A linked account before upsert
#[derive(Debug, Clone)]
pub struct NewPlaidAccount {
    pub user_id: i64,
    pub access_token: String,
    pub item_id: String,
    pub account_id: String,
    pub account_name: Option<String>,
    pub institution_name: Option<String>,
    pub account_type: Option<String>,
    pub account_subtype: Option<String>,
    pub mask: Option<String>,
}

/// Row count for a single table (admin introspection)
#[derive(Debug, Clone, Serialize)]
pub struct TableCount {
    pub name: String,
    pub count: i64,
}
