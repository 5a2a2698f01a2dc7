//! MileTracker Core Library
//!
//! Shared functionality for the MileTracker mileage/expense tracker:
//! - Database access and migrations (SQLite via rusqlite + r2d2)
//! - Domain models for trips, receipts, locations, routes, linked accounts
//! - Denormalized trip-statistics cache maintenance

pub mod db;
pub mod error;
pub mod models;

pub use db::Database;
pub use error::{Error, Result};
