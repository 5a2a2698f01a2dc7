//! HTTP request handlers organized by domain
//!
//! Each submodule contains handlers for a specific API area and the camelCase
//! wire DTOs that area exposes.

pub mod admin;
pub mod health;
pub mod locations;
pub mod plaid;
pub mod receipts;
pub mod routes;
pub mod trips;

// Re-export all handlers for use in router
pub use admin::*;
pub use health::*;
pub use locations::*;
pub use plaid::*;
pub use receipts::*;
pub use routes::*;
pub use trips::*;
