//! Receipt handlers: upload, tagging, deletion

use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    extract::{Multipart, Path, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::{AppError, AppState};
use miletracker_core::models::{NewReceipt, Receipt};

/// Image formats accepted for receipt uploads
const ALLOWED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp", "heic"];

/// A receipt as it appears on the wire
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptResponse {
    pub id: String,
    pub url: String,
    pub name: String,
    pub date: DateTime<Utc>,
    pub trip_id: Option<i64>,
}

impl From<Receipt> for ReceiptResponse {
    fn from(receipt: Receipt) -> Self {
        Self {
            id: receipt.id,
            url: receipt.url,
            name: receipt.name,
            date: receipt.date,
            trip_id: receipt.trip_id,
        }
    }
}

/// GET /api/receipts - List all receipts
pub async fn list_receipts(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<ReceiptResponse>>, AppError> {
    let receipts = state.db.list_receipts()?;
    Ok(Json(
        receipts.into_iter().map(ReceiptResponse::from).collect(),
    ))
}

/// GET /api/receipts/trip/:id - Receipts tagged to a trip
pub async fn receipts_for_trip(
    State(state): State<Arc<AppState>>,
    Path(trip_id): Path<i64>,
) -> Result<Json<Vec<ReceiptResponse>>, AppError> {
    let receipts = state.db.receipts_for_trip(trip_id)?;
    Ok(Json(
        receipts.into_iter().map(ReceiptResponse::from).collect(),
    ))
}

/// Lowercased extension of an uploaded filename
fn file_extension(name: &str) -> Option<String> {
    name.rsplit_once('.').map(|(_, ext)| ext.to_lowercase())
}

/// MIME type for an allow-listed extension
fn mime_for_extension(ext: &str) -> &'static str {
    match ext {
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "heic" => "image/heic",
        _ => "image/jpeg",
    }
}

/// Resolve the stored MIME type from what the client declared and the
/// filename extension. A missing or generic declared type falls back to the
/// extension's MIME, defaulting to JPEG.
fn resolve_mime(declared: Option<&str>, ext: Option<&str>) -> String {
    match declared {
        Some(ct) if ct.starts_with("image/") => ct.to_string(),
        _ => mime_for_extension(ext.unwrap_or("jpg")).to_string(),
    }
}

/// Whether the upload passes the image allow-list
fn is_allowed_image(declared: Option<&str>, ext: Option<&str>) -> bool {
    if let Some(ct) = declared {
        if ct.starts_with("image/") {
            return true;
        }
        // A concrete non-image declaration is rejected outright
        if ct != "application/octet-stream" {
            return false;
        }
    }
    matches!(ext, Some(e) if ALLOWED_EXTENSIONS.contains(&e))
}

/// POST /api/receipts/upload - Upload a receipt image (multipart `file` field)
pub async fn upload_receipt(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<ReceiptResponse>, AppError> {
    // Find the file part
    let mut upload: Option<(String, Option<String>, axum::body::Bytes)> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| AppError::bad_request("Invalid multipart body"))?
    {
        if field.name() == Some("file") || field.file_name().is_some() {
            let file_name = field.file_name().unwrap_or("receipt").to_string();
            let content_type = field.content_type().map(|ct| ct.to_string());
            let bytes = field
                .bytes()
                .await
                .map_err(|_| AppError::bad_request("Invalid file data or file too large"))?;
            upload = Some((file_name, content_type, bytes));
            break;
        }
    }

    let (file_name, content_type, bytes) =
        upload.ok_or_else(|| AppError::bad_request("No file provided"))?;

    if bytes.is_empty() {
        return Err(AppError::bad_request("No file provided"));
    }

    let ext = file_extension(&file_name);
    if !is_allowed_image(content_type.as_deref(), ext.as_deref()) {
        return Err(AppError::bad_request("File must be an image"));
    }
    let mime_type = resolve_mime(content_type.as_deref(), ext.as_deref());

    // Persist under a random filename so concurrent uploads never collide
    let stored_name = format!(
        "{}.{}",
        Uuid::new_v4(),
        ext.unwrap_or_else(|| "jpg".to_string())
    );
    let receipts_dir = state.uploads_dir.join("receipts");
    std::fs::create_dir_all(&receipts_dir)
        .map_err(|e| AppError::internal(&format!("Failed to create uploads directory: {}", e)))?;

    let file_path = receipts_dir.join(&stored_name);
    std::fs::write(&file_path, &bytes)
        .map_err(|e| AppError::internal(&format!("Failed to save receipt file: {}", e)))?;

    let new_receipt = NewReceipt {
        id: Uuid::new_v4().to_string(),
        url: format!("/uploads/receipts/{}", stored_name),
        name: file_name,
        date: Utc::now(),
        trip_id: None,
        file_size: bytes.len() as i64,
        mime_type,
    };

    // The file is on disk; if the row insert fails, clean it up before
    // propagating the error.
    let receipt = match state.db.create_receipt(&new_receipt) {
        Ok(receipt) => receipt,
        Err(e) => {
            if let Err(remove_err) = std::fs::remove_file(&file_path) {
                warn!(error = %remove_err, path = %file_path.display(),
                      "Failed to clean up receipt file after insert error");
            }
            return Err(e.into());
        }
    };

    info!(receipt_id = %receipt.id, size = receipt.file_size, "Uploaded receipt");
    Ok(Json(receipt.into()))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagReceiptRequest {
    /// Trip to associate with; absent or null clears the association
    #[serde(default)]
    pub trip_id: Option<i64>,
}

/// PUT /api/receipts/:id/tag - (Re)associate a receipt with a trip
pub async fn tag_receipt(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<TagReceiptRequest>,
) -> Result<Json<ReceiptResponse>, AppError> {
    if let Some(trip_id) = body.trip_id {
        state
            .db
            .get_trip(trip_id)?
            .ok_or_else(|| AppError::not_found("Trip not found"))?;
    }

    let receipt = state
        .db
        .tag_receipt(&id, body.trip_id)?
        .ok_or_else(|| AppError::not_found("Receipt not found"))?;

    Ok(Json(receipt.into()))
}

#[derive(Debug, Serialize)]
pub struct ReceiptDeletedResponse {
    pub message: String,
}

/// Resolve a receipt URL back to its path under the uploads directory
fn stored_file_path(uploads_dir: &std::path::Path, url: &str) -> Option<PathBuf> {
    let file_name = url.rsplit('/').next()?;
    if file_name.is_empty() {
        return None;
    }
    Some(uploads_dir.join("receipts").join(file_name))
}

/// DELETE /api/receipts/:id - Delete a receipt and its stored file
pub async fn delete_receipt(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ReceiptDeletedResponse>, AppError> {
    let receipt = state
        .db
        .get_receipt(&id)?
        .ok_or_else(|| AppError::not_found("Receipt not found"))?;

    // Remove the stored file first; a missing file is not an error
    if let Some(path) = stored_file_path(&state.uploads_dir, &receipt.url) {
        if path.exists() {
            if let Err(e) = std::fs::remove_file(&path) {
                warn!(error = %e, path = %path.display(), "Failed to remove receipt file");
            }
        }
    }

    state.db.delete_receipt(&id)?;

    info!(receipt_id = %id, "Deleted receipt");
    Ok(Json(ReceiptDeletedResponse {
        message: "Receipt deleted successfully".to_string(),
    }))
}
