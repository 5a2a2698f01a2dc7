//! Receipt operations

use rusqlite::{params, Row};

use super::{format_datetime, parse_datetime, Database};
use crate::error::{Error, Result};
use crate::models::{NewReceipt, Receipt};

fn receipt_from_row(row: &Row<'_>) -> rusqlite::Result<Receipt> {
    let date: String = row.get(3)?;
    let created_at: String = row.get(7)?;
    let updated_at: String = row.get(8)?;

    Ok(Receipt {
        id: row.get(0)?,
        url: row.get(1)?,
        name: row.get(2)?,
        date: parse_datetime(&date),
        trip_id: row.get(4)?,
        file_size: row.get(5)?,
        mime_type: row.get(6)?,
        created_at: parse_datetime(&created_at),
        updated_at: parse_datetime(&updated_at),
    })
}

const RECEIPT_COLUMNS: &str =
    "id, url, name, date, trip_id, file_size, mime_type, created_at, updated_at";

impl Database {
    /// Insert a receipt row and return it
    pub fn create_receipt(&self, new_receipt: &NewReceipt) -> Result<Receipt> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO receipts (id, url, name, date, trip_id, file_size, mime_type)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
            params![
                new_receipt.id,
                new_receipt.url,
                new_receipt.name,
                format_datetime(&new_receipt.date),
                new_receipt.trip_id,
                new_receipt.file_size,
                new_receipt.mime_type,
            ],
        )?;
        drop(conn);

        self.get_receipt(&new_receipt.id)?.ok_or_else(|| {
            Error::NotFound(format!("Receipt {} missing after insert", new_receipt.id))
        })
    }

    /// Get a receipt by id
    pub fn get_receipt(&self, id: &str) -> Result<Option<Receipt>> {
        let conn = self.conn()?;
        let receipt = conn
            .query_row(
                &format!("SELECT {} FROM receipts WHERE id = ?", RECEIPT_COLUMNS),
                params![id],
                receipt_from_row,
            )
            .ok();
        Ok(receipt)
    }

    /// List all receipts, newest first
    pub fn list_receipts(&self) -> Result<Vec<Receipt>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM receipts ORDER BY created_at DESC, id",
            RECEIPT_COLUMNS
        ))?;
        let receipts = stmt
            .query_map([], receipt_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(receipts)
    }

    /// List receipts tagged to a trip, newest first
    pub fn receipts_for_trip(&self, trip_id: i64) -> Result<Vec<Receipt>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM receipts WHERE trip_id = ? ORDER BY created_at DESC, id",
            RECEIPT_COLUMNS
        ))?;
        let receipts = stmt
            .query_map(params![trip_id], receipt_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(receipts)
    }

    /// (Re)associate a receipt with a trip, or clear the association with None.
    /// Returns the updated row, or None if the receipt doesn't exist.
    pub fn tag_receipt(&self, id: &str, trip_id: Option<i64>) -> Result<Option<Receipt>> {
        let conn = self.conn()?;
        conn.execute(
            "UPDATE receipts SET trip_id = ?, updated_at = CURRENT_TIMESTAMP WHERE id = ?",
            params![trip_id, id],
        )?;
        drop(conn);

        self.get_receipt(id)
    }

    /// Delete a receipt row. Returns whether a row was deleted.
    ///
    /// The caller is responsible for removing the stored file.
    pub fn delete_receipt(&self, id: &str) -> Result<bool> {
        let conn = self.conn()?;
        let deleted = conn.execute("DELETE FROM receipts WHERE id = ?", params![id])?;
        Ok(deleted > 0)
    }
}
