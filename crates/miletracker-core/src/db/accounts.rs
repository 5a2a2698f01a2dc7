//! Linked financial account operations
//!
//! Rows are identified by the provider's (user, item_id, account_id) triple.
//! Re-linking updates in place and reactivates; unlinking is a soft flag flip.

use rusqlite::{params, Row};

use super::{parse_datetime, Database};
use crate::error::Result;
use crate::models::{NewPlaidAccount, PlaidAccount};

fn account_from_row(row: &Row<'_>) -> rusqlite::Result<PlaidAccount> {
    let created_at: String = row.get(11)?;
    let updated_at: String = row.get(12)?;
    Ok(PlaidAccount {
        id: row.get(0)?,
        user_id: row.get(1)?,
        access_token: row.get(2)?,
        item_id: row.get(3)?,
        account_id: row.get(4)?,
        account_name: row.get(5)?,
        institution_name: row.get(6)?,
        account_type: row.get(7)?,
        account_subtype: row.get(8)?,
        mask: row.get(9)?,
        is_active: row.get(10)?,
        created_at: parse_datetime(&created_at),
        updated_at: parse_datetime(&updated_at),
    })
}

const ACCOUNT_COLUMNS: &str = "id, user_id, access_token, item_id, account_id, account_name, \
                               institution_name, account_type, account_subtype, mask, is_active, \
                               created_at, updated_at";

impl Database {
    /// Insert or reactivate a linked account, idempotent on
    /// (user_id, item_id, account_id). Returns the row id.
    pub fn upsert_plaid_account(&self, account: &NewPlaidAccount) -> Result<i64> {
        let conn = self.conn()?;

        let existing: Option<i64> = conn
            .query_row(
                "SELECT id FROM plaid_accounts
                 WHERE user_id = ? AND item_id = ? AND account_id = ?",
                params![account.user_id, account.item_id, account.account_id],
                |row| row.get(0),
            )
            .ok();

        if let Some(id) = existing {
            conn.execute(
                "UPDATE plaid_accounts SET
                     access_token = ?, account_name = ?, institution_name = ?,
                     account_type = ?, account_subtype = ?, mask = ?,
                     is_active = 1, updated_at = CURRENT_TIMESTAMP
                 WHERE id = ?",
                params![
                    account.access_token,
                    account.account_name,
                    account.institution_name,
                    account.account_type,
                    account.account_subtype,
                    account.mask,
                    id,
                ],
            )?;
            return Ok(id);
        }

        conn.execute(
            "INSERT INTO plaid_accounts (user_id, access_token, item_id, account_id,
                                         account_name, institution_name, account_type,
                                         account_subtype, mask, is_active)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, 1)",
            params![
                account.user_id,
                account.access_token,
                account.item_id,
                account.account_id,
                account.account_name,
                account.institution_name,
                account.account_type,
                account.account_subtype,
                account.mask,
            ],
        )?;

        Ok(conn.last_insert_rowid())
    }

    /// Active linked accounts for a user, newest first
    pub fn list_plaid_accounts(&self, user_id: i64) -> Result<Vec<PlaidAccount>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM plaid_accounts
             WHERE user_id = ? AND is_active = 1
             ORDER BY created_at DESC, id DESC",
            ACCOUNT_COLUMNS
        ))?;
        let accounts = stmt
            .query_map(params![user_id], account_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(accounts)
    }

    /// An active linked account by item id (for provider calls needing the token)
    pub fn get_plaid_account_by_item(
        &self,
        user_id: i64,
        item_id: &str,
    ) -> Result<Option<PlaidAccount>> {
        let conn = self.conn()?;
        let account = conn
            .query_row(
                &format!(
                    "SELECT {} FROM plaid_accounts
                     WHERE user_id = ? AND item_id = ? AND is_active = 1
                     LIMIT 1",
                    ACCOUNT_COLUMNS
                ),
                params![user_id, item_id],
                account_from_row,
            )
            .ok();
        Ok(account)
    }

    /// Soft-delete all of an item's linked accounts. Returns whether any
    /// active row was deactivated.
    pub fn deactivate_plaid_account(&self, user_id: i64, item_id: &str) -> Result<bool> {
        let conn = self.conn()?;
        let changed = conn.execute(
            "UPDATE plaid_accounts SET is_active = 0, updated_at = CURRENT_TIMESTAMP
             WHERE user_id = ? AND item_id = ? AND is_active = 1",
            params![user_id, item_id],
        )?;
        Ok(changed > 0)
    }
}
