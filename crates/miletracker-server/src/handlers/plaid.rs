//! Plaid integration handlers: link flow, linked accounts, transactions

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::plaid::PlaidClient;
use crate::{AppError, AppState};
use miletracker_core::models::{NewPlaidAccount, PlaidAccount};

/// User all records belong to until multi-user support lands
const DEFAULT_USER_ID: i64 = 1;

/// Plaid client, or a 400 explaining why the endpoint is unavailable
fn require_plaid(state: &AppState) -> Result<&PlaidClient, AppError> {
    state.plaid.as_ref().ok_or_else(|| {
        AppError::bad_request("Plaid is not configured. Set PLAID_CLIENT_ID and PLAID_SECRET.")
    })
}

/// Provider rejections (bad token, invalid request) surface as 400s with the
/// provider's error code; everything else stays an internal error.
fn provider_error(err: miletracker_core::Error) -> AppError {
    match err {
        miletracker_core::Error::Provider(msg) => AppError::bad_request(&msg),
        other => other.into(),
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateLinkTokenRequest {
    #[serde(default)]
    pub user_id: Option<i64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkTokenResponse {
    pub link_token: String,
    pub expiration: Option<String>,
}

/// POST /api/plaid/link-token - Create a Link token to start the link flow
pub async fn create_link_token(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateLinkTokenRequest>,
) -> Result<Json<LinkTokenResponse>, AppError> {
    let client = require_plaid(&state)?;
    let user_id = body.user_id.unwrap_or(DEFAULT_USER_ID);

    let token = client
        .create_link_token(user_id)
        .await
        .map_err(provider_error)?;
    Ok(Json(LinkTokenResponse {
        link_token: token.link_token,
        expiration: token.expiration,
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeTokenRequest {
    pub public_token: String,
    #[serde(default)]
    pub institution_name: Option<String>,
    #[serde(default)]
    pub user_id: Option<i64>,
}

/// A linked account as it appears on the wire (access token never included)
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkedAccountResponse {
    pub id: i64,
    pub item_id: String,
    pub account_id: String,
    pub account_name: Option<String>,
    pub institution_name: Option<String>,
    pub account_type: Option<String>,
    pub account_subtype: Option<String>,
    pub mask: Option<String>,
}

impl From<PlaidAccount> for LinkedAccountResponse {
    fn from(account: PlaidAccount) -> Self {
        Self {
            id: account.id,
            item_id: account.item_id,
            account_id: account.account_id,
            account_name: account.account_name,
            institution_name: account.institution_name,
            account_type: account.account_type,
            account_subtype: account.account_subtype,
            mask: account.mask,
        }
    }
}

/// POST /api/plaid/exchange - Exchange a public token and store the item's accounts
pub async fn exchange_public_token(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ExchangeTokenRequest>,
) -> Result<Json<Vec<LinkedAccountResponse>>, AppError> {
    let client = require_plaid(&state)?;
    let user_id = body.user_id.unwrap_or(DEFAULT_USER_ID);

    let exchange = client
        .exchange_public_token(&body.public_token)
        .await
        .map_err(provider_error)?;
    let provider_accounts = client
        .accounts(&exchange.access_token)
        .await
        .map_err(provider_error)?;

    for account in &provider_accounts {
        state.db.upsert_plaid_account(&NewPlaidAccount {
            user_id,
            access_token: exchange.access_token.clone(),
            item_id: exchange.item_id.clone(),
            account_id: account.account_id.clone(),
            account_name: account.name.clone(),
            institution_name: body.institution_name.clone(),
            account_type: account.account_type.clone(),
            account_subtype: account.subtype.clone(),
            mask: account.mask.clone(),
        })?;
    }

    info!(
        item_id = %exchange.item_id,
        accounts = provider_accounts.len(),
        "Linked Plaid item"
    );

    let accounts = state.db.list_plaid_accounts(user_id)?;
    Ok(Json(
        accounts.into_iter().map(LinkedAccountResponse::from).collect(),
    ))
}

/// GET /api/plaid/accounts - List active linked accounts
pub async fn list_linked_accounts(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<LinkedAccountResponse>>, AppError> {
    let accounts = state.db.list_plaid_accounts(DEFAULT_USER_ID)?;
    Ok(Json(
        accounts.into_iter().map(LinkedAccountResponse::from).collect(),
    ))
}

#[derive(Debug, Serialize)]
pub struct UnlinkResponse {
    pub message: String,
}

/// DELETE /api/plaid/accounts/:item_id - Unlink all accounts for an item
pub async fn unlink_account(
    State(state): State<Arc<AppState>>,
    Path(item_id): Path<String>,
) -> Result<Json<UnlinkResponse>, AppError> {
    let removed = state
        .db
        .deactivate_plaid_account(DEFAULT_USER_ID, &item_id)?;
    if !removed {
        return Err(AppError::not_found("Linked account not found"));
    }

    // Unlinking is a soft delete; confirm the item no longer resolves
    if state
        .db
        .get_plaid_account_by_item(DEFAULT_USER_ID, &item_id)?
        .is_some()
    {
        return Err(AppError::internal("Failed to unlink account"));
    }

    info!(item_id = %item_id, "Unlinked Plaid item");
    Ok(Json(UnlinkResponse {
        message: "Account unlinked successfully".to_string(),
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionsQuery {
    pub item_id: String,
    pub start_date: String,
    pub end_date: String,
}

/// GET /api/plaid/transactions - Fetch transactions for a linked item
pub async fn list_transactions(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TransactionsQuery>,
) -> Result<Json<serde_json::Value>, AppError> {
    let client = require_plaid(&state)?;

    let account = state
        .db
        .get_plaid_account_by_item(DEFAULT_USER_ID, &query.item_id)?
        .ok_or_else(|| AppError::not_found("Linked account not found"))?;

    let transactions = client
        .transactions(&account.access_token, &query.start_date, &query.end_date)
        .await
        .map_err(provider_error)?;
    Ok(Json(transactions))
}
