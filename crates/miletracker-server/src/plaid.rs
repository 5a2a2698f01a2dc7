//! Financial-data provider client
//!
//! Thin HTTP wrapper over the Plaid API, treated as an opaque external
//! collaborator: create a link token, exchange a public token for an access
//! token, and read accounts/transactions. Configured entirely from the
//! environment.

use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use miletracker_core::error::{Error, Result};

/// Environment variable holding the provider client id
pub const PLAID_CLIENT_ID_ENV: &str = "PLAID_CLIENT_ID";
/// Environment variable holding the provider secret
pub const PLAID_SECRET_ENV: &str = "PLAID_SECRET";
/// Environment variable selecting sandbox/development/production
pub const PLAID_ENV_ENV: &str = "PLAID_ENV";

/// A link token for starting the client-side link flow
#[derive(Debug, Clone, Deserialize)]
pub struct LinkToken {
    pub link_token: String,
    pub expiration: Option<String>,
}

/// Result of exchanging a public token
#[derive(Debug, Clone, Deserialize)]
pub struct TokenExchange {
    pub access_token: String,
    pub item_id: String,
}

/// An account as reported by the provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderAccount {
    pub account_id: String,
    pub name: Option<String>,
    pub mask: Option<String>,
    #[serde(rename = "type")]
    pub account_type: Option<String>,
    pub subtype: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AccountsResponse {
    accounts: Vec<ProviderAccount>,
}

#[derive(Debug, Deserialize)]
struct ProviderError {
    error_code: String,
    error_message: String,
}

/// HTTP client for the provider API
#[derive(Clone)]
pub struct PlaidClient {
    http: reqwest::Client,
    base_url: String,
    environment: String,
    client_id: String,
    secret: String,
}

impl PlaidClient {
    /// Build a client from PLAID_CLIENT_ID / PLAID_SECRET / PLAID_ENV.
    /// Returns None when credentials are absent.
    pub fn from_env() -> Option<Self> {
        let client_id = std::env::var(PLAID_CLIENT_ID_ENV).ok().filter(|s| !s.is_empty())?;
        let secret = std::env::var(PLAID_SECRET_ENV).ok().filter(|s| !s.is_empty())?;
        let environment =
            std::env::var(PLAID_ENV_ENV).unwrap_or_else(|_| "sandbox".to_string());
        Some(Self::new(&client_id, &secret, &environment))
    }

    pub fn new(client_id: &str, secret: &str, environment: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: format!("https://{}.plaid.com", environment),
            environment: environment.to_string(),
            client_id: client_id.to_string(),
            secret: secret.to_string(),
        }
    }

    /// Override the base URL (for tests against a local stub)
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn environment(&self) -> &str {
        &self.environment
    }

    /// POST a request body with credentials injected, decoding the response
    /// or surfacing the provider's error message.
    async fn post<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        mut body: serde_json::Value,
    ) -> Result<T> {
        body["client_id"] = json!(self.client_id);
        body["secret"] = json!(self.secret);

        debug!(path, "Provider request");
        let response = self
            .http
            .post(format!("{}{}", self.base_url, path))
            .timeout(std::time::Duration::from_secs(30))
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let message = match response.json::<ProviderError>().await {
                Ok(e) => format!("{}: {}", e.error_code, e.error_message),
                Err(_) => format!("HTTP {}", status),
            };
            return Err(Error::Provider(message));
        }

        Ok(response.json().await?)
    }

    /// Create a link token for the given user
    pub async fn create_link_token(&self, user_id: i64) -> Result<LinkToken> {
        self.post(
            "/link/token/create",
            json!({
                "user": { "client_user_id": user_id.to_string() },
                "client_name": "MileTracker",
                "products": ["transactions"],
                "country_codes": ["US"],
                "language": "en",
            }),
        )
        .await
    }

    /// Exchange a public token for a permanent access token + item id
    pub async fn exchange_public_token(&self, public_token: &str) -> Result<TokenExchange> {
        self.post(
            "/item/public_token/exchange",
            json!({ "public_token": public_token }),
        )
        .await
    }

    /// Accounts under an item
    pub async fn accounts(&self, access_token: &str) -> Result<Vec<ProviderAccount>> {
        let response: AccountsResponse = self
            .post("/accounts/get", json!({ "access_token": access_token }))
            .await?;
        Ok(response.accounts)
    }

    /// Transactions for an item over a date range (passed through untyped)
    pub async fn transactions(
        &self,
        access_token: &str,
        start_date: &str,
        end_date: &str,
    ) -> Result<serde_json::Value> {
        self.post(
            "/transactions/get",
            json!({
                "access_token": access_token,
                "start_date": start_date,
                "end_date": end_date,
            }),
        )
        .await
    }
}
