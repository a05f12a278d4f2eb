//! OAuth access tokens for GigaChat.
//!
//! Tokens are cached until shortly before expiry. Refresh happens under an
//! async mutex, so concurrent requests wait for one token fetch instead of
//! each starting their own.

use crate::error::{BuddyError, Remote, Result};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use uuid::Uuid;

/// Lifetime assumed when the server does not send `expires_in`.
const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(1800);
/// Refresh this long before the server-side expiry.
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    access_token: Option<String>,
    /// Seconds until expiry
    #[serde(default)]
    expires_in: Option<u64>,
}

#[derive(Debug, Clone)]
struct CachedToken {
    value: String,
    refresh_at: Instant,
}

/// Fetches and caches GigaChat access tokens.
pub struct TokenProvider {
    client: Client,
    auth_key: String,
    oauth_url: String,
    scope: String,
    cached: Mutex<Option<CachedToken>>,
}

impl TokenProvider {
    pub fn new(client: Client, auth_key: String, oauth_url: String, scope: String) -> Self {
        Self {
            client,
            auth_key,
            oauth_url,
            scope,
            cached: Mutex::new(None),
        }
    }

    /// A valid access token, fetching a new one when the cached token is stale.
    pub async fn access_token(&self) -> Result<String> {
        let mut cached = self.cached.lock().await;
        if let Some(token) = cached.as_ref()
            && Instant::now() < token.refresh_at
        {
            return Ok(token.value.clone());
        }

        let token = self.fetch().await?;
        let value = token.value.clone();
        *cached = Some(token);
        Ok(value)
    }

    /// Drop the cached token so the next call fetches a fresh one.
    pub async fn invalidate(&self) {
        *self.cached.lock().await = None;
    }

    async fn fetch(&self) -> Result<CachedToken> {
        let rquid = Uuid::new_v4().to_string();

        let response = self
            .client
            .post(&self.oauth_url)
            .header("Authorization", format!("Basic {}", self.auth_key))
            .header("RqUID", rquid)
            .header("Accept", "application/json")
            .form(&[("scope", self.scope.as_str())])
            .send()
            .await
            .map_err(|e| BuddyError::transport(Remote::Completion, format!("token request: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!("GigaChat token request failed ({}): {}", status, body);
            return Err(BuddyError::from_status(Remote::Completion, status, &body));
        }

        let parsed: TokenResponse = response.json().await.map_err(|e| {
            BuddyError::transport(Remote::Completion, format!("token response: {}", e))
        })?;

        let value = parsed
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| BuddyError::auth(Remote::Completion, "no access_token in OAuth response"))?;

        let ttl = parsed
            .expires_in
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_TOKEN_TTL);
        tracing::info!("GigaChat access token received, valid for {}s", ttl.as_secs());

        Ok(CachedToken {
            value,
            refresh_at: Instant::now() + ttl.saturating_sub(EXPIRY_MARGIN),
        })
    }
}
