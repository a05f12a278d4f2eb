//! GigaChat Completion Client
//!
//! OAuth token handling and single-turn chat completions against the GigaChat API.

mod auth;
mod client;

pub use auth::TokenProvider;
pub use client::GigaChatClient;

use crate::config::GigaChatConfig;
use crate::error::{BuddyError, Remote, Result};
use reqwest::Client;
use std::time::Duration;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// HTTP client shared by the token provider and the chat client.
pub(crate) fn build_http_client(config: &GigaChatConfig) -> Result<Client> {
    Client::builder()
        .timeout(DEFAULT_TIMEOUT)
        .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
        .danger_accept_invalid_certs(config.accept_invalid_certs)
        .build()
        .map_err(|e| BuddyError::transport(Remote::Completion, format!("HTTP client setup: {}", e)))
}
