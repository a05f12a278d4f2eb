//! Chat completions against the GigaChat API.

use super::TokenProvider;
use crate::config::GigaChatConfig;
use crate::error::{BuddyError, Remote, Result};
use crate::relay::CompletionService;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    #[serde(default)]
    message: Option<ChoiceMessage>,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

impl ChatResponse {
    /// Content of the first choice: `message.content`, else the legacy `text` field.
    fn into_content(self) -> Option<String> {
        let choice = self.choices.into_iter().next()?;
        match choice.message {
            Some(message) => message.content,
            None => choice.text,
        }
    }
}

/// GigaChat-backed [`CompletionService`].
pub struct GigaChatClient {
    client: Client,
    tokens: TokenProvider,
    completions_url: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl GigaChatClient {
    /// Build from config. Fails when `auth_key` is unset.
    pub fn new(config: &GigaChatConfig) -> Result<Self> {
        let auth_key = config
            .auth_key
            .clone()
            .ok_or_else(|| BuddyError::Config("GIGACHAT_AUTH is not set".to_string()))?;
        let client = super::build_http_client(config)?;

        let tokens = TokenProvider::new(
            client.clone(),
            auth_key,
            config.oauth_url.clone(),
            config.scope.clone(),
        );

        Ok(Self {
            client,
            tokens,
            completions_url: format!("{}/chat/completions", config.api_url.trim_end_matches('/')),
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        })
    }

    /// Fetch a token now; used at startup to fail fast on bad credentials.
    pub async fn check_credentials(&self) -> Result<()> {
        self.tokens.access_token().await.map(|_| ())
    }
}

#[async_trait]
impl CompletionService for GigaChatClient {
    async fn complete(&self, system_prompt: &str, user_text: &str) -> Result<String> {
        let token = self.tokens.access_token().await?;

        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: user_text,
                },
            ],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        let response = self
            .client
            .post(&self.completions_url)
            .bearer_auth(&token)
            .header("Accept", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| BuddyError::transport(Remote::Completion, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!("GigaChat completion failed ({}): {}", status, body);
            if status == reqwest::StatusCode::UNAUTHORIZED {
                // token revoked early; the next message fetches a new one
                self.tokens.invalidate().await;
            }
            return Err(BuddyError::from_status(Remote::Completion, status, &body));
        }

        let parsed: ChatResponse = response.json().await.map_err(|e| {
            BuddyError::transport(Remote::Completion, format!("malformed response: {}", e))
        })?;

        parsed.into_content().ok_or_else(|| {
            tracing::warn!("GigaChat response had no content");
            BuddyError::transport(Remote::Completion, "response has no content")
        })
    }
}
