//! Voice Processing Module
//!
//! Text-to-speech through OpenAI TTS. Produces OGG/Opus, which Telegram
//! plays inline as a voice note.

use crate::config::SpeechConfig;
use crate::error::{BuddyError, Remote, Result};
use crate::relay::SpeechService;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);
const RESPONSE_FORMAT: &str = "opus";

/// Voice settings for one synthesis request.
#[derive(Debug, Clone)]
pub struct VoiceSettings<'a> {
    pub model: &'a str,
    pub voice: &'a str,
    pub speed: f32,
}

/// Synthesize speech from text using OpenAI TTS.
///
/// Returns OGG/Opus audio bytes suitable for Telegram voice notes. An empty
/// body is returned as-is; callers decide whether that counts as a failure.
pub async fn synthesize_speech(
    client: &Client,
    url: &str,
    api_key: &str,
    text: &str,
    settings: &VoiceSettings<'_>,
) -> Result<Vec<u8>> {
    let body = serde_json::json!({
        "model": settings.model,
        "input": text,
        "voice": settings.voice,
        "response_format": RESPONSE_FORMAT,
        "speed": settings.speed,
    });

    let response = client
        .post(url)
        .header("Authorization", format!("Bearer {}", api_key))
        .header("Content-Type", "application/json")
        .json(&body)
        .send()
        .await
        .map_err(|e| BuddyError::transport(Remote::Speech, e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        let error_text = response.text().await.unwrap_or_default();
        return Err(BuddyError::from_status(Remote::Speech, status, &error_text));
    }

    let audio_bytes = response
        .bytes()
        .await
        .map_err(|e| BuddyError::transport(Remote::Speech, format!("reading audio: {}", e)))?
        .to_vec();

    tracing::info!(
        "OpenAI TTS: generated {} bytes of audio (voice={}, model={})",
        audio_bytes.len(),
        settings.voice,
        settings.model,
    );

    Ok(audio_bytes)
}

/// OpenAI-backed [`SpeechService`].
pub struct OpenAiSpeech {
    client: Client,
    api_key: String,
    url: String,
    model: String,
    voice: String,
    speed: f32,
}

impl OpenAiSpeech {
    /// Build from config. Fails when `api_key` is unset.
    pub fn new(config: &SpeechConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| BuddyError::Config("OPENAI_API_KEY is not set".to_string()))?;
        let client = Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(|e| BuddyError::transport(Remote::Speech, format!("HTTP client setup: {}", e)))?;

        Ok(Self {
            client,
            api_key,
            url: config.url.clone(),
            model: config.model.clone(),
            voice: config.voice.clone(),
            speed: config.speed,
        })
    }
}

#[async_trait]
impl SpeechService for OpenAiSpeech {
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>> {
        let settings = VoiceSettings {
            model: &self.model,
            voice: &self.voice,
            speed: self.speed,
        };
        synthesize_speech(&self.client, &self.url, &self.api_key, text, &settings).await
    }
}
