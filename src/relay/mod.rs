//! Relay Core
//!
//! Turns one user message into a tutor reply: completion call, phrase/explanation
//! split with repair, text delivery, then voiced phrase with bounded retry.
//!
//! The remote services and the user's chat are reached through the traits in
//! this module so the core can run against Telegram, the console, or mocks.

mod orchestrator;
pub mod prompt;
pub mod speech;
pub mod splitter;

pub use orchestrator::{HandleOutcome, Orchestrator};
pub use speech::{DeliveryOutcome, SpeechDeliveryPolicy};
pub use splitter::{ParsedReply, SEPARATOR};

use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

#[cfg(test)]
use mockall::automock;

/// One user turn. Created per message and dropped once handled.
#[derive(Debug, Clone)]
pub struct IncomingMessage {
    pub sender_id: i64,
    pub raw_text: String,
    pub timestamp: DateTime<Utc>,
}

impl IncomingMessage {
    pub fn new(sender_id: i64, raw_text: impl Into<String>) -> Self {
        Self {
            sender_id,
            raw_text: raw_text.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// True when there is nothing but whitespace to answer.
    pub fn is_blank(&self) -> bool {
        self.raw_text.trim().is_empty()
    }
}

/// Synthesized speech in the fixed Opus encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioPayload(Vec<u8>);

impl AudioPayload {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }
}

/// Presence indicator shown to the user while work is in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    Typing,
    Recording,
}

/// Natural-language completion backend.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait CompletionService: Send + Sync {
    /// Single-turn completion: system prompt plus the raw user text.
    async fn complete(&self, system_prompt: &str, user_text: &str) -> Result<String>;
}

/// Voice-synthesis backend. Returns Opus bytes.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait SpeechService: Send + Sync {
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>>;
}

/// The chat a message came from. Bound to a single conversation.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait UserChannel: Send + Sync {
    async fn send_text(&self, text: &str) -> Result<()>;

    async fn send_audio(&self, audio: AudioPayload, filename: &str) -> Result<()>;

    async fn signal_presence(&self, kind: Presence) -> Result<()>;
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_message_detection() {
        assert!(IncomingMessage::new(1, "").is_blank());
        assert!(IncomingMessage::new(1, "  \n\t ").is_blank());
        assert!(!IncomingMessage::new(1, " привет ").is_blank());
    }

    #[test]
    fn test_audio_payload_accessors() {
        let audio = AudioPayload::new(vec![1, 2, 3]);
        assert_eq!(audio.len(), 3);
        assert!(!audio.is_empty());
        assert_eq!(audio.as_bytes(), &[1, 2, 3]);
        assert_eq!(audio.into_bytes(), vec![1, 2, 3]);
        assert!(AudioPayload::new(Vec::new()).is_empty());
    }
}
