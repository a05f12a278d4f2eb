//! Speech Delivery
//!
//! Voices the phrase through the [`SpeechService`] with a bounded number of
//! attempts and a fixed pause between them. When every attempt fails the user
//! gets a short notice instead of audio; the text reply has already been sent.

use super::{AudioPayload, Presence, SpeechService, UserChannel};
use crate::error::{BuddyError, Result};
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 2;
pub const DEFAULT_BACKOFF: Duration = Duration::from_secs(1);
pub const VOICE_FILENAME: &str = "voice.opus";

/// Sent once all attempts are exhausted.
pub const SPEECH_FAILED_NOTICE: &str = "⚠️ Не удалось сгенерировать озвучку для фразы.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Delivered,
    Failed,
}

/// Retry wrapper around speech synthesis and audio delivery.
#[derive(Clone)]
pub struct SpeechDeliveryPolicy {
    speech: Arc<dyn SpeechService>,
    max_attempts: u32,
    backoff: Duration,
}

impl SpeechDeliveryPolicy {
    pub fn new(speech: Arc<dyn SpeechService>) -> Self {
        Self {
            speech,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff: DEFAULT_BACKOFF,
        }
    }

    /// Zero is treated as one attempt.
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Synthesize `phrase` and send it as a voice message.
    ///
    /// Never returns an error: a failed run ends with the notice, and a failure
    /// to send the notice is only logged.
    pub async fn deliver(&self, phrase: &str, channel: &dyn UserChannel) -> DeliveryOutcome {
        for attempt in 1..=self.max_attempts {
            tracing::info!(
                "Synthesizing speech for '{}' (attempt {}/{})",
                phrase,
                attempt,
                self.max_attempts
            );

            match self.attempt(phrase, channel).await {
                Ok(bytes) => {
                    tracing::info!("Voice message sent ({} bytes)", bytes);
                    return DeliveryOutcome::Delivered;
                }
                Err(e) => {
                    tracing::error!(
                        code = e.code().as_str(),
                        retryable = e.is_retryable(),
                        "Speech attempt {}/{} failed: {}",
                        attempt,
                        self.max_attempts,
                        e
                    );
                    if attempt < self.max_attempts {
                        tokio::time::sleep(self.backoff).await;
                    }
                }
            }
        }

        tracing::error!(
            "Giving up on speech after {} attempt(s)",
            self.max_attempts
        );
        if let Err(e) = channel.send_text(SPEECH_FAILED_NOTICE).await {
            tracing::debug!("Could not send speech failure notice: {}", e);
        }
        DeliveryOutcome::Failed
    }

    /// One presence signal, synthesis and send. Returns the payload size.
    async fn attempt(&self, phrase: &str, channel: &dyn UserChannel) -> Result<usize> {
        channel.signal_presence(Presence::Recording).await?;

        let audio = AudioPayload::new(self.speech.synthesize(phrase).await?);
        if audio.is_empty() {
            return Err(BuddyError::EmptyAudio);
        }

        let size = audio.len();
        channel.send_audio(audio, VOICE_FILENAME).await?;
        Ok(size)
    }
}
