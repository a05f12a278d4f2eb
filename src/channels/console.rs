//! Console Channel
//!
//! [`UserChannel`] for the `ask` command: text goes to stdout, the voice
//! message to a file when a path is given.

use crate::error::{BuddyError, Result};
use crate::relay::{AudioPayload, Presence, UserChannel};
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Mutex;

#[derive(Debug, Default)]
pub struct ConsoleChannel {
    audio_out: Option<PathBuf>,
    printed: Mutex<Vec<String>>,
}

impl ConsoleChannel {
    pub fn new(audio_out: Option<PathBuf>) -> Self {
        Self {
            audio_out,
            printed: Mutex::new(Vec::new()),
        }
    }

    /// Every text sent so far, in order.
    pub fn printed(&self) -> Vec<String> {
        self.printed.lock().map(|p| p.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl UserChannel for ConsoleChannel {
    async fn send_text(&self, text: &str) -> Result<()> {
        println!("{}\n", text);
        if let Ok(mut printed) = self.printed.lock() {
            printed.push(text.to_string());
        }
        Ok(())
    }

    async fn send_audio(&self, audio: AudioPayload, filename: &str) -> Result<()> {
        let Some(path) = &self.audio_out else {
            tracing::info!("Voice message {} ({} bytes) not saved: no --audio-out", filename, audio.len());
            return Ok(());
        };

        tokio::fs::write(path, audio.as_bytes())
            .await
            .map_err(|e| BuddyError::Channel(format!("writing {:?}: {}", path, e)))?;
        println!("🔊 Voice message saved to {}", path.display());
        Ok(())
    }

    async fn signal_presence(&self, kind: Presence) -> Result<()> {
        tracing::debug!("Console presence: {:?}", kind);
        Ok(())
    }
}
