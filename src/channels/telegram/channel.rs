//! [`UserChannel`] bound to one Telegram chat.

use crate::error::Result;
use crate::relay::{AudioPayload, Presence, UserChannel};
use crate::utils::floor_char_boundary;
use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::{ChatAction, InputFile};

/// Telegram rejects messages longer than this many bytes of UTF-8.
pub(crate) const TELEGRAM_MAX_LEN: usize = 4096;

pub struct TelegramChannel {
    bot: Bot,
    chat_id: ChatId,
}

impl TelegramChannel {
    pub fn new(bot: Bot, chat_id: ChatId) -> Self {
        Self { bot, chat_id }
    }
}

#[async_trait]
impl UserChannel for TelegramChannel {
    async fn send_text(&self, text: &str) -> Result<()> {
        for chunk in split_message(text, TELEGRAM_MAX_LEN) {
            self.bot.send_message(self.chat_id, chunk).await?;
        }
        Ok(())
    }

    async fn send_audio(&self, audio: AudioPayload, filename: &str) -> Result<()> {
        let file = InputFile::memory(audio.into_bytes()).file_name(filename.to_string());
        self.bot.send_voice(self.chat_id, file).await?;
        Ok(())
    }

    async fn signal_presence(&self, kind: Presence) -> Result<()> {
        let action = match kind {
            Presence::Typing => ChatAction::Typing,
            Presence::Recording => ChatAction::RecordVoice,
        };
        self.bot.send_chat_action(self.chat_id, action).await?;
        Ok(())
    }
}

/// Split a message into chunks of at most `max_len` bytes, preferring to
/// break after a newline near the end of each chunk. Never splits a char.
pub(crate) fn split_message(text: &str, max_len: usize) -> Vec<&str> {
    if text.len() <= max_len {
        return vec![text];
    }
    let mut chunks = Vec::new();
    let mut start = 0;
    while start < text.len() {
        let rest = &text[start..];
        let mut end = start + floor_char_boundary(rest, max_len);
        if end == start {
            // max_len smaller than one char: emit the char alone
            end += rest.chars().next().map_or(1, char::len_utf8);
        }
        let break_at = if end < text.len() {
            text[start..end]
                .rfind('\n')
                .filter(|&pos| pos + 200 > end - start)
                .map(|pos| start + pos + 1)
                .unwrap_or(end)
        } else {
            end
        };
        chunks.push(&text[start..break_at]);
        start = break_at;
    }
    chunks
}
