//! Telegram Bot Integration
//!
//! Runs the tutor as a Telegram bot: every text message goes through the
//! relay orchestrator and the answer comes back as text plus a voice note.

mod agent;
mod channel;
pub(crate) mod handler;

pub use agent::TelegramAgent;
pub use channel::TelegramChannel;
