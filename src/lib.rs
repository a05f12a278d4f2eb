//! PhraseBuddy - English Tutor Telegram Bot
//!
//! Translates Russian to English, corrects English, explains the grammar in
//! Russian and sends the English phrase back as a voice message.
//!
//! ## Pipeline
//!
//! - **Completion:** GigaChat answers with `phrase / --- / explanation`
//! - **Split and repair:** the answer is parsed into a speakable phrase and an explanation
//! - **Delivery:** text reply first, then the phrase voiced through OpenAI speech with bounded retry
//!
//! ## Quick Start
//!
//! ```bash
//! # Start the bot (BOT_TOKEN, GIGACHAT_AUTH, OPENAI_API_KEY in .env)
//! phrasebuddy
//!
//! # One message from the terminal
//! phrasebuddy ask "я люблю гречку" --audio-out reply.opus
//! ```

pub mod channels;
pub mod cli;
pub mod config;
pub mod error;
pub mod gigachat;
pub mod logging;
pub mod relay;
pub mod utils;

// Re-export commonly used types
pub use error::{BuddyError, ErrorCode};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const AUTHORS: &str = env!("CARGO_PKG_AUTHORS");
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");
