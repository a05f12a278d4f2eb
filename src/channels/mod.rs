//! Channel Integrations
//!
//! Concrete collaborators for the relay: the Telegram chat (feature
//! `telegram`), the console used by `ask`, and the OpenAI speech service.

pub mod console;
pub mod voice;

#[cfg(feature = "telegram")]
pub mod telegram;

pub use console::ConsoleChannel;
