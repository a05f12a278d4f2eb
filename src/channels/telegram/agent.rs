//! Telegram Agent
//!
//! Agent struct and startup logic.

use super::handler::{Command, handle_message};
use crate::relay::Orchestrator;
use std::sync::Arc;
use teloxide::prelude::*;

/// Telegram bot that forwards messages to the relay
pub struct TelegramAgent {
    orchestrator: Arc<Orchestrator>,
}

impl TelegramAgent {
    pub fn new(orchestrator: Arc<Orchestrator>) -> Self {
        Self { orchestrator }
    }

    /// Start the bot as a background task. Returns a JoinHandle.
    ///
    /// Updates are dispatched concurrently across chats, so a slow completion
    /// for one user never holds up another.
    pub fn start(self, token: String) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            tracing::info!("Starting Telegram bot");

            let bot = Bot::new(token);

            match bot.get_me().await {
                Ok(me) => {
                    if let Some(ref username) = me.username {
                        tracing::info!("Telegram: bot username is @{}", username);
                    }
                }
                Err(e) => {
                    tracing::warn!("Telegram: failed to get bot info (get_me): {}", e);
                }
            }

            if let Err(e) = bot.set_my_commands(Command::menu()).await {
                tracing::warn!("Telegram: failed to register commands: {}", e);
            }

            let orchestrator = self.orchestrator.clone();
            let handler = Update::filter_message().endpoint(move |bot: Bot, msg: Message| {
                let orchestrator = orchestrator.clone();
                async move { handle_message(bot, msg, orchestrator).await }
            });

            tracing::info!("Bot is running. Press Ctrl+C to stop");

            Dispatcher::builder(bot, handler)
                .enable_ctrlc_handler()
                .build()
                .dispatch()
                .await;

            tracing::info!("Telegram bot stopped");
        })
    }
}
