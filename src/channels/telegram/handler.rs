//! Telegram Message Handler
//!
//! Answers `/start` and `/help` directly and sends every other text message
//! through the relay orchestrator. Non-text updates are ignored.

use super::TelegramChannel;
use crate::relay::{IncomingMessage, Orchestrator};
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::types::BotCommand;

pub(crate) const WELCOME_TEXT: &str = "👋 Привет! Я Easy English Buddy — твой репетитор по английскому языку!\n\n\
Я могу:\n\
• Переводить с русского на английский\n\
• Исправлять ошибки в английском тексте\n\
• Объяснять грамматику кратко на русском\n\
• Озвучивать английские фразы\n\n\
Просто напиши мне на русском или английском, и я помогу тебе! 🎯";

pub(crate) const HELP_TEXT: &str = "📚 Справка по использованию бота:\n\n\
Отправь мне:\n\
• Текст на русском — я переведу его на английский\n\
• Текст на английском — я исправлю ошибки\n\n\
Я также:\n\
• Объясню грамматику кратко на русском\n\
• Озвучу правильную английскую фразу\n\n\
Команды:\n\
/start — приветствие\n\
/help — эта справка";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Command {
    Start,
    Help,
}

impl Command {
    /// Recognize `/start` and `/help`, with or without `@botname` and arguments.
    pub(crate) fn parse(text: &str) -> Option<Self> {
        let word = text.trim_start().split_whitespace().next()?;
        let name = word.strip_prefix('/')?;
        let name = name.split('@').next().unwrap_or(name);
        match name.to_ascii_lowercase().as_str() {
            "start" => Some(Command::Start),
            "help" => Some(Command::Help),
            _ => None,
        }
    }

    fn reply(self) -> &'static str {
        match self {
            Command::Start => WELCOME_TEXT,
            Command::Help => HELP_TEXT,
        }
    }

    /// Commands shown in Telegram's command menu.
    pub(crate) fn menu() -> Vec<BotCommand> {
        vec![
            BotCommand::new("start", "приветствие"),
            BotCommand::new("help", "справка"),
        ]
    }
}

pub(crate) async fn handle_message(
    bot: Bot,
    msg: Message,
    orchestrator: Arc<Orchestrator>,
) -> ResponseResult<()> {
    let Some(text) = msg.text() else {
        return Ok(());
    };

    let sender_id = msg
        .from
        .as_ref()
        .map(|u| u.id.0 as i64)
        .unwrap_or(msg.chat.id.0);

    if let Some(command) = Command::parse(text) {
        tracing::info!("Telegram: {:?} from user {}", command, sender_id);
        bot.send_message(msg.chat.id, command.reply()).await?;
        return Ok(());
    }

    let incoming = IncomingMessage::new(sender_id, text).with_timestamp(msg.date);
    let channel = TelegramChannel::new(bot, msg.chat.id);

    let outcome = orchestrator.handle(&incoming, &channel).await;
    tracing::debug!("Telegram: message from {} handled: {:?}", sender_id, outcome);

    Ok(())
}
