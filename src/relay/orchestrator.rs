//! Message Orchestrator
//!
//! Runs one user message through the relay: completion, split and repair,
//! text reply, then speech. All failures end here; nothing is returned to the
//! caller except a [`HandleOutcome`].

use super::prompt::DEFAULT_SYSTEM_PROMPT;
use super::speech::{DeliveryOutcome, SpeechDeliveryPolicy};
use super::splitter::{self, ParsedReply};
use super::{CompletionService, IncomingMessage, Presence, SpeechService, UserChannel};
use crate::error::{BuddyError, Result};
use crate::utils::truncate_str;
use std::sync::Arc;
use std::time::Duration;

pub const EMPTY_INPUT_REPLY: &str = "Пожалуйста, отправьте текстовое сообщение.";

pub const GENERIC_APOLOGY: &str =
    "Произошла ошибка при обработке вашего запроса. Пожалуйста, попробуйте еще раз позже.";

/// What happened to one message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleOutcome {
    /// Blank input, answered with a rejection
    Rejected,
    /// Text reply sent; `speech` is `None` when there was no phrase to voice
    /// or speech is off
    Replied { speech: Option<DeliveryOutcome> },
    /// Something failed before the reply went out; an apology was attempted
    Failed,
}

/// Per-message pipeline with injected collaborators.
///
/// Holds no per-request state, so one instance is shared by every chat.
#[derive(Clone)]
pub struct Orchestrator {
    completion: Arc<dyn CompletionService>,
    speech: Option<SpeechDeliveryPolicy>,
    system_prompt: String,
}

impl Orchestrator {
    pub fn new(completion: Arc<dyn CompletionService>, speech: Arc<dyn SpeechService>) -> Self {
        Self {
            completion,
            speech: Some(SpeechDeliveryPolicy::new(speech)),
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
        }
    }

    /// Text replies only; no speech service is ever called.
    pub fn text_only(completion: Arc<dyn CompletionService>) -> Self {
        Self {
            completion,
            speech: None,
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
        }
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    pub fn with_speech_attempts(mut self, max_attempts: u32) -> Self {
        self.speech = self.speech.map(|s| s.with_max_attempts(max_attempts));
        self
    }

    pub fn with_speech_backoff(mut self, backoff: Duration) -> Self {
        self.speech = self.speech.map(|s| s.with_backoff(backoff));
        self
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    /// Handle one message on the chat it came from.
    pub async fn handle(&self, message: &IncomingMessage, channel: &dyn UserChannel) -> HandleOutcome {
        if message.is_blank() {
            tracing::debug!(
                sender = message.sender_id,
                code = BuddyError::EmptyInput.code().as_str(),
                "Rejecting blank message"
            );
            if let Err(e) = channel.send_text(EMPTY_INPUT_REPLY).await {
                tracing::warn!(sender = message.sender_id, "Could not send rejection: {}", e);
            }
            return HandleOutcome::Rejected;
        }

        match self.process(message, channel).await {
            Ok(speech) => HandleOutcome::Replied { speech },
            Err(e) => {
                tracing::error!(
                    sender = message.sender_id,
                    code = e.code().as_str(),
                    "Failed to process message: {}",
                    e
                );
                if let Err(e) = channel.send_text(GENERIC_APOLOGY).await {
                    tracing::warn!(sender = message.sender_id, "Could not send apology: {}", e);
                }
                HandleOutcome::Failed
            }
        }
    }

    async fn process(
        &self,
        message: &IncomingMessage,
        channel: &dyn UserChannel,
    ) -> Result<Option<DeliveryOutcome>> {
        channel.signal_presence(Presence::Typing).await?;

        tracing::info!(
            sender = message.sender_id,
            "Request: {}",
            truncate_str(&message.raw_text, 200)
        );
        let raw = self
            .completion
            .complete(&self.system_prompt, &message.raw_text)
            .await?;
        tracing::debug!("Completion: {}", truncate_str(&raw, 200));

        let reply = Self::parse(&raw);
        tracing::info!(
            "Parsed phrase: '{}', explanation: '{}'",
            reply.phrase,
            truncate_str(&reply.explanation, 50)
        );

        channel.send_text(&reply.compose()).await?;

        let phrase = reply.phrase.trim();
        match &self.speech {
            Some(policy) if !phrase.is_empty() => Ok(Some(policy.deliver(phrase, channel).await)),
            _ => Ok(None),
        }
    }

    /// Split, then repair when the phrase is unusable for speech.
    fn parse(raw: &str) -> ParsedReply {
        let parsed = splitter::split(raw);
        if parsed.needs_repair() {
            splitter::repair(parsed, raw)
        } else {
            parsed
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Remote;
    use crate::relay::speech::{SPEECH_FAILED_NOTICE, VOICE_FILENAME};
    use crate::relay::splitter::PLACEHOLDER_PHRASE;
    use crate::relay::testing::{RecordingChannel, Sent};
    use crate::relay::{MockCompletionService, MockSpeechService};

    fn completion_returning(reply: &'static str) -> MockCompletionService {
        let mut completion = MockCompletionService::new();
        completion
            .expect_complete()
            .times(1)
            .returning(move |_, _| Ok(reply.to_string()));
        completion
    }

    fn speech_ok(times: usize) -> MockSpeechService {
        let mut speech = MockSpeechService::new();
        speech
            .expect_synthesize()
            .times(times)
            .returning(|_| Ok(vec![1u8; 16]));
        speech
    }

    #[tokio::test]
    async fn test_blank_input_never_reaches_completion() {
        let mut completion = MockCompletionService::new();
        completion.expect_complete().never();
        let mut speech = MockSpeechService::new();
        speech.expect_synthesize().never();

        let orchestrator = Orchestrator::new(Arc::new(completion), Arc::new(speech));
        let channel = RecordingChannel::default();

        let outcome = orchestrator
            .handle(&IncomingMessage::new(42, "   \n "), &channel)
            .await;

        assert_eq!(outcome, HandleOutcome::Rejected);
        assert_eq!(channel.sent(), vec![Sent::Text(EMPTY_INPUT_REPLY.to_string())]);
    }

    #[tokio::test]
    async fn test_full_pipeline_sends_text_then_voice() {
        let mut completion = MockCompletionService::new();
        completion
            .expect_complete()
            .withf(|system, user| {
                system.to_string() == DEFAULT_SYSTEM_PROMPT && user.to_string() == "я в порядке"
            })
            .times(1)
            .returning(|_, _| Ok("[I am fine]\n\n---\n\nЯ в порядке = I am fine.".to_string()));

        let mut speech = MockSpeechService::new();
        speech
            .expect_synthesize()
            .withf(|text| text.to_string() == "I am fine")
            .times(1)
            .returning(|_| Ok(vec![9u8; 64]));

        let orchestrator = Orchestrator::new(Arc::new(completion), Arc::new(speech));
        let channel = RecordingChannel::default();

        let outcome = orchestrator
            .handle(&IncomingMessage::new(7, "я в порядке"), &channel)
            .await;

        assert_eq!(
            outcome,
            HandleOutcome::Replied {
                speech: Some(DeliveryOutcome::Delivered)
            }
        );
        assert_eq!(
            channel.sent(),
            vec![
                Sent::Presence(Presence::Typing),
                Sent::Text("I am fine\n\n---\n\nЯ в порядке = I am fine.".to_string()),
                Sent::Presence(Presence::Recording),
                Sent::Audio(64, VOICE_FILENAME.to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_reply_without_explanation_is_phrase_only() {
        let orchestrator = Orchestrator::new(
            Arc::new(completion_returning("Good   morning!")),
            Arc::new(speech_ok(1)),
        );
        let channel = RecordingChannel::default();

        orchestrator
            .handle(&IncomingMessage::new(1, "доброе утро"), &channel)
            .await;

        assert_eq!(channel.texts(), vec!["Good morning!".to_string()]);
    }

    #[tokio::test]
    async fn test_native_phrase_is_repaired_before_speech() {
        let raw = "Перевод: гречка\n\nI like buckwheat porridge.\n---\nГречка = buckwheat.";
        let mut speech = MockSpeechService::new();
        speech
            .expect_synthesize()
            .withf(|text| text.to_string() == "I like buckwheat porridge.")
            .times(1)
            .returning(|_| Ok(vec![1u8; 8]));

        let orchestrator =
            Orchestrator::new(Arc::new(completion_returning(raw)), Arc::new(speech));
        let channel = RecordingChannel::default();

        orchestrator
            .handle(&IncomingMessage::new(1, "я люблю гречку"), &channel)
            .await;

        assert_eq!(
            channel.texts(),
            vec!["I like buckwheat porridge.\n\n---\n\nГречка = buckwheat.".to_string()]
        );
        assert_eq!(channel.audio_count(), 1);
    }

    #[tokio::test]
    async fn test_empty_phrase_gets_placeholder_and_is_voiced() {
        let orchestrator = Orchestrator::new(
            Arc::new(completion_returning("---\nТолько объяснение.")),
            Arc::new(speech_ok(1)),
        );
        let channel = RecordingChannel::default();

        orchestrator
            .handle(&IncomingMessage::new(1, "что?"), &channel)
            .await;

        assert_eq!(
            channel.texts(),
            vec![format!("{}\n\n---\n\nТолько объяснение.", PLACEHOLDER_PHRASE)]
        );
        assert_eq!(channel.audio_count(), 1);
    }

    #[tokio::test]
    async fn test_completion_failure_yields_apology_without_retry() {
        let mut completion = MockCompletionService::new();
        completion
            .expect_complete()
            .times(1)
            .returning(|_, _| Err(BuddyError::transport(Remote::Completion, "timeout")));
        let mut speech = MockSpeechService::new();
        speech.expect_synthesize().never();

        let orchestrator = Orchestrator::new(Arc::new(completion), Arc::new(speech));
        let channel = RecordingChannel::default();

        let outcome = orchestrator
            .handle(&IncomingMessage::new(3, "hello"), &channel)
            .await;

        assert_eq!(outcome, HandleOutcome::Failed);
        assert_eq!(channel.texts(), vec![GENERIC_APOLOGY.to_string()]);
    }

    #[tokio::test]
    async fn test_apology_send_failure_does_not_escape() {
        let mut completion = MockCompletionService::new();
        completion
            .expect_complete()
            .returning(|_, _| Err(BuddyError::auth(Remote::Completion, "expired")));

        let orchestrator =
            Orchestrator::new(Arc::new(completion), Arc::new(MockSpeechService::new()));
        let channel = RecordingChannel::failing_text();

        let outcome = orchestrator
            .handle(&IncomingMessage::new(3, "hello"), &channel)
            .await;
        assert_eq!(outcome, HandleOutcome::Failed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_speech_failure_keeps_text_reply() {
        let mut speech = MockSpeechService::new();
        speech
            .expect_synthesize()
            .times(2)
            .returning(|_| Err(BuddyError::transport(Remote::Speech, "503")));

        let orchestrator = Orchestrator::new(
            Arc::new(completion_returning("Thank you.\n---\nСпасибо.")),
            Arc::new(speech),
        );
        let channel = RecordingChannel::default();

        let outcome = orchestrator
            .handle(&IncomingMessage::new(5, "спасибо"), &channel)
            .await;

        assert_eq!(
            outcome,
            HandleOutcome::Replied {
                speech: Some(DeliveryOutcome::Failed)
            }
        );
        assert_eq!(
            channel.texts(),
            vec![
                "Thank you.\n\n---\n\nСпасибо.".to_string(),
                SPEECH_FAILED_NOTICE.to_string()
            ]
        );
    }

    #[tokio::test]
    async fn test_custom_prompt_and_attempts() {
        let mut completion = MockCompletionService::new();
        completion
            .expect_complete()
            .withf(|system, _| system.to_string() == "Be brief.")
            .returning(|_, _| Ok("Hi.".to_string()));

        let orchestrator = Orchestrator::new(Arc::new(completion), Arc::new(speech_ok(1)))
            .with_system_prompt("Be brief.")
            .with_speech_attempts(3)
            .with_speech_backoff(Duration::from_millis(10));
        assert_eq!(orchestrator.system_prompt(), "Be brief.");

        let channel = RecordingChannel::default();
        let outcome = orchestrator
            .handle(&IncomingMessage::new(1, "hi"), &channel)
            .await;
        assert_eq!(
            outcome,
            HandleOutcome::Replied {
                speech: Some(DeliveryOutcome::Delivered)
            }
        );
    }

    #[tokio::test]
    async fn test_text_only_skips_speech() {
        let orchestrator =
            Orchestrator::text_only(Arc::new(completion_returning("Thank you.\n---\nСпасибо.")))
                .with_speech_attempts(5);
        let channel = RecordingChannel::default();

        let outcome = orchestrator
            .handle(&IncomingMessage::new(5, "спасибо"), &channel)
            .await;

        assert_eq!(outcome, HandleOutcome::Replied { speech: None });
        assert_eq!(channel.audio_count(), 0);
        assert!(!channel.sent().contains(&Sent::Presence(Presence::Recording)));
    }
}
