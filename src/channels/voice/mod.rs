//! Voice Processing Module
//!
//! Text-to-speech (OpenAI TTS) for the phrases the relay voices.

mod service;

pub use service::{OpenAiSpeech, synthesize_speech};
