//! Configuration types, defaults, loading, and validation.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Telegram bot configuration
    #[serde(default)]
    pub telegram: TelegramConfig,

    /// GigaChat completion service
    #[serde(default)]
    pub gigachat: GigaChatConfig,

    /// OpenAI speech synthesis
    #[serde(default)]
    pub speech: SpeechConfig,

    /// Relay pipeline behaviour
    #[serde(default)]
    pub relay: RelayConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Telegram bot configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TelegramConfig {
    /// Bot token from @BotFather (loaded from BOT_TOKEN env var)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

/// GigaChat completion service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GigaChatConfig {
    /// Base64 authorization key for the OAuth Basic header (GIGACHAT_AUTH)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_key: Option<String>,

    /// OAuth token endpoint
    #[serde(default = "default_oauth_url")]
    pub oauth_url: String,

    /// API base URL; `/chat/completions` is appended
    #[serde(default = "default_gigachat_api_url")]
    pub api_url: String,

    /// OAuth scope (default: "GIGACHAT_API_PERS")
    #[serde(default = "default_scope")]
    pub scope: String,

    /// Model name (default: "GigaChat")
    #[serde(default = "default_gigachat_model")]
    pub model: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Skip TLS certificate verification. The service's chain is signed by
    /// a national CA missing from common trust stores.
    #[serde(default = "default_true")]
    pub accept_invalid_certs: bool,
}

fn default_oauth_url() -> String {
    "https://ngw.devices.sberbank.ru:9443/api/v2/oauth".to_string()
}
fn default_gigachat_api_url() -> String {
    "https://gigachat.devices.sberbank.ru/api/v1".to_string()
}
fn default_scope() -> String { "GIGACHAT_API_PERS".to_string() }
fn default_gigachat_model() -> String { "GigaChat".to_string() }
fn default_temperature() -> f32 { 0.7 }
fn default_max_tokens() -> u32 { 512 }
fn default_true() -> bool { true }

impl Default for GigaChatConfig {
    fn default() -> Self {
        Self {
            auth_key: None,
            oauth_url: default_oauth_url(),
            api_url: default_gigachat_api_url(),
            scope: default_scope(),
            model: default_gigachat_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            accept_invalid_certs: true,
        }
    }
}

/// Speech synthesis configuration (OpenAI TTS)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeechConfig {
    /// OpenAI API key (loaded from OPENAI_API_KEY env var)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Speech endpoint
    #[serde(default = "default_tts_url")]
    pub url: String,

    /// TTS model (default: "tts-1")
    #[serde(default = "default_tts_model")]
    pub model: String,

    /// TTS voice name (default: "alloy")
    #[serde(default = "default_tts_voice")]
    pub voice: String,

    /// Playback speed, 0.25 to 4.0 (default: 0.8, slower for learners)
    #[serde(default = "default_tts_speed")]
    pub speed: f32,
}

fn default_tts_url() -> String { "https://api.openai.com/v1/audio/speech".to_string() }
fn default_tts_model() -> String { "tts-1".to_string() }
fn default_tts_voice() -> String { "alloy".to_string() }
fn default_tts_speed() -> f32 { 0.8 }

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            url: default_tts_url(),
            model: default_tts_model(),
            voice: default_tts_voice(),
            speed: default_tts_speed(),
        }
    }
}

/// Relay pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayConfig {
    /// Speech synthesis attempts per phrase (default: 2)
    #[serde(default = "default_speech_attempts")]
    pub speech_attempts: u32,

    /// Pause between speech attempts in milliseconds (default: 1000)
    #[serde(default = "default_speech_backoff_ms")]
    pub speech_backoff_ms: u64,

    /// Replaces the built-in tutor prompt
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
}

fn default_speech_attempts() -> u32 { 2 }
fn default_speech_backoff_ms() -> u64 { 1000 }

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            speech_attempts: default_speech_attempts(),
            speech_backoff_ms: default_speech_backoff_ms(),
            system_prompt: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Directory for debug log files
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            dir: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Canonical base directory: `~/.phrasebuddy/`
pub fn phrasebuddy_home() -> PathBuf {
    let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
    home.join(".phrasebuddy")
}

/// Credentials the bot cannot run without, with where to get each one.
const REQUIRED_CREDENTIALS: [(&str, &str); 3] = [
    ("BOT_TOKEN", "from @BotFather in Telegram"),
    ("GIGACHAT_AUTH", "from the GigaChat developer console"),
    ("OPENAI_API_KEY", "from https://platform.openai.com/api-keys"),
];

impl Config {
    /// Load configuration from default locations
    ///
    /// Priority (lowest to highest):
    /// 1. Default values
    /// 2. System config: ~/.config/phrasebuddy/config.toml
    /// 3. Local config: ./phrasebuddy.toml
    /// 4. Environment variables
    pub fn load() -> Result<Self> {
        tracing::debug!("Loading configuration...");

        let mut config = Self::default();

        if let Some(system_config_path) = Self::system_config_path()
            && system_config_path.exists()
        {
            tracing::debug!("Loading system config from: {:?}", system_config_path);
            config = Self::load_file(&system_config_path)?;
        }

        let local_config_path = Self::local_config_path();
        if local_config_path.exists() {
            tracing::debug!("Loading local config from: {:?}", local_config_path);
            config = Self::load_file(&local_config_path)?;
        }

        config.apply_env_overrides(|key| std::env::var(key).ok());

        tracing::debug!("Configuration loaded successfully");
        Ok(config)
    }

    /// Load configuration from a specific file path, then apply the environment.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        tracing::debug!("Loading configuration from custom path: {:?}", path);

        if !path.exists() {
            anyhow::bail!("Config file not found: {:?}", path);
        }
        let mut config = Self::load_file(path)?;
        config.apply_env_overrides(|key| std::env::var(key).ok());

        Ok(config)
    }

    /// Get the system config path: ~/.config/phrasebuddy/config.toml
    pub fn system_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("phrasebuddy").join("config.toml"))
    }

    /// Get the local config path: ./phrasebuddy.toml
    pub fn local_config_path() -> PathBuf {
        PathBuf::from("./phrasebuddy.toml")
    }

    /// Later files replace earlier ones whole; sections absent from a file
    /// fall back to defaults.
    fn load_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        toml::from_str(&contents).with_context(|| format!("Failed to parse config file: {:?}", path))
    }

    /// Apply environment variable overrides. `lookup` is `std::env::var` outside tests.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        // Secrets
        if let Some(token) = non_empty("BOT_TOKEN") {
            self.telegram.token = Some(token);
        }
        if let Some(auth) = non_empty("GIGACHAT_AUTH") {
            self.gigachat.auth_key = Some(auth);
        }
        if let Some(key) = non_empty("OPENAI_API_KEY") {
            self.speech.api_key = Some(key);
        }

        // Endpoints (for proxies and local testing)
        if let Some(url) = non_empty("GIGACHAT_OAUTH_URL") {
            self.gigachat.oauth_url = url;
        }
        if let Some(url) = non_empty("GIGACHAT_API_URL") {
            self.gigachat.api_url = url;
        }
        if let Some(url) = non_empty("OPENAI_TTS_URL") {
            self.speech.url = url;
        }

        // Logging
        if let Some(level) = non_empty("PHRASEBUDDY_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(dir) = non_empty("PHRASEBUDDY_LOG_DIR") {
            self.logging.dir = Some(PathBuf::from(dir));
        }
    }

    /// Names of required secrets that are not set.
    pub fn missing_credentials(&self) -> Vec<&'static str> {
        let present = [
            self.telegram.token.is_some(),
            self.gigachat.auth_key.is_some(),
            self.speech.api_key.is_some(),
        ];
        REQUIRED_CREDENTIALS
            .iter()
            .zip(present)
            .filter(|(_, present)| !present)
            .map(|((name, _), _)| *name)
            .collect()
    }

    /// Fail with a readable list of missing secrets and where to get them.
    pub fn require_credentials(&self) -> Result<()> {
        let missing = self.missing_credentials();
        if missing.is_empty() {
            return Ok(());
        }

        let mut message = format!(
            "Missing required environment variables: {}\n\nAdd them to a .env file in the working directory:",
            missing.join(", ")
        );
        for (name, source) in REQUIRED_CREDENTIALS.iter().filter(|(n, _)| missing.contains(n)) {
            message.push_str(&format!("\n  {}=...   ({})", name, source));
        }
        anyhow::bail!(message)
    }

    pub fn validate(&self) -> Result<()> {
        tracing::debug!("Validating configuration...");

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            anyhow::bail!(
                "Invalid log level: {}. Must be one of: {:?}",
                self.logging.level,
                valid_levels
            );
        }

        for (name, url) in [
            ("gigachat.oauth_url", &self.gigachat.oauth_url),
            ("gigachat.api_url", &self.gigachat.api_url),
            ("speech.url", &self.speech.url),
        ] {
            if url.trim().is_empty() {
                anyhow::bail!("{} must not be empty", name);
            }
        }

        if !(0.25..=4.0).contains(&self.speech.speed) {
            anyhow::bail!(
                "Invalid speech.speed: {}. Must be between 0.25 and 4.0",
                self.speech.speed
            );
        }

        if self.relay.speech_attempts == 0 {
            anyhow::bail!("relay.speech_attempts must be at least 1");
        }

        if self.gigachat.accept_invalid_certs {
            tracing::warn!("TLS certificate verification is disabled for GigaChat");
        }

        tracing::debug!("Configuration validation passed");
        Ok(())
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        let toml_string =
            toml::to_string_pretty(self).context("Failed to serialize config to TOML")?;

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }

        fs::write(path, toml_string)
            .with_context(|| format!("Failed to write config file: {:?}", path))?;

        tracing::info!("Configuration saved to: {:?}", path);
        Ok(())
    }
}
