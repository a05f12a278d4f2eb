//! CLI Module
//!
//! Command-line interface for PhraseBuddy using Clap v4.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::channels::ConsoleChannel;
use crate::channels::voice::OpenAiSpeech;
use crate::config::Config;
use crate::gigachat::GigaChatClient;
use crate::relay::{
    CompletionService, HandleOutcome, IncomingMessage, Orchestrator, SpeechService,
};

/// PhraseBuddy - English tutor bot with voiced answers
#[derive(Parser, Debug)]
#[command(name = "phrasebuddy")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable debug mode (creates log files in ~/.phrasebuddy/logs/)
    #[arg(short, long, global = true)]
    pub debug: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Commands {
    /// Start the Telegram bot (default)
    Run,

    /// Validate configuration and credentials
    Check,

    /// Send one message through the tutor and print the answer
    Ask {
        /// Text to translate or correct
        text: String,

        /// Save the voiced phrase to this file
        #[arg(short, long)]
        audio_out: Option<PathBuf>,

        /// Skip speech synthesis
        #[arg(long)]
        no_speech: bool,
    },

    /// Initialize configuration
    Init {
        /// Force overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },
}

/// Main CLI entry point. `config` is already loaded so logging could use it.
pub async fn run(cli: Cli, config: Config) -> Result<()> {
    if cli.debug {
        tracing::info!("Debug mode enabled");
    }

    match cli.command {
        None | Some(Commands::Run) => cmd_run(&config).await,
        Some(Commands::Check) => cmd_check(&config).await,
        Some(Commands::Ask {
            text,
            audio_out,
            no_speech,
        }) => cmd_ask(&config, text, audio_out, no_speech).await,
        Some(Commands::Init { force }) => cmd_init(force).await,
    }
}

/// Load configuration from file or defaults
pub fn load_config(config_path: Option<&str>) -> Result<Config> {
    if let Some(path) = config_path {
        Config::load_from_path(path)
    } else {
        Config::load()
    }
}

/// Wire the relay from config and the two remote services.
pub fn build_orchestrator(
    config: &Config,
    completion: Arc<dyn CompletionService>,
    speech: Option<Arc<dyn SpeechService>>,
) -> Orchestrator {
    let orchestrator = match speech {
        Some(speech) => Orchestrator::new(completion, speech),
        None => Orchestrator::text_only(completion),
    };

    let orchestrator = orchestrator
        .with_speech_attempts(config.relay.speech_attempts)
        .with_speech_backoff(Duration::from_millis(config.relay.speech_backoff_ms));

    match config.relay.system_prompt.as_deref() {
        Some(prompt) if !prompt.trim().is_empty() => orchestrator.with_system_prompt(prompt),
        _ => orchestrator,
    }
}

/// GigaChat client with its token checked, so bad credentials fail at startup.
async fn connect_gigachat(config: &Config) -> Result<GigaChatClient> {
    let client = GigaChatClient::new(&config.gigachat)?;
    client
        .check_credentials()
        .await
        .context("GigaChat authorization failed")?;
    tracing::info!("GigaChat token acquired");
    Ok(client)
}

/// Start the Telegram bot and wait for it to stop
async fn cmd_run(config: &Config) -> Result<()> {
    config.validate()?;
    config.require_credentials()?;

    let gigachat = connect_gigachat(config).await?;
    let speech = OpenAiSpeech::new(&config.speech)?;
    let orchestrator = build_orchestrator(config, Arc::new(gigachat), Some(Arc::new(speech)));

    let token = config
        .telegram
        .token
        .clone()
        .context("BOT_TOKEN is not set")?;

    start_bot(orchestrator, token).await
}

#[cfg(feature = "telegram")]
async fn start_bot(orchestrator: Orchestrator, token: String) -> Result<()> {
    use crate::channels::telegram::TelegramAgent;

    TelegramAgent::new(Arc::new(orchestrator))
        .start(token)
        .await
        .context("Telegram bot task failed")
}

#[cfg(not(feature = "telegram"))]
async fn start_bot(_orchestrator: Orchestrator, _token: String) -> Result<()> {
    anyhow::bail!("phrasebuddy was built without the `telegram` feature")
}

/// Validate configuration and try the GigaChat credentials
async fn cmd_check(config: &Config) -> Result<()> {
    println!("🔎 PhraseBuddy configuration check\n");

    config.validate()?;
    println!("✅ Configuration is valid");
    println!("   GigaChat API: {}", config.gigachat.api_url);
    println!("   Speech API:   {}", config.speech.url);
    println!("   Log level:    {}", config.logging.level);

    let missing = config.missing_credentials();
    if !missing.is_empty() {
        println!("\n❌ Missing: {}", missing.join(", "));
        return config.require_credentials();
    }
    println!("✅ All credentials are set");

    connect_gigachat(config).await?;
    println!("✅ GigaChat authorization succeeded");

    Ok(())
}

/// Run one message through the relay on the console
async fn cmd_ask(
    config: &Config,
    text: String,
    audio_out: Option<PathBuf>,
    no_speech: bool,
) -> Result<()> {
    config.validate()?;

    let gigachat = connect_gigachat(config).await?;
    let speech: Option<Arc<dyn SpeechService>> = if no_speech {
        None
    } else {
        Some(Arc::new(OpenAiSpeech::new(&config.speech)?))
    };
    let orchestrator = build_orchestrator(config, Arc::new(gigachat), speech);

    let channel = ConsoleChannel::new(audio_out);
    let outcome = orchestrator
        .handle(&IncomingMessage::new(0, text), &channel)
        .await;

    match outcome {
        HandleOutcome::Failed => anyhow::bail!("The tutor could not answer this message"),
        outcome => {
            tracing::debug!("ask finished: {:?}", outcome);
            Ok(())
        }
    }
}

/// Initialize configuration file
async fn cmd_init(force: bool) -> Result<()> {
    println!("📘 PhraseBuddy Configuration Initialization\n");

    let config_path = Config::system_config_path().context("Could not determine config directory")?;

    // Check if config already exists
    if config_path.exists() && !force {
        anyhow::bail!(
            "Configuration file already exists at: {}\nUse --force to overwrite",
            config_path.display()
        );
    }

    Config::default().save(&config_path)?;

    println!("✅ Configuration initialized at: {}", config_path.display());
    println!("\n📝 Next steps:");
    println!("   1. Put BOT_TOKEN, GIGACHAT_AUTH and OPENAI_API_KEY in a .env file");
    println!("   2. Run 'phrasebuddy check' to verify them");
    println!("   3. Run 'phrasebuddy' to start the bot");

    Ok(())
}
