//! Application Configuration Module
//!
//! This module centralizes the configuration for the interview service.
//! It loads settings from environment variables (and an optional `.env`
//! file) into a single struct that is passed through the application.

use gemini_client::client::{DEFAULT_BASE_URL, DEFAULT_MODEL};
use interview_core::session_state::DEFAULT_LISTEN_DELAY;
use secrecy::SecretString;
use std::env;
use std::time::Duration;
use tracing::Level;

/// Reading time per word when no synthesizer is installed.
pub const DEFAULT_SPEECH_PACE: Duration = Duration::from_millis(60);

#[derive(Debug, Clone, PartialEq)]
pub enum SpeechInputKind {
    /// Each line typed on the terminal is one recognized utterance.
    Terminal,
    /// No recognizer; the interview never listens.
    None,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SpeechOutputKind {
    /// First synthesizer found on `PATH`, falling back to the console.
    Auto,
    Console,
    /// A specific synthesizer command.
    Command(String),
}

#[derive(Debug, Clone)]
pub struct SpeechConfig {
    pub input: SpeechInputKind,
    pub output: SpeechOutputKind,
    pub pace: Duration,
}

/// Holds all configuration loaded from the environment.
#[derive(Debug)]
pub struct Config {
    pub gemini_api_key: SecretString,
    pub gemini_model: String,
    pub gemini_base_url: String,
    pub speech: SpeechConfig,
    pub listen_delay: Duration,
    pub log_level: Level,
}

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingVar(String),
    #[error("Invalid log level provided for RUST_LOG: {0}")]
    InvalidLogLevel(String),
    #[error("Invalid value for environment variable {0}: {1}")]
    InvalidValue(String, String),
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    // *   `GEMINI_API_KEY`: Secret key for the Gemini API. Required.
    // *   `GEMINI_MODEL`: (Optional) Model used to generate questions. Defaults to "gemini-2.0-flash".
    // *   `GEMINI_BASE_URL`: (Optional) API root. Defaults to the public Gemini endpoint.
    // *   `SPEECH_INPUT`: (Optional) "terminal" or "none". Defaults to "terminal".
    // *   `SPEECH_OUTPUT`: (Optional) "auto", "console" or a synthesizer command. Defaults to "auto".
    // *   `SPEECH_PACE_MS`: (Optional) Console reading time per word. Defaults to 60.
    // *   `LISTEN_DELAY_MS`: (Optional) Pause before listening again. Defaults to 700.
    // *   `RUST_LOG`: (Optional) The logging level. Defaults to "INFO".
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file. This is useful for local development and is ignored if not present.
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the configuration from any variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let gemini_api_key = lookup("GEMINI_API_KEY")
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingVar("GEMINI_API_KEY".to_string()))?;

        let gemini_model = lookup("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string());
        let gemini_base_url =
            lookup("GEMINI_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let input = match lookup("SPEECH_INPUT")
            .unwrap_or_else(|| "terminal".to_string())
            .to_lowercase()
            .as_str()
        {
            "terminal" => SpeechInputKind::Terminal,
            "none" => SpeechInputKind::None,
            other => {
                return Err(ConfigError::InvalidValue(
                    "SPEECH_INPUT".to_string(),
                    format!("'{}' is not one of terminal, none", other),
                ));
            }
        };

        let output_str = lookup("SPEECH_OUTPUT").unwrap_or_else(|| "auto".to_string());
        let output = match output_str.to_lowercase().as_str() {
            "auto" => SpeechOutputKind::Auto,
            "console" => SpeechOutputKind::Console,
            _ => SpeechOutputKind::Command(output_str),
        };

        let pace = millis(&lookup, "SPEECH_PACE_MS")?.unwrap_or(DEFAULT_SPEECH_PACE);
        let listen_delay = millis(&lookup, "LISTEN_DELAY_MS")?.unwrap_or(DEFAULT_LISTEN_DELAY);

        // Configure logging level from RUST_LOG, with a sensible default.
        let log_level_str = lookup("RUST_LOG").unwrap_or_else(|| "INFO".to_string());
        let log_level = log_level_str
            .parse::<Level>()
            .map_err(|_| ConfigError::InvalidLogLevel(log_level_str))?;

        Ok(Self {
            gemini_api_key: SecretString::from(gemini_api_key),
            gemini_model,
            gemini_base_url,
            speech: SpeechConfig {
                input,
                output,
                pace,
            },
            listen_delay,
            log_level,
        })
    }
}

fn millis(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
) -> Result<Option<Duration>, ConfigError> {
    lookup(name)
        .map(|value| {
            value
                .trim()
                .parse::<u64>()
                .map(Duration::from_millis)
                .map_err(|e| ConfigError::InvalidValue(name.to_string(), e.to_string()))
        })
        .transpose()
}
