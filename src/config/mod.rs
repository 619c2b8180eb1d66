//! Configuration management for colloquy
//!
//! Resolution is layered: environment variables override the config file,
//! which overrides built-in defaults. The defaults mirror the constants the
//! assistant has always shipped with (wake threshold 0.9, probability
//! threshold 0.75, overlap 0.5, wake label index 1).

pub mod file;

use secrecy::SecretString;

use crate::{Error, Result};
use file::ColloquyConfigFile;

/// Default chat API base (also serves transcription and synthesis)
const DEFAULT_API_BASE: &str = "https://api.openai.com";

/// Resolved runtime configuration
#[derive(Debug)]
pub struct Config {
    /// Assistant name, used in the ready announcement
    pub assistant_name: String,

    /// Spoken greeting on wake
    pub greeting: String,

    /// Wake classifier base URL (required for `run`, optional elsewhere)
    pub wake_model_url: Option<String>,

    /// Wake label confidence threshold
    pub wake_threshold: f32,

    /// Minimum top score for a window to count as a classification
    pub probability_threshold: f32,

    /// Window overlap factor
    pub overlap: f32,

    /// Index of the wake label in the model's label list
    pub wake_label_index: usize,

    /// Base URL for the completion/STT/TTS API
    pub api_base_url: String,

    /// Chat completion model
    pub completion_model: String,

    /// STT model
    pub stt_model: String,

    /// TTS model
    pub tts_model: String,

    /// TTS voice identifier
    pub tts_voice: String,

    /// TTS speed multiplier
    pub tts_speed: f64,

    /// Bearer credential for the API
    pub api_key: SecretString,
}

impl Config {
    /// Load configuration: env over file over defaults
    ///
    /// `wake_model_url` from the CLI wins over every other layer.
    ///
    /// # Errors
    ///
    /// Returns error if a URL is malformed or a numeric override fails to
    /// parse
    pub fn load(wake_model_url: Option<String>) -> Result<Self> {
        let file = file::load_config_file();
        Self::resolve(file, wake_model_url, &|key| std::env::var(key).ok())
    }

    /// Resolve configuration from explicit layers
    ///
    /// # Errors
    ///
    /// Returns error if a URL is malformed or a numeric override fails to
    /// parse
    pub fn resolve(
        file: ColloquyConfigFile,
        cli_model_url: Option<String>,
        env: &dyn Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let wake_model_url = cli_model_url
            .or_else(|| env("COLLOQUY_MODEL_URL"))
            .or(file.wake.model_url);

        if let Some(url) = &wake_model_url {
            validate_url(url, "wake model URL")?;
        }

        let api_base_url = env("COLLOQUY_API_BASE")
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());
        validate_url(&api_base_url, "API base URL")?;

        let api_key = env("OPENAI_API_KEY")
            .or(file.api_keys.openai)
            .unwrap_or_default();

        Ok(Self {
            assistant_name: env("COLLOQUY_NAME")
                .or(file.assistant.name)
                .unwrap_or_else(|| "Orpheus".to_string()),
            greeting: env("COLLOQUY_GREETING")
                .or(file.assistant.greeting)
                .unwrap_or_else(|| "Hey!".to_string()),
            wake_model_url,
            wake_threshold: parse_override(
                env("COLLOQUY_WAKE_THRESHOLD"),
                file.wake.threshold,
                0.9,
                "COLLOQUY_WAKE_THRESHOLD",
            )?,
            probability_threshold: parse_override(
                env("COLLOQUY_PROBABILITY_THRESHOLD"),
                file.wake.probability_threshold,
                0.75,
                "COLLOQUY_PROBABILITY_THRESHOLD",
            )?,
            overlap: parse_override(
                env("COLLOQUY_OVERLAP"),
                file.wake.overlap,
                0.5,
                "COLLOQUY_OVERLAP",
            )?,
            wake_label_index: parse_override(
                env("COLLOQUY_WAKE_LABEL_INDEX"),
                file.wake.label_index,
                1,
                "COLLOQUY_WAKE_LABEL_INDEX",
            )?,
            api_base_url,
            completion_model: env("COLLOQUY_COMPLETION_MODEL")
                .or(file.completion.model)
                .unwrap_or_else(|| "gpt-3.5-turbo".to_string()),
            stt_model: file
                .voice
                .stt_model
                .unwrap_or_else(|| "whisper-1".to_string()),
            tts_model: file.voice.tts_model.unwrap_or_else(|| "tts-1".to_string()),
            tts_voice: file.voice.tts_voice.unwrap_or_else(|| "alloy".to_string()),
            tts_speed: file.voice.tts_speed.unwrap_or(1.0),
            api_key: SecretString::from(api_key),
        })
    }

    /// The wake model URL, or a configuration error if unset
    ///
    /// # Errors
    ///
    /// Returns error if no wake model URL was configured
    pub fn require_wake_model_url(&self) -> Result<&str> {
        self.wake_model_url.as_deref().ok_or_else(|| {
            Error::Config(
                "wake model URL required: set wake.model_url, COLLOQUY_MODEL_URL, or --model-url"
                    .to_string(),
            )
        })
    }
}

/// Env over file over default, with env values parsed from strings
fn parse_override<T: std::str::FromStr>(
    env_value: Option<String>,
    file_value: Option<T>,
    default: T,
    name: &str,
) -> Result<T> {
    match env_value {
        Some(raw) => raw
            .parse()
            .map_err(|_| Error::Config(format!("invalid {name}: {raw}"))),
        None => Ok(file_value.unwrap_or(default)),
    }
}

fn validate_url(raw: &str, what: &str) -> Result<()> {
    url::Url::parse(raw).map_err(|e| Error::Config(format!("invalid {what} {raw}: {e}")))?;
    Ok(())
}
