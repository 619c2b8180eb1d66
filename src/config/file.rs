//! TOML configuration file loading
//!
//! Supports `~/.config/colloquy/config.toml` as a persistent config source.
//! All fields are optional — the file is a partial overlay on top of defaults.

use std::path::PathBuf;

use serde::Deserialize;

/// Top-level TOML configuration file schema
#[derive(Debug, Default, Deserialize)]
pub struct ColloquyConfigFile {
    /// Assistant identity
    #[serde(default)]
    pub assistant: AssistantFileConfig,

    /// Wake detection configuration
    #[serde(default)]
    pub wake: WakeFileConfig,

    /// Chat completion configuration
    #[serde(default)]
    pub completion: CompletionFileConfig,

    /// Speech (STT/TTS) configuration
    #[serde(default)]
    pub voice: VoiceFileConfig,

    /// API keys for external services
    #[serde(default)]
    pub api_keys: ApiKeysFileConfig,
}

/// Assistant identity configuration
#[derive(Debug, Default, Deserialize)]
pub struct AssistantFileConfig {
    /// Assistant name, used in the ready announcement
    pub name: Option<String>,

    /// Spoken greeting on wake
    pub greeting: Option<String>,
}

/// Wake detection configuration
#[derive(Debug, Default, Deserialize)]
pub struct WakeFileConfig {
    /// Base URL of the published classifier (serves model.json + metadata.json)
    pub model_url: Option<String>,

    /// Wake label confidence threshold
    pub threshold: Option<f32>,

    /// Minimum top score for a window to count as a classification
    pub probability_threshold: Option<f32>,

    /// Window overlap factor (0.0 to 0.9)
    pub overlap: Option<f32>,

    /// Index of the wake label in the model's label list
    pub label_index: Option<usize>,
}

/// Chat completion configuration
#[derive(Debug, Default, Deserialize)]
pub struct CompletionFileConfig {
    /// Completion model identifier (e.g. "gpt-3.5-turbo")
    pub model: Option<String>,
}

/// Speech processing configuration
#[derive(Debug, Default, Deserialize)]
pub struct VoiceFileConfig {
    /// STT model (e.g. "whisper-1")
    pub stt_model: Option<String>,

    /// TTS model (e.g. "tts-1")
    pub tts_model: Option<String>,

    /// TTS voice identifier (e.g. "alloy")
    pub tts_voice: Option<String>,

    /// TTS speed multiplier
    pub tts_speed: Option<f64>,
}

/// API keys configuration
#[derive(Debug, Default, Deserialize)]
pub struct ApiKeysFileConfig {
    /// Key for the completion/STT/TTS API
    pub openai: Option<String>,
}

impl ColloquyConfigFile {
    /// Parse a TOML document into the file schema
    ///
    /// # Errors
    ///
    /// Returns error if the document is not valid TOML
    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}

/// Load the TOML config file from the standard path
///
/// Returns `ColloquyConfigFile::default()` if the file doesn't exist or
/// can't be parsed.
#[must_use]
pub fn load_config_file() -> ColloquyConfigFile {
    let Some(path) = config_file_path() else {
        return ColloquyConfigFile::default();
    };

    if !path.exists() {
        return ColloquyConfigFile::default();
    }

    match std::fs::read_to_string(&path) {
        Ok(content) => match ColloquyConfigFile::parse(&content) {
            Ok(config) => {
                tracing::info!(path = %path.display(), "loaded config file");
                config
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "failed to parse config file, using defaults"
                );
                ColloquyConfigFile::default()
            }
        },
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "failed to read config file"
            );
            ColloquyConfigFile::default()
        }
    }
}

/// Return the config file path: `~/.config/colloquy/config.toml`
#[must_use]
pub fn config_file_path() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.config_dir().join("colloquy").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_document() {
        let content = r#"
            [assistant]
            name = "Orpheus"
            greeting = "Hey!"

            [wake]
            model_url = "https://models.example.com/hiSl8IOc-/"
            threshold = 0.85
            label_index = 1

            [completion]
            model = "gpt-4o-mini"

            [voice]
            tts_voice = "nova"

            [api_keys]
            openai = "sk-test"
        "#;

        let parsed = ColloquyConfigFile::parse(content).unwrap();
        assert_eq!(parsed.assistant.name.as_deref(), Some("Orpheus"));
        assert_eq!(parsed.wake.threshold, Some(0.85));
        assert_eq!(parsed.wake.label_index, Some(1));
        assert_eq!(parsed.completion.model.as_deref(), Some("gpt-4o-mini"));
        assert_eq!(parsed.voice.tts_voice.as_deref(), Some("nova"));
        assert_eq!(parsed.api_keys.openai.as_deref(), Some("sk-test"));
    }

    #[test]
    fn test_empty_document_is_all_defaults() {
        let parsed = ColloquyConfigFile::parse("").unwrap();
        assert!(parsed.assistant.name.is_none());
        assert!(parsed.wake.model_url.is_none());
        assert!(parsed.api_keys.openai.is_none());
    }
}
