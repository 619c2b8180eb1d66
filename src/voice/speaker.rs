//! Speech output: synthesize a string and play it aloud
//!
//! Synthesis goes through the remote TTS endpoint; playback goes to the
//! default output device. A new utterance always cancels the previous one
//! first (last-write-wins, no queueing).

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;

use super::playback::{AudioPlayback, CancelToken};
use crate::{Error, Result};

/// Speaks a string, resolving when playback completes
#[async_trait(?Send)]
pub trait SpeechOutput {
    /// Cancel any in-progress utterance, then speak `text` to completion
    async fn speak(&mut self, text: &str) -> Result<()>;
}

/// Tracks the cancellation token of the utterance currently playing
#[derive(Debug, Default)]
struct UtteranceSlot {
    current: Option<CancelToken>,
}

impl UtteranceSlot {
    /// Cancel the in-progress utterance, if any, and hand out a fresh token
    /// for the next one
    fn supersede(&mut self) -> CancelToken {
        if let Some(prior) = self.current.take() {
            prior.cancel();
        }
        let token = CancelToken::new();
        self.current = Some(token.clone());
        token
    }
}

#[derive(Serialize)]
struct SpeechRequest<'a> {
    model: &'a str,
    input: &'a str,
    voice: &'a str,
    speed: f64,
}

/// Remote-synthesis speech output over the default output device
pub struct Speaker {
    playback: AudioPlayback,
    client: reqwest::Client,
    base_url: String,
    api_key: SecretString,
    model: String,
    voice: String,
    speed: f64,
    slot: UtteranceSlot,
}

impl Speaker {
    /// Create a speaker over an opened playback device
    ///
    /// # Errors
    ///
    /// Returns error if the synthesis credential is empty. Device
    /// availability was already checked when `playback` was constructed.
    pub fn new(
        playback: AudioPlayback,
        base_url: String,
        api_key: SecretString,
        model: String,
        voice: String,
        speed: f64,
    ) -> Result<Self> {
        if api_key.expose_secret().is_empty() {
            return Err(Error::Config("API key required for TTS".to_string()));
        }

        Ok(Self {
            playback,
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            model,
            voice,
            speed,
            slot: UtteranceSlot::default(),
        })
    }

    /// Synthesize text into MP3 bytes
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>> {
        let request = SpeechRequest {
            model: &self.model,
            input: text,
            voice: &self.voice,
            speed: self.speed,
        };

        let response = self
            .client
            .post(format!("{}/v1/audio/speech", self.base_url))
            .header(
                "Authorization",
                format!("Bearer {}", self.api_key.expose_secret()),
            )
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Tts(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Tts(format!("TTS error {status}: {body}")));
        }

        let audio = response.bytes().await.map_err(|e| Error::Tts(e.to_string()))?;
        Ok(audio.to_vec())
    }
}

#[async_trait(?Send)]
impl SpeechOutput for Speaker {
    async fn speak(&mut self, text: &str) -> Result<()> {
        tracing::debug!(text, "speaking");

        let token = self.slot.supersede();
        let audio = self.synthesize(text).await?;
        self.playback.play_mp3(&audio, &token).await
    }
}
