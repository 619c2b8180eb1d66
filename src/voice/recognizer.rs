//! Speech input: one utterance in, one transcript out
//!
//! Endpoints a single utterance from the microphone stream (skip leading
//! silence, accumulate speech, terminate on trailing silence or max
//! length), then submits it as WAV to the remote transcription endpoint.

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use super::capture::{rms_energy, samples_to_wav, AudioCapture, SAMPLE_RATE};
use crate::{Error, Result};

/// Minimum RMS energy to count a block as speech
const ENERGY_THRESHOLD: f32 = 0.03;

/// Minimum utterance length to submit (0.3 seconds)
const MIN_SPEECH_SAMPLES: usize = 4800;

/// Trailing silence ending an utterance (0.5 seconds)
const SILENCE_SAMPLES: usize = 8000;

/// Hard cap on utterance length (15 seconds)
const MAX_UTTERANCE_SAMPLES: usize = SAMPLE_RATE as usize * 15;

/// Captures one utterance and resolves with its transcript
#[async_trait(?Send)]
pub trait SpeechInput {
    /// Capture the next utterance and return its transcript
    ///
    /// Capture must be settled (recognition stopped, buffers drained)
    /// before this resolves.
    async fn capture_utterance(&mut self) -> Result<String>;
}

/// Utterance endpointing state
enum EndpointState {
    /// Skipping leading silence
    AwaitingSpeech,
    /// Accumulating an utterance
    InSpeech,
}

/// Carves one utterance out of a continuous sample stream
pub struct Endpointer {
    state: EndpointState,
    buffer: Vec<f32>,
    silence_run: usize,
}

impl Endpointer {
    /// Create an endpointer awaiting speech
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: EndpointState::AwaitingSpeech,
            buffer: Vec::new(),
            silence_run: 0,
        }
    }

    /// Feed a block of samples; returns the utterance once it completes
    pub fn push(&mut self, samples: &[f32]) -> Option<Vec<f32>> {
        let is_speech = rms_energy(samples) > ENERGY_THRESHOLD;

        match self.state {
            EndpointState::AwaitingSpeech => {
                if is_speech {
                    self.state = EndpointState::InSpeech;
                    self.buffer.extend_from_slice(samples);
                    self.silence_run = 0;
                    tracing::trace!("speech started");
                }
                None
            }
            EndpointState::InSpeech => {
                self.buffer.extend_from_slice(samples);

                if is_speech {
                    self.silence_run = 0;
                } else {
                    self.silence_run += samples.len();
                }

                let ended = self.silence_run > SILENCE_SAMPLES
                    && self.buffer.len() > MIN_SPEECH_SAMPLES;
                let overlong = self.buffer.len() >= MAX_UTTERANCE_SAMPLES;

                if ended || overlong {
                    tracing::debug!(samples = self.buffer.len(), overlong, "utterance complete");
                    self.silence_run = 0;
                    self.state = EndpointState::AwaitingSpeech;
                    return Some(std::mem::take(&mut self.buffer));
                }

                None
            }
        }
    }

    /// Discard any partial utterance and await speech again
    pub fn reset(&mut self) {
        self.state = EndpointState::AwaitingSpeech;
        self.buffer.clear();
        self.silence_run = 0;
    }
}

impl Default for Endpointer {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Deserialize)]
struct TranscriptionResponse {
    text: String,
}

/// Microphone-backed speech input using a remote transcription endpoint
pub struct Recognizer {
    capture: AudioCapture,
    client: reqwest::Client,
    base_url: String,
    api_key: SecretString,
    model: String,
}

impl Recognizer {
    /// Create a recognizer over an opened capture device
    ///
    /// # Errors
    ///
    /// Returns error if the transcription credential is empty. Device
    /// availability was already checked when `capture` was constructed.
    pub fn new(
        capture: AudioCapture,
        base_url: String,
        api_key: SecretString,
        model: String,
    ) -> Result<Self> {
        if api_key.expose_secret().is_empty() {
            return Err(Error::Config(
                "API key required for transcription".to_string(),
            ));
        }

        Ok(Self {
            capture,
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            model,
        })
    }

    /// Start streaming from the microphone
    ///
    /// # Errors
    ///
    /// Returns error if the capture stream cannot start
    pub fn start(&mut self) -> Result<()> {
        self.capture.start()
    }

    /// Stop the microphone stream
    pub fn stop(&mut self) {
        self.capture.stop();
    }

    /// Take the samples buffered since the last call
    ///
    /// The wake scan drains the same microphone stream through this while
    /// no conversation is active.
    #[must_use]
    pub fn drain_samples(&self) -> Vec<f32> {
        self.capture.take_buffer()
    }

    /// Submit WAV audio to the transcription endpoint
    async fn transcribe(&self, wav: Vec<u8>) -> Result<String> {
        tracing::debug!(audio_bytes = wav.len(), "transcribing utterance");

        let form = reqwest::multipart::Form::new()
            .part(
                "file",
                reqwest::multipart::Part::bytes(wav)
                    .file_name("audio.wav")
                    .mime_str("audio/wav")
                    .map_err(|e| Error::Stt(e.to_string()))?,
            )
            .text("model", self.model.clone());

        let response = self
            .client
            .post(format!("{}/v1/audio/transcriptions", self.base_url))
            .header(
                "Authorization",
                format!("Bearer {}", self.api_key.expose_secret()),
            )
            .multipart(form)
            .send()
            .await
            .map_err(|e| Error::Stt(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Stt(format!("transcription error {status}: {body}")));
        }

        let parsed: TranscriptionResponse = response
            .json()
            .await
            .map_err(|e| Error::Stt(format!("malformed transcription response: {e}")))?;

        tracing::info!(transcript = %parsed.text, "transcription complete");
        Ok(parsed.text)
    }
}

#[async_trait(?Send)]
impl SpeechInput for Recognizer {
    async fn capture_utterance(&mut self) -> Result<String> {
        // Stale audio from before this turn must not leak into it
        self.capture.clear_buffer();

        let mut endpointer = Endpointer::new();
        let utterance = loop {
            tokio::time::sleep(Duration::from_millis(100)).await;
            let samples = self.capture.take_buffer();
            if let Some(utterance) = endpointer.push(&samples) {
                break utterance;
            }
        };

        // Settle capture before resolving
        self.capture.clear_buffer();

        let wav = samples_to_wav(&utterance, SAMPLE_RATE)?;
        self.transcribe(wav).await
    }
}
