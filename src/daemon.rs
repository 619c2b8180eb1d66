//! Daemon - wiring, startup checks, and the wake/conversation cycle
//!
//! Startup fails fast: a missing input device, missing output device,
//! missing credential, or an unreachable wake model aborts initialization
//! with a fatal error. Once running, the daemon alternates between Idle
//! (scanning for the wake signal) and Active (one conversation session);
//! a session error logs, re-arms the detector, and returns to Idle.

use std::time::Duration;

use crate::completion::CompletionClient;
use crate::config::Config;
use crate::conversation::Conversation;
use crate::transcript::ConsoleView;
use crate::voice::{
    AudioCapture, AudioPlayback, Recognizer, Speaker, WakeDetector, WakeModel,
};
use crate::Result;

/// Interval between wake scan polls of the microphone buffer
const SCAN_INTERVAL: Duration = Duration::from_millis(100);

/// The assistant daemon
pub struct Daemon {
    config: Config,
}

impl Daemon {
    /// Create a daemon from resolved configuration
    #[must_use]
    pub const fn new(config: Config) -> Self {
        Self { config }
    }

    /// Run until interrupted
    ///
    /// # Errors
    ///
    /// Returns error if any startup capability check fails: wake model
    /// unreachable, no audio devices, or missing credential
    #[allow(clippy::future_not_send)]
    pub async fn run(self) -> Result<()> {
        let http = reqwest::Client::new();

        let model_url = self.config.require_wake_model_url()?;
        let model = WakeModel::load(&http, model_url).await?;

        // Capability checks happen here, never mid-conversation
        let capture = AudioCapture::new()?;
        let playback = AudioPlayback::new()?;

        let mut recognizer = Recognizer::new(
            capture,
            self.config.api_base_url.clone(),
            self.config.api_key.clone(),
            self.config.stt_model.clone(),
        )?;
        let mut speaker = Speaker::new(
            playback,
            self.config.api_base_url.clone(),
            self.config.api_key.clone(),
            self.config.tts_model.clone(),
            self.config.tts_voice.clone(),
            self.config.tts_speed,
        )?;
        let completion = CompletionClient::new(
            self.config.api_base_url.clone(),
            self.config.api_key.clone(),
            self.config.completion_model.clone(),
        )?;

        let mut detector = WakeDetector::new(
            model,
            self.config.wake_label_index,
            self.config.wake_threshold,
            self.config.probability_threshold,
            self.config.overlap,
        );

        recognizer.start()?;
        tracing::info!(
            assistant = %self.config.assistant_name,
            wake_label = detector.wake_label(),
            "joined the chat"
        );

        loop {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("shutdown requested");
                    break;
                }
                () = tokio::time::sleep(SCAN_INTERVAL) => {
                    let samples = recognizer.drain_samples();
                    let Some(event) = detector.push(&samples) else {
                        continue;
                    };

                    tracing::info!(score = event.score, label = %event.label, "wake detected");

                    let mut conversation = Conversation::new(
                        self.config.greeting.clone(),
                        Box::new(ConsoleView),
                    );

                    let interrupted = tokio::select! {
                        _ = tokio::signal::ctrl_c() => {
                            tracing::info!("shutdown requested");
                            true
                        }
                        result = conversation.run_session(
                            &mut recognizer,
                            &mut speaker,
                            &completion,
                        ) => {
                            if let Err(e) = result {
                                tracing::warn!(
                                    session = %conversation.session_id(),
                                    error = %e,
                                    "session ended"
                                );
                            }
                            false
                        }
                    };

                    if interrupted {
                        break;
                    }

                    // Back to Idle: discard mid-session audio, re-arm
                    let _ = recognizer.drain_samples();
                    detector.arm();
                    tracing::info!("idle, listening for wake signal");
                }
            }
        }

        recognizer.stop();
        Ok(())
    }
}
