//! Wake signal detection
//!
//! Windows the microphone stream and scores each window against the wake
//! classifier. Fires exactly once per arming when the wake label's
//! confidence clears the threshold; the conversation loop re-arms the
//! detector when it returns to Idle.

use super::capture::SAMPLE_RATE;
use super::model::WakeModel;

/// Analysis window length: one second of 16kHz audio
pub const WINDOW_SAMPLES: usize = SAMPLE_RATE as usize;

/// A qualifying wake detection
#[derive(Debug, Clone, PartialEq)]
pub struct WakeEvent {
    /// The wake label's confidence for the triggering window
    pub score: f32,
    /// The label that triggered
    pub label: String,
}

/// Scores incoming audio windows and signals when the wake label clears
/// its threshold
pub struct WakeDetector {
    model: WakeModel,
    wake_index: usize,
    wake_threshold: f32,
    probability_threshold: f32,
    hop: usize,
    pending: Vec<f32>,
    armed: bool,
}

impl WakeDetector {
    /// Create a detector over a loaded model
    ///
    /// `overlap` controls how far consecutive windows overlap (0.0 = none,
    /// approaching 1.0 = maximal); the hop between windows is
    /// `window × (1 − overlap)`. The detector starts armed.
    #[must_use]
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn new(
        model: WakeModel,
        wake_index: usize,
        wake_threshold: f32,
        probability_threshold: f32,
        overlap: f32,
    ) -> Self {
        let overlap = overlap.clamp(0.0, 0.9);
        let hop = ((WINDOW_SAMPLES as f32 * (1.0 - overlap)) as usize).max(1);

        tracing::debug!(
            wake_index,
            wake_threshold,
            probability_threshold,
            hop,
            "wake detector initialized"
        );

        Self {
            model,
            wake_index,
            wake_threshold,
            probability_threshold,
            hop,
            pending: Vec::new(),
            armed: true,
        }
    }

    /// Feed a batch of samples; returns a wake event if a window qualified
    ///
    /// Consumes complete windows as they accumulate. A window counts as a
    /// classification only when its top score reaches the probability
    /// threshold; a classification triggers only when the wake label's
    /// score exceeds the wake threshold while the detector is armed. Firing
    /// disarms the detector.
    pub fn push(&mut self, samples: &[f32]) -> Option<WakeEvent> {
        self.pending.extend_from_slice(samples);

        let mut event = None;
        while self.pending.len() >= WINDOW_SAMPLES {
            let scores = self.model.score(&self.pending[..WINDOW_SAMPLES]);
            self.pending.drain(..self.hop.min(self.pending.len()));

            if event.is_none() {
                event = self.evaluate(&scores);
            }
        }

        event
    }

    fn evaluate(&mut self, scores: &[f32]) -> Option<WakeEvent> {
        let top = scores.iter().copied().fold(0.0f32, f32::max);
        if top < self.probability_threshold {
            return None;
        }

        let wake_score = scores.get(self.wake_index).copied()?;
        tracing::trace!(wake_score, top, "window classified");

        if wake_score > self.wake_threshold && self.armed {
            self.armed = false;
            let label = self
                .model
                .labels()
                .get(self.wake_index)
                .cloned()
                .unwrap_or_default();
            tracing::info!(score = wake_score, label = %label, "wake signal detected");
            return Some(WakeEvent {
                score: wake_score,
                label,
            });
        }

        None
    }

    /// Re-arm the detector, discarding any partial window
    pub fn arm(&mut self) {
        self.armed = true;
        self.pending.clear();
        tracing::debug!("wake detector armed");
    }

    /// Whether the detector will fire on a qualifying window
    #[must_use]
    pub const fn is_armed(&self) -> bool {
        self.armed
    }

    /// The label being listened for
    #[must_use]
    pub fn wake_label(&self) -> &str {
        self.model
            .labels()
            .get(self.wake_index)
            .map_or("", String::as_str)
    }
}
