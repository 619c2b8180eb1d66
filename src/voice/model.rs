//! Wake classifier model loading and scoring
//!
//! The classifier is published as two static HTTPS resources under a base
//! URL: `model.json` (topology) and `metadata.json` (label list). Both are
//! fetched once at startup; a fetch or parse failure is a startup error,
//! never a silent hang.

use serde::Deserialize;

use super::capture::SAMPLE_RATE;
use crate::{Error, Result};

/// Classifier metadata: the ordered label list the scores align with
#[derive(Debug, Deserialize)]
struct ModelMetadata {
    #[serde(alias = "words")]
    word_labels: Option<Vec<String>>,
    #[serde(rename = "wordLabels")]
    word_labels_camel: Option<Vec<String>>,
}

impl ModelMetadata {
    fn labels(self) -> Option<Vec<String>> {
        self.word_labels_camel.or(self.word_labels)
    }
}

/// Scores one fixed-length audio window into per-label confidences
///
/// Implementations must return one score per label of the loaded model, in
/// metadata order.
pub trait WakeScorer: Send {
    /// Score a window of 16kHz mono samples
    fn score(&self, window: &[f32]) -> Vec<f32>;
}

/// Loaded wake classifier: label list plus a scoring backend
pub struct WakeModel {
    labels: Vec<String>,
    scorer: Box<dyn WakeScorer>,
}

impl WakeModel {
    /// Fetch the classifier's topology and metadata from the base URL
    ///
    /// The topology is validated as JSON; the metadata supplies the ordered
    /// label list. Scoring uses the built-in band-energy backend.
    ///
    /// # Errors
    ///
    /// Returns error if either resource cannot be fetched or parsed, or if
    /// the metadata carries no labels
    pub async fn load(client: &reqwest::Client, base_url: &str) -> Result<Self> {
        let base = base_url.trim_end_matches('/');

        let topology_url = format!("{base}/model.json");
        let metadata_url = format!("{base}/metadata.json");

        tracing::debug!(url = %topology_url, "fetching wake model topology");
        let topology = client
            .get(&topology_url)
            .send()
            .await
            .map_err(|e| Error::Wake(format!("model topology fetch failed: {e}")))?
            .error_for_status()
            .map_err(|e| Error::Wake(format!("model topology fetch failed: {e}")))?;
        // Topology contents are opaque to us; a parse failure still means a
        // broken model deployment.
        let _: serde_json::Value = topology
            .json()
            .await
            .map_err(|e| Error::Wake(format!("model topology is not valid JSON: {e}")))?;

        tracing::debug!(url = %metadata_url, "fetching wake model metadata");
        let metadata: ModelMetadata = client
            .get(&metadata_url)
            .send()
            .await
            .map_err(|e| Error::Wake(format!("model metadata fetch failed: {e}")))?
            .error_for_status()
            .map_err(|e| Error::Wake(format!("model metadata fetch failed: {e}")))?
            .json()
            .await
            .map_err(|e| Error::Wake(format!("model metadata is not valid JSON: {e}")))?;

        let labels = metadata
            .labels()
            .filter(|l| !l.is_empty())
            .ok_or_else(|| Error::Wake("model metadata carries no labels".to_string()))?;

        tracing::info!(labels = ?labels, "wake model loaded");

        let scorer = Box::new(BandEnergyScorer::new(labels.len()));
        Ok(Self { labels, scorer })
    }

    /// Build a model from parts; tests drive the detector through scripted
    /// scorers this way
    #[must_use]
    pub fn from_parts(labels: Vec<String>, scorer: Box<dyn WakeScorer>) -> Self {
        Self { labels, scorer }
    }

    /// Ordered label list the scores align with
    #[must_use]
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Score one window into per-label confidences
    #[must_use]
    pub fn score(&self, window: &[f32]) -> Vec<f32> {
        self.scorer.score(window)
    }
}

/// Built-in scoring backend: per-label spectral band energies
///
/// Splits the speech band into one frequency slice per label, measures each
/// slice's energy via the Goertzel algorithm, and normalizes the energies
/// into confidences summing to one. Shaped like the classifier's output so
/// the detector's thresholding logic is identical in production and tests.
pub struct BandEnergyScorer {
    bands: Vec<f32>,
}

/// Speech band covered by the scorer, in Hz
const BAND_LOW_HZ: f32 = 100.0;
const BAND_HIGH_HZ: f32 = 4000.0;

impl BandEnergyScorer {
    /// Create a scorer producing `label_count` confidences per window
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn new(label_count: usize) -> Self {
        let count = label_count.max(1);
        let step = (BAND_HIGH_HZ - BAND_LOW_HZ) / count as f32;
        let bands = (0..count)
            .map(|i| BAND_LOW_HZ + step * (i as f32 + 0.5))
            .collect();
        Self { bands }
    }
}

impl WakeScorer for BandEnergyScorer {
    fn score(&self, window: &[f32]) -> Vec<f32> {
        let energies: Vec<f32> = self
            .bands
            .iter()
            .map(|&hz| goertzel_power(window, hz))
            .collect();

        let total: f32 = energies.iter().sum();
        if total <= f32::EPSILON {
            // Silence scores nothing; confidence spreads evenly
            #[allow(clippy::cast_precision_loss)]
            return vec![1.0 / energies.len() as f32; energies.len()];
        }

        energies.iter().map(|e| e / total).collect()
    }
}

/// Signal power at one frequency (Goertzel algorithm)
#[allow(clippy::cast_precision_loss)]
fn goertzel_power(samples: &[f32], frequency: f32) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }

    let omega = 2.0 * std::f32::consts::PI * frequency / SAMPLE_RATE as f32;
    let coeff = 2.0 * omega.cos();

    let mut s_prev = 0.0f32;
    let mut s_prev2 = 0.0f32;
    for &sample in samples {
        let s = sample + coeff * s_prev - s_prev2;
        s_prev2 = s_prev;
        s_prev = s;
    }

    let power = s_prev2.mul_add(s_prev2, s_prev * s_prev) - coeff * s_prev * s_prev2;
    power / samples.len() as f32
}
