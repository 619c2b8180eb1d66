//! Voice processing: capture, playback, wake detection, speech adapters

pub mod capture;
pub mod model;
pub mod playback;
pub mod recognizer;
pub mod speaker;
pub mod wake;

pub use capture::{rms_energy, samples_to_wav, AudioCapture, SAMPLE_RATE};
pub use model::{BandEnergyScorer, WakeModel, WakeScorer};
pub use playback::{AudioPlayback, CancelToken};
pub use recognizer::{Endpointer, Recognizer, SpeechInput};
pub use speaker::{Speaker, SpeechOutput};
pub use wake::{WakeDetector, WakeEvent, WINDOW_SAMPLES};
