//! Colloquy - wake-word activated voice assistant daemon
//!
//! Listens for a wake signal via an audio-classification model, transcribes
//! spoken input, forwards it to a chat-completion endpoint, and speaks the
//! reply aloud, looping turn after turn.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────┐
//! │                    Microphone                     │
//! └──────────┬────────────────────────┬──────────────┘
//!            │                        │
//!     ┌──────▼──────┐          ┌──────▼──────┐
//!     │ WakeDetector│          │  Recognizer │
//!     └──────┬──────┘          └──────┬──────┘
//!            │ wake event             │ transcript
//! ┌──────────▼────────────────────────▼──────────────┐
//! │              Conversation loop                    │
//! │   greet → capture → complete → record → speak    │
//! └──────────┬────────────────────────┬──────────────┘
//!            │                        │
//!     ┌──────▼──────┐          ┌──────▼──────┐
//!     │ Completion  │          │   Speaker   │
//!     │  endpoint   │          │  (TTS out)  │
//!     └─────────────┘          └─────────────┘
//! ```

pub mod completion;
pub mod config;
pub mod conversation;
pub mod daemon;
pub mod error;
pub mod transcript;
pub mod voice;

pub use completion::{ChoiceMessage, CompletionClient};
pub use config::Config;
pub use conversation::Conversation;
pub use daemon::Daemon;
pub use error::{Error, Result};
pub use transcript::{ConsoleView, Message, Role, Transcript, TranscriptView};
