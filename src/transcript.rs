//! Ordered conversation transcript
//!
//! Append-only log of exchanged messages, mirrored to a visible
//! conversation surface as each message arrives. Insertion order is the
//! only ordering guarantee and equals conversation chronology.

use serde::{Deserialize, Serialize};

/// Who said a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Spoken by the person talking to the assistant
    User,
    /// Spoken by the assistant (the completion endpoint's convention)
    System,
}

impl Role {
    /// Display prefix for the conversation surface
    #[must_use]
    pub const fn prefix(self) -> &'static str {
        match self {
            Self::User => "you",
            Self::System => "assistant",
        }
    }
}

/// One exchanged message, immutable once created
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    /// Create a user message
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// Create an assistant message
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }
}

/// Visible conversation surface receiving each appended message
pub trait TranscriptView: Send {
    /// Render one message, newest last
    fn render(&mut self, message: &Message);
}

/// Console renderer: one line per message with a role prefix
#[derive(Debug, Default)]
pub struct ConsoleView;

impl TranscriptView for ConsoleView {
    fn render(&mut self, message: &Message) {
        println!("{}> {}", message.role.prefix(), message.content);
    }
}

/// Append-only ordered log of messages for one session
pub struct Transcript {
    messages: Vec<Message>,
    view: Box<dyn TranscriptView>,
}

impl Transcript {
    /// Create an empty transcript mirrored to the given view
    #[must_use]
    pub fn new(view: Box<dyn TranscriptView>) -> Self {
        Self {
            messages: Vec::new(),
            view,
        }
    }

    /// Append a message to the end of the log and mirror it to the view
    pub fn append(&mut self, message: Message) {
        self.view.render(&message);
        self.messages.push(message);
    }

    /// All messages in insertion order
    #[must_use]
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Number of messages recorded so far
    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Whether nothing has been recorded yet
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

impl Default for Transcript {
    fn default() -> Self {
        Self::new(Box::new(ConsoleView))
    }
}
