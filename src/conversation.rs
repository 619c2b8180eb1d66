//! Conversation loop
//!
//! Two phases: Idle (wake detector armed, no conversation) and Active (a
//! turn in progress). Within a session, steps run strictly sequentially,
//! each awaited to completion before the next: greet, capture, record the
//! user message, request a completion, record the reply, speak it, then
//! loop back to capture. Once triggered, the assistant keeps conversing
//! turn after turn without re-detecting the wake signal; an error in any
//! step ends the session and the daemon returns to Idle.

use uuid::Uuid;

use crate::completion::CompletionClient;
use crate::transcript::{Message, Transcript, TranscriptView};
use crate::voice::{SpeechInput, SpeechOutput};
use crate::Result;

/// One session's state: the ordered transcript plus the greeting
pub struct Conversation {
    transcript: Transcript,
    greeting: String,
    session_id: Uuid,
}

impl Conversation {
    /// Create a session with an empty transcript mirrored to `view`
    #[must_use]
    pub fn new(greeting: String, view: Box<dyn TranscriptView>) -> Self {
        Self {
            transcript: Transcript::new(view),
            greeting,
            session_id: Uuid::new_v4(),
        }
    }

    /// The session's transcript
    #[must_use]
    pub const fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// Identifier correlating this session's log lines
    #[must_use]
    pub const fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// Run the Active phase until a step fails
    ///
    /// Speaks the greeting (spoken only, never recorded), then cycles
    /// capture → record → complete → record → speak indefinitely.
    ///
    /// # Errors
    ///
    /// Returns the first step failure; the transcript keeps everything
    /// recorded up to that point
    pub async fn run_session(
        &mut self,
        input: &mut dyn SpeechInput,
        output: &mut dyn SpeechOutput,
        completion: &CompletionClient,
    ) -> Result<()> {
        tracing::info!(session = %self.session_id, "conversation started");

        output.speak(&self.greeting).await?;

        loop {
            tracing::info!(session = %self.session_id, "listening");
            let text = input.capture_utterance().await?;

            let user_message = Message::user(text);
            // The completion request carries the transcript as it stood
            // before this turn's user message, plus that message
            let history = self.transcript.messages().to_vec();
            self.transcript.append(user_message.clone());

            tracing::info!(session = %self.session_id, "thinking");
            let reply = completion.complete(&history, &user_message).await?;

            // The endpoint tags replies "assistant"; the transcript records
            // them under the system role
            let reply_message = Message::system(reply.content);
            self.transcript.append(reply_message.clone());

            output.speak(&reply_message.content).await?;

            tracing::debug!(
                session = %self.session_id,
                messages = self.transcript.len(),
                "turn complete"
            );
        }
    }
}
