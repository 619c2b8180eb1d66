//! Conversation loop integration tests
//!
//! Drive the loop with fake speech adapters and an in-process completion
//! endpoint; no audio hardware involved.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use secrecy::SecretString;

use colloquy::voice::{SpeechInput, SpeechOutput};
use colloquy::{CompletionClient, Conversation, Error, Message, Result, Role, TranscriptView};

mod common;

/// Speech input resolving scripted utterances, then failing
struct FakeInput {
    utterances: VecDeque<String>,
    captures: usize,
}

impl FakeInput {
    fn new(utterances: &[&str]) -> Self {
        Self {
            utterances: utterances.iter().map(ToString::to_string).collect(),
            captures: 0,
        }
    }
}

#[async_trait(?Send)]
impl SpeechInput for FakeInput {
    async fn capture_utterance(&mut self) -> Result<String> {
        self.captures += 1;
        self.utterances
            .pop_front()
            .ok_or_else(|| Error::Stt("microphone closed".to_string()))
    }
}

/// Speech output recording everything spoken
struct FakeOutput {
    spoken: Arc<Mutex<Vec<String>>>,
}

impl FakeOutput {
    fn new() -> (Self, Arc<Mutex<Vec<String>>>) {
        let spoken = Arc::new(Mutex::new(Vec::new()));
        (
            Self {
                spoken: Arc::clone(&spoken),
            },
            spoken,
        )
    }
}

#[async_trait(?Send)]
impl SpeechOutput for FakeOutput {
    async fn speak(&mut self, text: &str) -> Result<()> {
        self.spoken.lock().unwrap().push(text.to_string());
        Ok(())
    }
}

/// Emits nothing: a transcript view for tests that assert on the store
struct SilentView;

impl TranscriptView for SilentView {
    fn render(&mut self, _message: &Message) {}
}

fn client_for(base: &str) -> CompletionClient {
    CompletionClient::new(
        base.to_string(),
        SecretString::from("sk-test"),
        "gpt-3.5-turbo".to_string(),
    )
    .expect("client construction")
}

#[tokio::test]
async fn test_single_turn_end_to_end() {
    let (base, api) = common::spawn_mock_api("It's sunny").await;
    let completion = client_for(&base);

    let mut input = FakeInput::new(&["what's the weather"]);
    let (mut output, spoken) = FakeOutput::new();
    let mut conversation = Conversation::new("Hey!".to_string(), Box::new(SilentView));

    // Session ends when the fake input runs dry
    let result = conversation
        .run_session(&mut input, &mut output, &completion)
        .await;
    assert!(result.is_err());

    // Greeting spoken first, reply after; the greeting is never recorded
    let spoken = spoken.lock().unwrap();
    assert_eq!(*spoken, vec!["Hey!", "It's sunny"]);

    // Transcript gains user then system, in order
    let messages = conversation.transcript().messages();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].role, Role::User);
    assert_eq!(messages[0].content, "what's the weather");
    assert_eq!(messages[1].role, Role::System);
    assert_eq!(messages[1].content, "It's sunny");

    // The completion request carried exactly the new user message
    let requests = api.completion_requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    let sent = requests[0]["messages"].as_array().unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0]["role"], "user");
    assert_eq!(sent[0]["content"], "what's the weather");

    // The loop restarted capture after speaking the reply
    assert_eq!(input.captures, 2);
}

#[tokio::test]
async fn test_second_turn_carries_prior_transcript() {
    let (base, api) = common::spawn_mock_api("Sure thing").await;
    let completion = client_for(&base);

    let mut input = FakeInput::new(&["what's the weather", "thanks"]);
    let (mut output, _spoken) = FakeOutput::new();
    let mut conversation = Conversation::new("Hey!".to_string(), Box::new(SilentView));

    let _ = conversation
        .run_session(&mut input, &mut output, &completion)
        .await;

    let requests = api.completion_requests.lock().unwrap();
    assert_eq!(requests.len(), 2);

    // Second request: prior user + prior reply + new user, in order
    let sent = requests[1]["messages"].as_array().unwrap();
    assert_eq!(sent.len(), 3);
    assert_eq!(sent[0]["role"], "user");
    assert_eq!(sent[0]["content"], "what's the weather");
    assert_eq!(sent[1]["role"], "system");
    assert_eq!(sent[1]["content"], "Sure thing");
    assert_eq!(sent[2]["role"], "user");
    assert_eq!(sent[2]["content"], "thanks");

    assert_eq!(conversation.transcript().len(), 4);
}

#[tokio::test]
async fn test_completion_failure_ends_session() {
    let (base, api) = common::spawn_mock_api("unused").await;
    *api.fail.lock().unwrap() = true;
    let completion = client_for(&base);

    let mut input = FakeInput::new(&["what's the weather"]);
    let (mut output, spoken) = FakeOutput::new();
    let mut conversation = Conversation::new("Hey!".to_string(), Box::new(SilentView));

    let result = conversation
        .run_session(&mut input, &mut output, &completion)
        .await;
    assert!(matches!(result, Err(Error::Completion(_))));

    // The user message was recorded before the failure; no reply arrived
    let messages = conversation.transcript().messages();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].role, Role::User);

    // Only the greeting was spoken
    assert_eq!(*spoken.lock().unwrap(), vec!["Hey!"]);
}

#[tokio::test]
async fn test_greeting_failure_ends_session_before_capture() {
    struct BrokenOutput;

    #[async_trait(?Send)]
    impl SpeechOutput for BrokenOutput {
        async fn speak(&mut self, _text: &str) -> Result<()> {
            Err(Error::Tts("no synthesis available".to_string()))
        }
    }

    let (base, api) = common::spawn_mock_api("unused").await;
    let completion = client_for(&base);

    let mut input = FakeInput::new(&["should never be captured"]);
    let mut output = BrokenOutput;
    let mut conversation = Conversation::new("Hey!".to_string(), Box::new(SilentView));

    let result = conversation
        .run_session(&mut input, &mut output, &completion)
        .await;
    assert!(matches!(result, Err(Error::Tts(_))));

    assert_eq!(input.captures, 0);
    assert!(conversation.transcript().is_empty());
    assert_eq!(api.request_count(), 0);
}
