//! Chat completion client
//!
//! Sends the transcript plus the newest user message to a remote
//! chat-completion endpoint and extracts the assistant's reply from the
//! first returned choice. Single attempt per cycle; no retry, no backoff.

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::transcript::Message;
use crate::{Error, Result};

/// Message as returned inside a completion choice
///
/// The endpoint tags replies with its own role string ("assistant");
/// the caller normalizes the role when recording the reply.
#[derive(Debug, Clone, Deserialize)]
pub struct ChoiceMessage {
    #[serde(default)]
    pub role: String,
    pub content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<&'a Message>,
}

/// Client for the remote chat-completion endpoint
pub struct CompletionClient {
    client: reqwest::Client,
    base_url: String,
    api_key: SecretString,
    model: String,
}

impl CompletionClient {
    /// Create a new completion client
    ///
    /// # Errors
    ///
    /// Returns error if the API credential is empty
    pub fn new(base_url: String, api_key: SecretString, model: String) -> Result<Self> {
        if api_key.expose_secret().is_empty() {
            return Err(Error::Config(
                "API key required for chat completions".to_string(),
            ));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            model,
        })
    }

    /// Request a reply for the prior transcript plus one new user message
    ///
    /// The message list sent is `history` concatenated with `new_message`.
    ///
    /// # Errors
    ///
    /// Returns error on network failure, non-success status, or a response
    /// missing `choices[0]`
    pub async fn complete(
        &self,
        history: &[Message],
        new_message: &Message,
    ) -> Result<ChoiceMessage> {
        let messages: Vec<&Message> = history.iter().chain(std::iter::once(new_message)).collect();

        tracing::debug!(messages = messages.len(), model = %self.model, "requesting completion");

        let request = ChatRequest {
            model: &self.model,
            messages,
        };

        let response = self
            .client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .header(
                "Authorization",
                format!("Bearer {}", self.api_key.expose_secret()),
            )
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Completion(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Completion(format!(
                "completion API error {status}: {body}"
            )));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| Error::Completion(format!("malformed completion response: {e}")))?;

        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| Error::Completion("completion response has no choices".to_string()))?;

        tracing::debug!(reply_chars = choice.message.content.len(), "completion received");
        Ok(choice.message)
    }
}
