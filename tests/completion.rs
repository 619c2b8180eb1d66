//! Completion client integration tests against an in-process endpoint

use secrecy::SecretString;

use colloquy::{CompletionClient, Error, Message};

mod common;

fn client_for(base: &str) -> CompletionClient {
    CompletionClient::new(
        base.to_string(),
        SecretString::from("sk-test"),
        "gpt-3.5-turbo".to_string(),
    )
    .expect("client construction")
}

#[tokio::test]
async fn test_complete_sends_history_then_new_message() {
    let (base, api) = common::spawn_mock_api("It's sunny").await;
    let client = client_for(&base);

    let history = vec![
        Message::user("hello"),
        Message::system("Hi! How can I help?"),
    ];
    let new_message = Message::user("what's the weather");

    let reply = client.complete(&history, &new_message).await.unwrap();
    assert_eq!(reply.role, "assistant");
    assert_eq!(reply.content, "It's sunny");

    let requests = api.completion_requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0]["model"], "gpt-3.5-turbo");

    let sent = requests[0]["messages"].as_array().unwrap();
    assert_eq!(sent.len(), 3);
    assert_eq!(sent[0]["content"], "hello");
    assert_eq!(sent[1]["content"], "Hi! How can I help?");
    assert_eq!(sent[2]["content"], "what's the weather");
}

#[tokio::test]
async fn test_complete_with_empty_history() {
    let (base, api) = common::spawn_mock_api("Hello there").await;
    let client = client_for(&base);

    let reply = client.complete(&[], &Message::user("hi")).await.unwrap();
    assert_eq!(reply.content, "Hello there");

    let requests = api.completion_requests.lock().unwrap();
    let sent = requests[0]["messages"].as_array().unwrap();
    assert_eq!(sent.len(), 1);
}

#[tokio::test]
async fn test_server_error_rejects_without_retry() {
    let (base, api) = common::spawn_mock_api("unused").await;
    *api.fail.lock().unwrap() = true;
    let client = client_for(&base);

    let result = client.complete(&[], &Message::user("hi")).await;
    assert!(matches!(result, Err(Error::Completion(_))));

    // Single attempt per cycle
    assert_eq!(api.request_count(), 1);
}

#[tokio::test]
async fn test_unreachable_endpoint_rejects() {
    // Nothing listens here
    let client = client_for("http://127.0.0.1:1");

    let result = client.complete(&[], &Message::user("hi")).await;
    assert!(matches!(result, Err(Error::Completion(_))));
}
