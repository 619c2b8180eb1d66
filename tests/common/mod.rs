//! Shared test utilities
//!
//! In-process HTTP server standing in for the remote completion and wake
//! model endpoints.

// Each test binary uses a different subset of these helpers
#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};

/// Handle to the mock API's recorded state
#[derive(Clone)]
pub struct MockApi {
    /// Request bodies received by the completions route, in order
    pub completion_requests: Arc<Mutex<Vec<serde_json::Value>>>,
    /// Reply content the completions route returns
    pub reply: Arc<Mutex<String>>,
    /// When true the completions route answers 500
    pub fail: Arc<Mutex<bool>>,
}

impl MockApi {
    fn new(reply: &str) -> Self {
        Self {
            completion_requests: Arc::new(Mutex::new(Vec::new())),
            reply: Arc::new(Mutex::new(reply.to_string())),
            fail: Arc::new(Mutex::new(false)),
        }
    }

    /// Number of completion requests received so far
    #[allow(dead_code)]
    pub fn request_count(&self) -> usize {
        self.completion_requests.lock().unwrap().len()
    }
}

/// Spawn a mock API answering completions with `reply`; returns its base URL
#[allow(dead_code)]
pub async fn spawn_mock_api(reply: &str) -> (String, MockApi) {
    let state = MockApi::new(reply);

    let app = Router::new()
        .route("/v1/chat/completions", post(completions))
        .with_state(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("failed to bind mock api");
    let addr = listener.local_addr().expect("no local addr");

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("mock api crashed");
    });

    (format!("http://{addr}"), state)
}

async fn completions(
    State(state): State<MockApi>,
    Json(body): Json<serde_json::Value>,
) -> Result<Json<serde_json::Value>, axum::http::StatusCode> {
    state.completion_requests.lock().unwrap().push(body);

    if *state.fail.lock().unwrap() {
        return Err(axum::http::StatusCode::INTERNAL_SERVER_ERROR);
    }

    let reply = state.reply.lock().unwrap().clone();
    Ok(Json(serde_json::json!({
        "choices": [{"message": {"role": "assistant", "content": reply}}]
    })))
}

/// Spawn a static host serving a wake model's topology and metadata;
/// returns its base URL
#[allow(dead_code)]
pub async fn spawn_model_host(labels: &[&str]) -> String {
    let metadata = serde_json::json!({ "wordLabels": labels });

    let app = Router::new()
        .route(
            "/model.json",
            get(|| async { Json(serde_json::json!({"modelTopology": {}})) }),
        )
        .route("/metadata.json", get(move || async move { Json(metadata) }));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("failed to bind model host");
    let addr = listener.local_addr().expect("no local addr");

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("model host crashed");
    });

    format!("http://{addr}")
}
