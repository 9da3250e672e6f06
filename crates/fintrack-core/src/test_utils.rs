//! Test utilities for fintrack-core
//!
//! A mock upstream server speaking just enough of the OpenAI chat completions,
//! Ollama and Telegram Bot APIs for integration tests, plus an in-process
//! recording notifier.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    extract::{Json, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::json;
use tokio::sync::oneshot;

use crate::classify::classify_by_rules;
use crate::error::{Error, Result};
use crate::notify::Notifier;

#[derive(Default)]
struct UpstreamState {
    /// Fixed classification label; keyword rules when unset
    label: Mutex<Option<String>>,
    /// Every endpoint answers 500 while set
    failing: AtomicBool,
    classify_calls: AtomicUsize,
    messages: Mutex<Vec<String>>,
}

/// Mock OpenAI / Ollama / Telegram server for testing
pub struct MockUpstreamServer {
    addr: SocketAddr,
    state: Arc<UpstreamState>,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl MockUpstreamServer {
    /// Start the mock server on an available port
    pub async fn start() -> Self {
        let state = Arc::new(UpstreamState::default());
        let app = Router::new()
            .route("/v1/models", get(handle_models))
            .route("/v1/chat/completions", post(handle_chat))
            .route("/api/tags", get(handle_models))
            .route("/api/generate", post(handle_generate))
            .route("/:bot/sendMessage", post(handle_send_message))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .unwrap();
        });

        Self {
            addr,
            state,
            shutdown_tx: Some(shutdown_tx),
        }
    }

    /// Get the base URL for this mock server
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Answer every classification with `label`, valid or not
    pub fn answer_with(&self, label: &str) {
        *self.state.label.lock().unwrap() = Some(label.to_string());
    }

    /// Make every endpoint return 500 (or recover)
    pub fn set_failing(&self, failing: bool) {
        self.state.failing.store(failing, Ordering::SeqCst);
    }

    /// Number of classification requests received
    pub fn classify_calls(&self) -> usize {
        self.state.classify_calls.load(Ordering::SeqCst)
    }

    /// Texts received on the Telegram endpoint, in order
    pub fn messages(&self) -> Vec<String> {
        self.state.messages.lock().unwrap().clone()
    }

    /// Stop the mock server
    pub fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for MockUpstreamServer {
    fn drop(&mut self) {
        self.stop();
    }
}

fn failure() -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, "mock upstream failure").into_response()
}

fn label_for(state: &UpstreamState, vendor: &str) -> String {
    state.classify_calls.fetch_add(1, Ordering::SeqCst);
    state
        .label
        .lock()
        .unwrap()
        .clone()
        .unwrap_or_else(|| classify_by_rules(vendor).as_str().to_string())
}

async fn handle_models(State(state): State<Arc<UpstreamState>>) -> Response {
    if state.failing.load(Ordering::SeqCst) {
        return failure();
    }
    Json(json!({"data": [{"id": "mock-model"}], "models": [{"name": "mock-model"}]}))
        .into_response()
}

#[derive(Deserialize)]
struct ChatRequest {
    messages: Vec<ChatMessage>,
}

#[derive(Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

async fn handle_chat(
    State(state): State<Arc<UpstreamState>>,
    Json(request): Json<ChatRequest>,
) -> Response {
    if state.failing.load(Ordering::SeqCst) {
        return failure();
    }
    let vendor = request
        .messages
        .iter()
        .rev()
        .find(|m| m.role == "user")
        .map(|m| m.content.as_str())
        .unwrap_or_default();
    let label = label_for(&state, vendor);

    Json(json!({
        "choices": [{"index": 0, "message": {"role": "assistant", "content": label}}]
    }))
    .into_response()
}

#[derive(Deserialize)]
struct GenerateRequest {
    model: String,
    prompt: String,
}

async fn handle_generate(
    State(state): State<Arc<UpstreamState>>,
    Json(request): Json<GenerateRequest>,
) -> Response {
    if state.failing.load(Ordering::SeqCst) {
        return failure();
    }
    let label = label_for(&state, &request.prompt);
    Json(json!({"model": request.model, "response": label, "done": true})).into_response()
}

#[derive(Deserialize)]
struct SendMessage {
    text: String,
}

async fn handle_send_message(
    State(state): State<Arc<UpstreamState>>,
    Json(request): Json<SendMessage>,
) -> Response {
    if state.failing.load(Ordering::SeqCst) {
        return failure();
    }
    state.messages.lock().unwrap().push(request.text);
    Json(json!({"ok": true, "result": {"message_id": 1}})).into_response()
}

/// In-process notifier that keeps every message it is given
#[derive(Default)]
pub struct RecordingNotifier {
    messages: Mutex<Vec<String>>,
    failing: AtomicBool,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent sends fail (or succeed again)
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, text: &str) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(Error::External("recording notifier set to fail".into()));
        }
        self.messages.lock().unwrap().push(text.to_string());
        Ok(())
    }

    fn name(&self) -> &str {
        "recording"
    }
}
