//! Local stand-in for the Telegram Bot API that records every request it receives.

use crate::inbox::Inbox;
use crate::telegram::TelegramClient;
use crate::types::AppState;

use axum::{
    extract::State,
    http::{StatusCode, Uri},
    response::IntoResponse,
    Json, Router,
};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub path: String,
    pub body: Value,
}

struct FakeState {
    send_status: StatusCode,
    document: Mutex<Option<String>>,
    stall: Mutex<Option<Duration>>,
    calls: Mutex<Vec<RecordedCall>>,
}

pub struct FakeTelegram {
    pub url: String,
    state: Arc<FakeState>,
}

impl FakeTelegram {
    /// Start the fake on a random local port. `sendMessage` answers with `send_status`.
    pub async fn start(send_status: StatusCode) -> Self {
        let state = Arc::new(FakeState {
            send_status,
            document: Mutex::new(None),
            stall: Mutex::new(None),
            calls: Mutex::new(Vec::new()),
        });
        let app = Router::new().fallback(record).with_state(state.clone());
        let server = axum::Server::bind(&SocketAddr::from(([127, 0, 0, 1], 0)))
            .serve(app.into_make_service());
        let url = format!("http://{}", server.local_addr());
        tokio::spawn(async move { server.await.unwrap() });
        Self { url, state }
    }

    /// Serve `contents` as the file behind any `getFile` lookup.
    pub fn with_document(self, contents: &str) -> Self {
        *self.state.document.lock().unwrap() = Some(contents.to_string());
        self
    }

    /// Hold every `sendMessage` answer back for `delay`.
    pub fn with_stall(self, delay: Duration) -> Self {
        *self.state.stall.lock().unwrap() = Some(delay);
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.state.calls.lock().unwrap().clone()
    }

    /// Texts of every `sendMessage` call, in order.
    pub fn sent_texts(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|c| c.path.ends_with("/sendMessage"))
            .filter_map(|c| c.body["text"].as_str().map(str::to_string))
            .collect()
    }
}

async fn record(
    State(state): State<Arc<FakeState>>,
    uri: Uri,
    body: String,
) -> axum::response::Response {
    let path = uri.path().to_string();
    let message_id = {
        let mut calls = state.calls.lock().unwrap();
        calls.push(RecordedCall {
            path: path.clone(),
            body: serde_json::from_str(&body).unwrap_or(Value::Null),
        });
        calls.len()
    };

    if path.ends_with("/sendMessage") {
        let stall = *state.stall.lock().unwrap();
        if let Some(delay) = stall {
            tokio::time::sleep(delay).await;
        }
        let ok = state.send_status.is_success();
        return (
            state.send_status,
            Json(json!({ "ok": ok, "result": { "message_id": message_id } })),
        )
            .into_response();
    }
    if path.ends_with("/deleteMessage") {
        return Json(json!({ "ok": true, "result": true })).into_response();
    }
    if path.ends_with("/getFile") {
        return Json(json!({
            "ok": true,
            "result": { "file_id": "file-1", "file_path": "documents/file_0.json" }
        }))
        .into_response();
    }
    if path.contains("/file/bot") {
        return match state.document.lock().unwrap().clone() {
            Some(contents) => contents.into_response(),
            None => StatusCode::NOT_FOUND.into_response(),
        };
    }
    StatusCode::NOT_FOUND.into_response()
}

/// Like [`test_state`] with a token and results chat, but with a short delivery timeout.
pub fn stalling_state(api_url: &str, timeout: Duration) -> Arc<AppState> {
    Arc::new(AppState {
        telegram: TelegramClient::new(reqwest::Client::new(), api_url, Some("tok".to_string()))
            .with_timeout(timeout),
        results_chat_id: Some("-100".to_string()),
        inbox: Inbox::new(),
    })
}

pub fn test_state(
    api_url: &str,
    bot_token: Option<&str>,
    results_chat_id: Option<&str>,
) -> Arc<AppState> {
    Arc::new(AppState {
        telegram: TelegramClient::new(
            reqwest::Client::new(),
            api_url,
            bot_token.map(str::to_string),
        ),
        results_chat_id: results_chat_id.map(str::to_string),
        inbox: Inbox::new(),
    })
}
