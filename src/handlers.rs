use crate::bot::handle_update;
use crate::error::AppError;
use crate::inbox::WEB_APP_SOURCE;
use crate::telegram_types::Update;
use crate::types::{
    AppState, CallResult, CallResultReceipt, HealthReport, InboxListing, InboxReceipt,
};
use crate::utils::{now_iso8601, parse_object};

use axum::{body::Bytes, extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, error, info, trace, warn};

/// Parse a call result from the raw body. The body must be a JSON object.
fn parse_call_result(body: &[u8]) -> Result<CallResult, AppError> {
    let fields = parse_object(body)?;
    Ok(serde_json::from_value(Value::Object(fields))?)
}

/// Relay a call outcome to the results chat. Delivery failure is reported through
/// `telegram_posted`, never as a failed request.
pub async fn submit_call_result(
    State(app_state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<CallResultReceipt>, AppError> {
    trace!(body=%String::from_utf8_lossy(&body), "call result request body");
    let mut call_result = parse_call_result(&body).map_err(|e| {
        error!(error=%e, "failed to parse call result");
        e
    })?;
    call_result.submitted_at = Some(now_iso8601()?);
    debug!(outcome=?call_result.outcome, submitted_at=?call_result.submitted_at, "call result received");

    let telegram_posted = app_state.post_call_result(&call_result).await;

    Ok(Json(CallResultReceipt {
        success: true,
        message: "Call result submitted",
        telegram_posted,
    }))
}

pub async fn list_inbox(State(app_state): State<Arc<AppState>>) -> Json<InboxListing> {
    let profiles = app_state.inbox.profiles();
    let count = profiles.len();
    Json(InboxListing { profiles, count })
}

pub async fn add_profile(
    State(app_state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<InboxReceipt>, AppError> {
    let fields = parse_object(&body).map_err(|e| {
        error!(error=%e, "failed to parse inbox submission");
        e
    })?;
    let (profile, inbox_count) = app_state
        .inbox
        .receive(fields, WEB_APP_SOURCE)
        .map_err(|e| {
            warn!(error=%e, "rejected inbox submission");
            e
        })?;
    info!(inbox_count, "profile added to inbox");
    Ok(Json(InboxReceipt {
        success: true,
        message: "Profile added to inbox",
        profile,
        inbox_count,
    }))
}

/// Telegram webhook. Answers `OK` for every update it can parse so Telegram does not redeliver.
pub async fn telegram_webhook(
    State(app_state): State<Arc<AppState>>,
    body: Bytes,
) -> impl IntoResponse {
    let update = match serde_json::from_slice::<Update>(&body) {
        Ok(update) => update,
        Err(e) => {
            error!(error=%e, "failed to deserialize telegram update");
            return (StatusCode::INTERNAL_SERVER_ERROR, "Error");
        }
    };
    handle_update(&app_state, update).await;
    (StatusCode::OK, "OK")
}

pub async fn health(State(app_state): State<Arc<AppState>>) -> Json<HealthReport> {
    Json(HealthReport {
        status: "ok",
        profiles: app_state.inbox.len(),
        telegram: app_state.telegram.is_configured(),
    })
}
