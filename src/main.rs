mod bot;
mod error;
mod handlers;
mod inbox;
mod telegram;
mod telegram_types;
#[cfg(test)]
mod test_support;
mod types;
mod utils;

use crate::inbox::Inbox;
use crate::telegram::TelegramClient;
use crate::types::AppState;

use axum::{
    routing::{get, post},
    Router,
};
use std::env;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::prelude::*;

pub mod consts {
    use std::time::Duration;

    pub const DEFAULT_PORT: u16 = 3000;
    pub const DELIVERY_TIMEOUT: Duration = Duration::from_secs(10);
    pub const NOT_AVAILABLE: &str = "N/A";
    pub const TELEGRAM_API_URL: &str = "https://api.telegram.org";
}

/// Read an optional setting, treating an empty value as unset.
fn optional_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.is_empty())
}

fn app(app_state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/call-result", post(handlers::submit_call_result))
        .route(
            "/api/inbox",
            get(handlers::list_inbox).post(handlers::add_profile),
        )
        .route("/api/webhook", post(handlers::telegram_webhook))
        .route("/api/health", get(handlers::health))
        .with_state(app_state)
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    let subscriber = tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .compact()
                .with_file(true)
                .with_line_number(true),
        )
        .with(tracing_subscriber::filter::Targets::new().with_targets([
            ("hyper", tracing_subscriber::filter::LevelFilter::OFF),
            ("call_relay", tracing_subscriber::filter::LevelFilter::DEBUG),
        ]));
    tracing::subscriber::set_global_default(subscriber).unwrap();

    let bot_token = optional_env("TELEGRAM_BOT_TOKEN");
    let results_chat_id = optional_env("TELEGRAM_GROUP_ID");
    let api_url =
        optional_env("TELEGRAM_API_URL").unwrap_or_else(|| consts::TELEGRAM_API_URL.to_string());
    let port = optional_env("PORT")
        .map(|p| p.parse::<u16>().expect("PORT is not a valid port number"))
        .unwrap_or(consts::DEFAULT_PORT);

    if bot_token.is_none() {
        warn!("TELEGRAM_BOT_TOKEN not set; telegram delivery disabled");
    }
    if results_chat_id.is_none() {
        warn!("TELEGRAM_GROUP_ID not set; call results will not be posted");
    }

    let http_client = reqwest::Client::new();
    let app_state = Arc::new(AppState {
        telegram: TelegramClient::new(http_client, &api_url, bot_token),
        results_chat_id,
        inbox: Inbox::new(),
    });

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(%addr, "listening");
    axum::Server::bind(&addr)
        .serve(app(app_state).into_make_service())
        .await
        .unwrap();
}
