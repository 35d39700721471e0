use crate::consts::DELIVERY_TIMEOUT;
use crate::error::AppError;
use crate::telegram_types::{ApiResponse, DeleteMessage, File, SendMessage, SentMessage};

use std::time::Duration;
use tracing::trace;

/// Thin client for the handful of Bot API methods the relay needs.
pub struct TelegramClient {
    http_client: reqwest::Client,
    api_url: String,
    bot_token: Option<String>,
    timeout: Duration,
}

impl TelegramClient {
    pub fn new(http_client: reqwest::Client, api_url: &str, bot_token: Option<String>) -> Self {
        Self {
            http_client,
            api_url: api_url.trim_end_matches('/').to_string(),
            bot_token,
            timeout: DELIVERY_TIMEOUT,
        }
    }

    #[cfg(test)]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn is_configured(&self) -> bool {
        self.bot_token.is_some()
    }

    fn token(&self) -> Result<&str, AppError> {
        self.bot_token
            .as_deref()
            .ok_or_else(|| AppError::Delivery("TELEGRAM_BOT_TOKEN not set".to_string()))
    }

    fn method_url(&self, token: &str, method: &str) -> String {
        format!("{}/bot{token}/{method}", self.api_url)
    }

    async fn post_message(
        &self,
        chat_id: &str,
        text: &str,
    ) -> Result<reqwest::Response, AppError> {
        let token = self.token()?;
        let payload = SendMessage {
            chat_id,
            text,
            parse_mode: "Markdown",
        };
        let resp = self
            .http_client
            .post(self.method_url(token, "sendMessage"))
            .timeout(self.timeout)
            .json(&payload)
            .send()
            .await?
            .error_for_status()?;
        trace!(status=%resp.status(), "telegram sendMessage");
        Ok(resp)
    }

    /// Send a Markdown message. Bounded by the delivery timeout; any non-2xx answer is an error.
    /// Without a bot token this fails before touching the network.
    pub async fn send_message(&self, chat_id: &str, text: &str) -> Result<(), AppError> {
        self.post_message(chat_id, text).await?;
        Ok(())
    }

    /// Send a message that is meant to be removed later; returns its message id.
    pub async fn send_status_message(&self, chat_id: &str, text: &str) -> Result<i64, AppError> {
        let resp: ApiResponse<SentMessage> = self.post_message(chat_id, text).await?.json().await?;
        match resp.result {
            Some(sent) if resp.ok => Ok(sent.message_id),
            _ => Err(AppError::Delivery(
                resp.description
                    .unwrap_or_else(|| "sendMessage returned no message".to_string()),
            )),
        }
    }

    pub async fn delete_message(&self, chat_id: &str, message_id: i64) -> Result<(), AppError> {
        let token = self.token()?;
        self.http_client
            .post(self.method_url(token, "deleteMessage"))
            .timeout(self.timeout)
            .json(&DeleteMessage {
                chat_id,
                message_id,
            })
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    /// Fetch the contents of an uploaded file as text.
    pub async fn download_file(&self, file_id: &str) -> Result<String, AppError> {
        let token = self.token()?;
        let resp: ApiResponse<File> = self
            .http_client
            .get(self.method_url(token, "getFile"))
            .query(&[("file_id", file_id)])
            .timeout(self.timeout)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        let file_path = match resp {
            ApiResponse {
                ok: true,
                result:
                    Some(File {
                        file_path: Some(path),
                    }),
                ..
            } => path,
            ApiResponse { description, .. } => {
                return Err(AppError::Delivery(
                    description.unwrap_or_else(|| "Failed to get file".to_string()),
                ))
            }
        };

        let url = format!("{}/file/bot{token}/{file_path}", self.api_url);
        let text = self
            .http_client
            .get(url)
            .timeout(self.timeout)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::FakeTelegram;
    use http::StatusCode;

    #[test]
    fn method_url_includes_token() {
        let client = TelegramClient::new(
            reqwest::Client::new(),
            "https://api.telegram.org/",
            Some("123:ABC".into()),
        );
        assert_eq!(
            client.method_url("123:ABC", "sendMessage"),
            "https://api.telegram.org/bot123:ABC/sendMessage"
        );
    }

    #[tokio::test]
    async fn send_without_token_makes_no_request() {
        let fake = FakeTelegram::start(StatusCode::OK).await;
        let client = TelegramClient::new(reqwest::Client::new(), &fake.url, None);
        assert!(!client.is_configured());
        let err = client.send_message("42", "hi").await.unwrap_err();
        assert!(matches!(err, AppError::Delivery(_)));
        assert!(fake.calls().is_empty());
    }

    #[tokio::test]
    async fn send_posts_markdown_payload() {
        let fake = FakeTelegram::start(StatusCode::OK).await;
        let client = TelegramClient::new(reqwest::Client::new(), &fake.url, Some("tok".into()));
        client.send_message("-100", "*hello*").await.unwrap();

        let calls = fake.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].path, "/bottok/sendMessage");
        assert_eq!(calls[0].body["chat_id"], "-100");
        assert_eq!(calls[0].body["text"], "*hello*");
        assert_eq!(calls[0].body["parse_mode"], "Markdown");
    }

    #[tokio::test]
    async fn provider_rejection_is_a_delivery_error() {
        let fake = FakeTelegram::start(StatusCode::BAD_REQUEST).await;
        let client = TelegramClient::new(reqwest::Client::new(), &fake.url, Some("tok".into()));
        let err = client.send_message("-100", "hi").await.unwrap_err();
        assert!(matches!(err, AppError::Delivery(_)));
    }

    #[tokio::test]
    async fn unreachable_provider_is_a_delivery_error() {
        let client = TelegramClient::new(
            reqwest::Client::new(),
            "http://127.0.0.1:9",
            Some("tok".into()),
        );
        let err = client.send_message("-100", "hi").await.unwrap_err();
        assert!(matches!(err, AppError::Delivery(_)));
    }

    #[test]
    fn default_timeout_is_ten_seconds() {
        let client = TelegramClient::new(reqwest::Client::new(), "http://localhost", None);
        assert_eq!(client.timeout, Duration::from_secs(10));
    }

    #[tokio::test]
    async fn stalled_provider_is_a_delivery_error() {
        let fake = FakeTelegram::start(StatusCode::OK)
            .await
            .with_stall(Duration::from_secs(5));
        let client = TelegramClient::new(reqwest::Client::new(), &fake.url, Some("tok".into()))
            .with_timeout(Duration::from_millis(200));

        let started = std::time::Instant::now();
        let err = client.send_message("-100", "hi").await.unwrap_err();

        assert!(matches!(err, AppError::Delivery(_)));
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn status_message_returns_id_and_can_be_deleted() {
        let fake = FakeTelegram::start(StatusCode::OK).await;
        let client = TelegramClient::new(reqwest::Client::new(), &fake.url, Some("tok".into()));

        let message_id = client.send_status_message("7", "working").await.unwrap();
        client.delete_message("7", message_id).await.unwrap();

        let calls = fake.calls();
        assert_eq!(calls[1].path, "/bottok/deleteMessage");
        assert_eq!(calls[1].body["chat_id"], "7");
        assert_eq!(calls[1].body["message_id"], message_id);
    }

    #[tokio::test]
    async fn download_resolves_file_path_then_fetches() {
        let fake = FakeTelegram::start(StatusCode::OK)
            .await
            .with_document(r#"{"firstName":"A","lastName":"B"}"#);
        let client = TelegramClient::new(reqwest::Client::new(), &fake.url, Some("tok".into()));
        let text = client.download_file("file-1").await.unwrap();
        assert_eq!(text, r#"{"firstName":"A","lastName":"B"}"#);

        let paths: Vec<_> = fake.calls().into_iter().map(|c| c.path).collect();
        assert_eq!(
            paths,
            ["/bottok/getFile", "/file/bottok/documents/file_0.json"]
        );
    }
}
