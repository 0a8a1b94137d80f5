//! Bot API HTTP client.

use crate::error::TelegramError;
use crate::types::*;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, instrument};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Telegram Bot API client.
///
/// Every call goes to `{base_url}/bot{token}/{method}` and unwraps the
/// `{ok, result, description}` envelope.
#[derive(Clone)]
pub struct TelegramClient {
    client: Client,
    base_url: String,
    token: String,
}

impl TelegramClient {
    /// Create a new Bot API client.
    ///
    /// No global request timeout is set; `getUpdates` long polls past the
    /// per-call timeout applied to the other methods.
    pub fn new(
        base_url: impl Into<String>,
        token: impl Into<String>,
    ) -> Result<Self, TelegramError> {
        let client = Client::builder().build()?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            token: token.into(),
        })
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.base_url, self.token, method)
    }

    async fn call<B: Serialize, T: DeserializeOwned>(
        &self,
        method: &str,
        body: &B,
        timeout: Duration,
    ) -> Result<T, TelegramError> {
        let response = self
            .client
            .post(self.method_url(method))
            .timeout(timeout)
            .json(body)
            .send()
            .await?;

        let envelope: ApiResponse<T> = response.json().await?;

        if !envelope.ok {
            let description = envelope.description.unwrap_or_else(|| "unknown".into());
            return Err(TelegramError::Api(format!("{method}: {description}")));
        }

        envelope
            .result
            .ok_or_else(|| TelegramError::Api(format!("{method}: missing result")))
    }

    /// Fetch pending updates, long-polling up to `timeout`.
    #[instrument(skip(self))]
    pub async fn get_updates(
        &self,
        offset: i64,
        timeout: Duration,
    ) -> Result<Vec<Update>, TelegramError> {
        let request = GetUpdatesRequest {
            offset,
            timeout: timeout.as_secs(),
            allowed_updates: vec!["message", "callback_query"],
        };

        // Give the server's long poll room before the client gives up.
        let updates: Vec<Update> = self
            .call("getUpdates", &request, timeout + REQUEST_TIMEOUT)
            .await?;

        debug!("Received {} updates", updates.len());
        Ok(updates)
    }

    /// Send a message to a chat, optionally with a keyboard.
    #[instrument(skip(self, text, reply_markup))]
    pub async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        reply_markup: Option<ReplyMarkup>,
    ) -> Result<Message, TelegramError> {
        let request = SendMessageRequest {
            chat_id,
            text: text.to_string(),
            parse_mode: "HTML",
            reply_markup,
        };

        let message = self.call("sendMessage", &request, REQUEST_TIMEOUT).await?;
        debug!("Sent message to chat {}", chat_id);
        Ok(message)
    }

    /// Edit a previously sent message in place.
    #[instrument(skip(self, text, reply_markup))]
    pub async fn edit_message(
        &self,
        chat_id: i64,
        message_id: i64,
        text: &str,
        reply_markup: Option<ReplyMarkup>,
    ) -> Result<(), TelegramError> {
        let request = EditMessageRequest {
            chat_id,
            message_id,
            text: text.to_string(),
            parse_mode: "HTML",
            reply_markup,
        };

        // The result is the edited Message; the caller only needs success.
        let _: serde_json::Value = self
            .call("editMessageText", &request, REQUEST_TIMEOUT)
            .await?;
        Ok(())
    }

    /// Acknowledge an inline keyboard press.
    #[instrument(skip(self, text))]
    pub async fn answer_callback(
        &self,
        query_id: &str,
        text: &str,
    ) -> Result<(), TelegramError> {
        let request = AnswerCallbackRequest {
            callback_query_id: query_id.to_string(),
            text: text.to_string(),
        };

        let _: serde_json::Value = self
            .call("answerCallbackQuery", &request, REQUEST_TIMEOUT)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_send_message_unwraps_envelope() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/bottest-token/sendMessage"))
            .and(body_partial_json(serde_json::json!({
                "chat_id": 42,
                "text": "hello",
                "parse_mode": "HTML"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "ok": true,
                "result": {
                    "message_id": 5,
                    "chat": {"id": 42, "type": "private"},
                    "text": "hello"
                }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = TelegramClient::new(server.uri(), "test-token").unwrap();
        let message = client.send_message(42, "hello", None).await.unwrap();

        assert_eq!(message.message_id, 5);
    }

    #[tokio::test]
    async fn test_api_error_carries_description() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/bottest-token/sendMessage"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "ok": false,
                "description": "Bad Request: chat not found"
            })))
            .mount(&server)
            .await;

        let client = TelegramClient::new(server.uri(), "test-token").unwrap();
        let err = client.send_message(1, "hello", None).await.unwrap_err();

        match err {
            TelegramError::Api(msg) => assert!(msg.contains("chat not found")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_get_updates_advancing_offset_body() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/bottest-token/getUpdates"))
            .and(body_partial_json(serde_json::json!({
                "offset": 10,
                "allowed_updates": ["message", "callback_query"]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "ok": true,
                "result": [
                    {"update_id": 10},
                    {"update_id": 11}
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = TelegramClient::new(server.uri(), "test-token").unwrap();
        let updates = client
            .get_updates(10, Duration::from_secs(0))
            .await
            .unwrap();

        assert_eq!(updates.len(), 2);
        assert_eq!(updates[1].update_id, 11);
    }
}
