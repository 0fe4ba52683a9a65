//! Minimal Telegram Bot API client.
//!
//! Covers exactly what the bot needs: long-polled getUpdates for inbound
//! text and sendMessage for replies. The client doubles as the
//! [`ChatTransport`] implementation consumed by the conversation and
//! poller crates.

use async_trait::async_trait;
use serde::Deserialize;
use std::fmt;
use std::time::Duration;
use venuewatch_conversation::{ChatTransport, TransportError};
use venuewatch_core::ChatId;

const API_BASE: &str = "https://api.telegram.org";

/// Extra slack on top of the long-poll timeout before the HTTP request
/// itself is abandoned.
const HTTP_TIMEOUT_MARGIN: Duration = Duration::from_secs(10);

/// Errors from Telegram Bot API calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TelegramError {
    /// The HTTP request could not be sent or completed.
    RequestFailed { reason: String },
    /// The API answered with `ok: false`.
    Api { description: String },
    /// The response body could not be decoded.
    MalformedResponse { reason: String },
}

impl fmt::Display for TelegramError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RequestFailed { reason } => write!(f, "telegram request failed: {reason}"),
            Self::Api { description } => write!(f, "telegram api error: {description}"),
            Self::MalformedResponse { reason } => {
                write!(f, "telegram response malformed: {reason}")
            }
        }
    }
}

impl std::error::Error for TelegramError {}

impl From<reqwest::Error> for TelegramError {
    fn from(e: reqwest::Error) -> Self {
        Self::RequestFailed {
            reason: e.to_string(),
        }
    }
}

/// An inbound update from getUpdates.
#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    /// Monotonic update id, used as the next poll offset.
    pub update_id: i64,
    /// The new message, absent for update kinds the bot ignores.
    #[serde(default)]
    pub message: Option<IncomingMessage>,
}

/// An inbound chat message.
#[derive(Debug, Clone, Deserialize)]
pub struct IncomingMessage {
    /// The chat the message arrived from.
    pub chat: IncomingChat,
    /// Message text, absent for stickers, photos, and the like.
    #[serde(default)]
    pub text: Option<String>,
}

/// The chat a message belongs to.
#[derive(Debug, Clone, Deserialize)]
pub struct IncomingChat {
    /// Raw chat id.
    pub id: i64,
}

/// Standard Bot API response envelope.
#[derive(Debug, Deserialize)]
struct ApiEnvelope<T> {
    ok: bool,
    #[serde(default)]
    result: Option<T>,
    #[serde(default)]
    description: Option<String>,
}

impl<T> ApiEnvelope<T> {
    fn into_result(self) -> Result<Option<T>, TelegramError> {
        if self.ok {
            Ok(self.result)
        } else {
            Err(TelegramError::Api {
                description: self
                    .description
                    .unwrap_or_else(|| "no description".to_string()),
            })
        }
    }
}

/// Telegram Bot API client.
pub struct TelegramClient {
    client: reqwest::Client,
    base_url: String,
}

impl TelegramClient {
    /// Creates a client for the given bot token.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(token: &str) -> Result<Self, TelegramError> {
        let client = reqwest::Client::builder().build()?;
        Ok(Self {
            client,
            base_url: format!("{API_BASE}/bot{token}"),
        })
    }

    /// Long-polls for new updates past the given offset.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the API rejects it.
    pub async fn get_updates(
        &self,
        offset: i64,
        timeout: Duration,
    ) -> Result<Vec<Update>, TelegramError> {
        let body = serde_json::json!({
            "offset": offset,
            "timeout": timeout.as_secs(),
            "allowed_updates": ["message"],
        });

        let response = self
            .client
            .post(format!("{}/getUpdates", self.base_url))
            .timeout(timeout + HTTP_TIMEOUT_MARGIN)
            .json(&body)
            .send()
            .await?;

        let envelope: ApiEnvelope<Vec<Update>> =
            response
                .json()
                .await
                .map_err(|e| TelegramError::MalformedResponse {
                    reason: e.to_string(),
                })?;

        Ok(envelope.into_result()?.unwrap_or_default())
    }

    /// Sends a text message to a chat.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the API rejects it.
    pub async fn send_message(&self, chat: ChatId, text: &str) -> Result<(), TelegramError> {
        let body = serde_json::json!({
            "chat_id": chat.as_i64(),
            "text": text,
        });

        let response = self
            .client
            .post(format!("{}/sendMessage", self.base_url))
            .json(&body)
            .send()
            .await?;

        let envelope: ApiEnvelope<serde_json::Value> =
            response
                .json()
                .await
                .map_err(|e| TelegramError::MalformedResponse {
                    reason: e.to_string(),
                })?;

        envelope.into_result().map(|_| ())
    }
}

#[async_trait]
impl ChatTransport for TelegramClient {
    async fn send(&self, chat: ChatId, text: &str) -> Result<(), TransportError> {
        self.send_message(chat, text)
            .await
            .map_err(|e| TransportError::SendFailed {
                reason: e.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_with_text_message_decodes() {
        let update: Update = serde_json::from_value(serde_json::json!({
            "update_id": 1001,
            "message": {
                "message_id": 5,
                "chat": { "id": -42, "type": "group" },
                "text": "/start"
            }
        }))
        .expect("decode");

        assert_eq!(update.update_id, 1001);
        let message = update.message.expect("message");
        assert_eq!(message.chat.id, -42);
        assert_eq!(message.text.as_deref(), Some("/start"));
    }

    #[test]
    fn non_message_update_decodes_without_message() {
        let update: Update = serde_json::from_value(serde_json::json!({
            "update_id": 1002,
            "edited_message": { "message_id": 6 }
        }))
        .expect("decode");

        assert!(update.message.is_none());
    }

    #[test]
    fn sticker_message_has_no_text() {
        let update: Update = serde_json::from_value(serde_json::json!({
            "update_id": 1003,
            "message": {
                "chat": { "id": 7 },
                "sticker": { "file_id": "abc" }
            }
        }))
        .expect("decode");

        assert!(update.message.expect("message").text.is_none());
    }

    #[test]
    fn error_envelope_surfaces_description() {
        let envelope: ApiEnvelope<Vec<Update>> = serde_json::from_value(serde_json::json!({
            "ok": false,
            "error_code": 401,
            "description": "Unauthorized"
        }))
        .expect("decode");

        match envelope.into_result() {
            Err(TelegramError::Api { description }) => assert_eq!(description, "Unauthorized"),
            other => panic!("expected api error, got {other:?}"),
        }
    }
}
