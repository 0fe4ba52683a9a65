//! The outbound chat transport contract.

use crate::error::TransportError;
use async_trait::async_trait;
use std::sync::Mutex;
use venuewatch_core::ChatId;

/// Trait for delivering text messages to a chat.
///
/// The production implementation is the Telegram client in the bot binary;
/// tests use [`MemoryTransport`].
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Sends a text message to the chat.
    async fn send(&self, chat: ChatId, text: &str) -> Result<(), TransportError>;
}

/// A transport that records outbound messages in memory.
#[derive(Debug, Default)]
pub struct MemoryTransport {
    sent: Mutex<Vec<(ChatId, String)>>,
    fail: bool,
}

impl MemoryTransport {
    /// Creates a transport that accepts every message.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a transport that rejects every message.
    #[must_use]
    pub fn failing() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    /// Returns every message sent so far, in order.
    #[must_use]
    pub fn sent(&self) -> Vec<(ChatId, String)> {
        self.sent.lock().unwrap().clone()
    }

    /// Returns the texts sent to one chat, in order.
    #[must_use]
    pub fn texts_for(&self, chat: ChatId) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter(|(to, _)| *to == chat)
            .map(|(_, text)| text.clone())
            .collect()
    }
}

#[async_trait]
impl ChatTransport for MemoryTransport {
    async fn send(&self, chat: ChatId, text: &str) -> Result<(), TransportError> {
        if self.fail {
            return Err(TransportError::SendFailed {
                reason: "transport marked failing".to_string(),
            });
        }
        self.sent.lock().unwrap().push((chat, text.to_string()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_transport_records_in_order() {
        let transport = MemoryTransport::new();
        let chat = ChatId::new(5);

        transport.send(chat, "first").await.expect("send");
        transport.send(chat, "second").await.expect("send");
        transport.send(ChatId::new(6), "other").await.expect("send");

        assert_eq!(transport.texts_for(chat), vec!["first", "second"]);
        assert_eq!(transport.sent().len(), 3);
    }

    #[tokio::test]
    async fn failing_transport_rejects_sends() {
        let transport = MemoryTransport::failing();
        let result = transport.send(ChatId::new(1), "hello").await;
        assert!(result.is_err());
        assert!(transport.sent().is_empty());
    }
}
