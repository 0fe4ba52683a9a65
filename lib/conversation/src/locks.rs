//! Per-chat serialization of session access.
//!
//! The store gives per-operation atomicity, but a handler or poll tick is a
//! read-decide-write sequence. Both take the chat's lock for the whole
//! sequence, so {message handling, poll tick} for one chat is totally
//! ordered while unrelated chats proceed concurrently.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use venuewatch_core::ChatId;

/// A lazily grown map of per-chat async mutexes.
#[derive(Debug, Default)]
pub struct SessionLocks {
    locks: Mutex<HashMap<ChatId, Arc<AsyncMutex<()>>>>,
}

impl SessionLocks {
    /// Creates an empty lock map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquires the lock for a chat, waiting if a handler or poll tick for
    /// the same chat currently holds it.
    pub async fn acquire(&self, chat: ChatId) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap();
            Arc::clone(locks.entry(chat).or_default())
        };
        lock.lock_owned().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn same_chat_is_exclusive() {
        let locks = Arc::new(SessionLocks::new());
        let chat = ChatId::new(1);

        let guard = locks.acquire(chat).await;

        let contender = {
            let locks = Arc::clone(&locks);
            tokio::spawn(async move {
                let _guard = locks.acquire(chat).await;
            })
        };

        tokio::task::yield_now().await;
        assert!(!contender.is_finished());

        drop(guard);
        contender.await.expect("contender should finish");
    }

    #[tokio::test]
    async fn different_chats_do_not_block() {
        let locks = SessionLocks::new();

        let _first = locks.acquire(ChatId::new(1)).await;
        // Completes immediately because it is a different key.
        let _second = locks.acquire(ChatId::new(2)).await;
    }

    #[tokio::test]
    async fn lock_is_reacquirable_after_release() {
        let locks = SessionLocks::new();
        let chat = ChatId::new(3);

        drop(locks.acquire(chat).await);
        drop(locks.acquire(chat).await);
    }
}
