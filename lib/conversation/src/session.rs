//! Per-chat session state and the store contract.
//!
//! One record per chat, keyed by [`ChatId`]. The store owns the canonical
//! record; the state machine and the poller hold transient copies and write
//! every mutation back through [`SessionStore::set`]. Absence of a record is
//! equivalent to a fresh [`Session::AwaitingQuery`].

use crate::error::StoreError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};
use venuewatch_core::ChatId;
use venuewatch_directory::Venue;

/// The conversation state of one chat.
///
/// The variant data encodes the state invariants directly: search results
/// exist only while a selection is pending, and the tracked venue is
/// persisted so poll jobs can detect staleness and be re-derived after a
/// restart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Session {
    /// Waiting for the user's search query.
    AwaitingQuery,
    /// Waiting for the user to pick a venue from the stored results.
    AwaitingSelection {
        /// Search results captured at query time, non-empty.
        venues: Vec<Venue>,
        /// 0-indexed pagination cursor into `venues`.
        page_num: usize,
    },
    /// A poll job is watching this venue until it comes online.
    Tracking {
        /// The venue being watched.
        venue: Venue,
    },
}

impl Session {
    /// Returns the tracked venue, if this session is in the tracking state.
    #[must_use]
    pub fn tracked_venue(&self) -> Option<&Venue> {
        match self {
            Self::Tracking { venue } => Some(venue),
            _ => None,
        }
    }
}

/// Trait for session persistence.
///
/// Implementations must make each operation atomic per key; the caller
/// serializes read-modify-write sequences with
/// [`SessionLocks`](crate::locks::SessionLocks).
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Gets the session record for a chat, if one exists.
    async fn get(&self, chat: ChatId) -> Result<Option<Session>, StoreError>;

    /// Writes the session record for a chat, replacing any existing one.
    async fn set(&self, chat: ChatId, session: Session) -> Result<(), StoreError>;

    /// Deletes the session record for a chat. Deleting a missing record is
    /// not an error.
    async fn clear(&self, chat: ChatId) -> Result<(), StoreError>;

    /// Lists every chat currently in the tracking state, for poll-job
    /// resumption at startup.
    async fn tracking(&self) -> Result<Vec<(ChatId, Venue)>, StoreError>;
}

/// An in-memory session store.
///
/// Used by tests throughout the workspace and usable for ephemeral runs
/// where restart durability is not needed. The availability switch lets
/// tests exercise store-outage behavior.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<ChatId, Session>>,
    unavailable: AtomicBool,
}

impl MemorySessionStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every operation fail with [`StoreError::Unavailable`] until
    /// flipped back.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable {
                reason: "store marked unavailable".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn get(&self, chat: ChatId) -> Result<Option<Session>, StoreError> {
        self.check_available()?;
        Ok(self.sessions.read().unwrap().get(&chat).cloned())
    }

    async fn set(&self, chat: ChatId, session: Session) -> Result<(), StoreError> {
        self.check_available()?;
        self.sessions.write().unwrap().insert(chat, session);
        Ok(())
    }

    async fn clear(&self, chat: ChatId) -> Result<(), StoreError> {
        self.check_available()?;
        self.sessions.write().unwrap().remove(&chat);
        Ok(())
    }

    async fn tracking(&self) -> Result<Vec<(ChatId, Venue)>, StoreError> {
        self.check_available()?;
        Ok(self
            .sessions
            .read()
            .unwrap()
            .iter()
            .filter_map(|(chat, session)| {
                session.tracked_venue().map(|venue| (*chat, venue.clone()))
            })
            .collect())
    }
}
