//! The venue tracker contract.
//!
//! The state machine hands an offline venue to a tracker and forgets about
//! it; the tracker owns the recurring status checks from then on. The
//! production implementation is the watcher in `venuewatch-poller`; this
//! trait keeps the dependency pointing from the poller to the conversation
//! crate rather than the other way around.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use venuewatch_core::ChatId;
use venuewatch_directory::Venue;

/// Trait for starting and stopping availability tracking.
#[async_trait]
pub trait VenueTracker: Send + Sync {
    /// Starts tracking the venue for the chat, replacing any job the chat
    /// already has.
    async fn track(&self, chat: ChatId, venue: Venue);

    /// Stops any active tracking for the chat.
    async fn cancel(&self, chat: ChatId);
}

/// A tracker that records calls for test assertions.
///
/// Clones share the same recording, so tests can keep a handle while the
/// state machine owns another.
#[derive(Debug, Clone, Default)]
pub struct RecordingTracker {
    tracked: Arc<Mutex<Vec<(ChatId, Venue)>>>,
    cancelled: Arc<Mutex<Vec<ChatId>>>,
}

impl RecordingTracker {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every track call so far.
    #[must_use]
    pub fn tracked(&self) -> Vec<(ChatId, Venue)> {
        self.tracked.lock().unwrap().clone()
    }

    /// Returns every cancel call so far.
    #[must_use]
    pub fn cancelled(&self) -> Vec<ChatId> {
        self.cancelled.lock().unwrap().clone()
    }
}

#[async_trait]
impl VenueTracker for RecordingTracker {
    async fn track(&self, chat: ChatId, venue: Venue) {
        self.tracked.lock().unwrap().push((chat, venue));
    }

    async fn cancel(&self, chat: ChatId) {
        self.cancelled.lock().unwrap().push(chat);
    }
}
