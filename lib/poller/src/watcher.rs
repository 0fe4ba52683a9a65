//! The availability watcher.
//!
//! Each tracked chat gets one spawned task that wakes on a fixed interval
//! and checks the venue's status. Every tick runs under the chat's session
//! lock, so ticks never interleave with message handling for the same chat.
//!
//! Exactly-once notification: clearing the session record is the commit
//! point. A tick only notifies after the clear succeeds, and any tick that
//! finds the session missing or pointing at a different venue retires the
//! job without a word.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use venuewatch_conversation::machine::VENUE_ONLINE_TEXT;
use venuewatch_conversation::{
    ChatTransport, Session, SessionLocks, SessionStore, StoreError, VenueTracker,
};
use venuewatch_core::ChatId;
use venuewatch_directory::{Venue, VenueDirectory};

/// Interval between status checks of a tracked venue.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(60);

/// Per-chat recurring availability polling.
///
/// Cheap to clone; clones share the same job table, like handles to one
/// scheduler.
pub struct VenueWatcher<S, D, T> {
    inner: Arc<Inner<S, D, T>>,
}

impl<S, D, T> Clone for VenueWatcher<S, D, T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct Inner<S, D, T> {
    store: Arc<S>,
    directory: Arc<D>,
    transport: Arc<T>,
    locks: Arc<SessionLocks>,
    interval: Duration,
    jobs: Mutex<HashMap<ChatId, ActiveJob>>,
    generation: AtomicU64,
}

struct ActiveJob {
    generation: u64,
    task: JoinHandle<()>,
}

/// What a single poll tick decided.
enum TickOutcome {
    /// Venue still offline (or a transient failure): wait for the next tick.
    KeepWaiting,
    /// Venue came online and the notification was committed.
    Finished,
    /// The session moved on; the job is obsolete.
    Stale,
}

impl<S, D, T> VenueWatcher<S, D, T>
where
    S: SessionStore + 'static,
    D: VenueDirectory + 'static,
    T: ChatTransport + 'static,
{
    /// Creates a watcher polling at the given interval.
    pub fn new(
        store: Arc<S>,
        directory: Arc<D>,
        transport: Arc<T>,
        locks: Arc<SessionLocks>,
        interval: Duration,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                store,
                directory,
                transport,
                locks,
                interval,
                jobs: Mutex::new(HashMap::new()),
                generation: AtomicU64::new(0),
            }),
        }
    }

    /// Starts a poll job for the chat, replacing any job it already has.
    ///
    /// The first status check happens one full interval after scheduling;
    /// the caller is expected to have just performed the synchronous check
    /// that found the venue offline.
    pub fn schedule(&self, chat: ChatId, venue: Venue) {
        let generation = self.inner.generation.fetch_add(1, Ordering::Relaxed) + 1;

        let inner = Arc::clone(&self.inner);
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(inner.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The interval's first tick completes immediately; consume it so
            // the first real check lands one interval from now.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                match inner.tick(chat, &venue).await {
                    TickOutcome::KeepWaiting => {}
                    TickOutcome::Finished | TickOutcome::Stale => break,
                }
            }
            inner.retire(chat, generation);
        });

        let mut jobs = self.inner.jobs.lock().unwrap();
        if let Some(previous) = jobs.insert(chat, ActiveJob { generation, task }) {
            previous.task.abort();
            tracing::debug!(chat = %chat, "replaced active poll job");
        }
    }

    /// Stops and removes the chat's poll job, if one is active.
    pub fn cancel(&self, chat: ChatId) {
        if let Some(job) = self.inner.jobs.lock().unwrap().remove(&chat) {
            job.task.abort();
            tracing::info!(chat = %chat, "cancelled poll job");
        }
    }

    /// Number of currently active poll jobs.
    #[must_use]
    pub fn active_jobs(&self) -> usize {
        self.inner.jobs.lock().unwrap().len()
    }

    /// Schedules a poll job for every session the store still has in the
    /// tracking state. Called once at startup so waits survive restarts.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store cannot be read.
    pub async fn resume(&self) -> Result<usize, StoreError> {
        let tracking = self.inner.store.tracking().await?;
        let count = tracking.len();
        for (chat, venue) in tracking {
            tracing::info!(chat = %chat, venue = %venue.title, "resuming poll job");
            self.schedule(chat, venue);
        }
        Ok(count)
    }
}

impl<S, D, T> Inner<S, D, T>
where
    S: SessionStore,
    D: VenueDirectory,
    T: ChatTransport,
{
    async fn tick(&self, chat: ChatId, venue: &Venue) -> TickOutcome {
        let _guard = self.locks.acquire(chat).await;

        let session = match self.store.get(chat).await {
            Ok(session) => session,
            Err(e) => {
                // Store outage: hold the job and try again next interval.
                tracing::warn!(chat = %chat, error = %e, "session store unavailable during tick");
                return TickOutcome::KeepWaiting;
            }
        };

        let still_tracked = matches!(
            &session,
            Some(Session::Tracking { venue: tracked }) if tracked.track_id == venue.track_id
        );
        if !still_tracked {
            tracing::info!(chat = %chat, venue = %venue.title, "session moved on, retiring poll job");
            return TickOutcome::Stale;
        }

        let online = match self.directory.check_status(venue).await {
            Ok(online) => online,
            Err(e) => {
                // Treated as still offline for this tick.
                tracing::debug!(chat = %chat, error = %e, "status check failed");
                false
            }
        };
        if !online {
            return TickOutcome::KeepWaiting;
        }

        // Commit point: once the record is gone, no later tick (or restart)
        // can notify again. If the clear fails, skip the notification and
        // retry the whole tick next interval.
        if let Err(e) = self.store.clear(chat).await {
            tracing::warn!(chat = %chat, error = %e, "failed to clear session after venue opened");
            return TickOutcome::KeepWaiting;
        }

        if let Err(e) = self.transport.send(chat, VENUE_ONLINE_TEXT).await {
            // Delivery is best effort; the commit already happened.
            tracing::warn!(chat = %chat, error = %e, "online notification failed to send");
        }
        tracing::info!(chat = %chat, venue = %venue.title, "venue online, poll job finished");
        TickOutcome::Finished
    }

    fn retire(&self, chat: ChatId, generation: u64) {
        let mut jobs = self.jobs.lock().unwrap();
        // A replacement job may already own this slot.
        if jobs
            .get(&chat)
            .is_some_and(|job| job.generation == generation)
        {
            jobs.remove(&chat);
        }
    }
}

#[async_trait]
impl<S, D, T> VenueTracker for VenueWatcher<S, D, T>
where
    S: SessionStore + 'static,
    D: VenueDirectory + 'static,
    T: ChatTransport + 'static,
{
    async fn track(&self, chat: ChatId, venue: Venue) {
        self.schedule(chat, venue);
    }

    async fn cancel(&self, chat: ChatId) {
        VenueWatcher::cancel(self, chat);
    }
}
