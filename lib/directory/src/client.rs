//! The venue directory contract.

use crate::error::DirectoryError;
use crate::venue::Venue;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Trait for venue search and status checks.
///
/// The conversation state machine and the availability poller only consume
/// this trait; the production implementation lives in [`crate::wolt`].
#[async_trait]
pub trait VenueDirectory: Send + Sync {
    /// Searches for venues matching the query, in directory relevance order.
    ///
    /// An empty result is not an error.
    async fn search(&self, query: &str) -> Result<Vec<Venue>, DirectoryError>;

    /// Checks whether the venue is currently online and delivering.
    async fn check_status(&self, venue: &Venue) -> Result<bool, DirectoryError>;
}

/// A scripted directory for tests.
///
/// Search always answers with the configured venue list (or error); status
/// checks consume a queue of scripted answers and fall back to "offline"
/// once the queue is drained.
pub struct MockDirectory {
    results: Result<Vec<Venue>, DirectoryError>,
    statuses: Mutex<VecDeque<Result<bool, DirectoryError>>>,
    status_checks: AtomicUsize,
}

impl MockDirectory {
    /// Creates a mock whose searches return the given venues.
    #[must_use]
    pub fn returning(venues: Vec<Venue>) -> Self {
        Self {
            results: Ok(venues),
            statuses: Mutex::new(VecDeque::new()),
            status_checks: AtomicUsize::new(0),
        }
    }

    /// Creates a mock whose searches fail with the given error.
    #[must_use]
    pub fn failing(error: DirectoryError) -> Self {
        Self {
            results: Err(error),
            statuses: Mutex::new(VecDeque::new()),
            status_checks: AtomicUsize::new(0),
        }
    }

    /// Queues scripted status-check answers, consumed in order.
    #[must_use]
    pub fn with_statuses(
        self,
        statuses: impl IntoIterator<Item = Result<bool, DirectoryError>>,
    ) -> Self {
        self.statuses.lock().unwrap().extend(statuses);
        self
    }

    /// Returns how many status checks have been performed.
    #[must_use]
    pub fn status_check_count(&self) -> usize {
        self.status_checks.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl VenueDirectory for MockDirectory {
    async fn search(&self, _query: &str) -> Result<Vec<Venue>, DirectoryError> {
        self.results.clone()
    }

    async fn check_status(&self, _venue: &Venue) -> Result<bool, DirectoryError> {
        self.status_checks.fetch_add(1, Ordering::SeqCst);
        self.statuses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(false))
    }
}
