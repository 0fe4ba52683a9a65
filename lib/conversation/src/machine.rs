//! The conversation state machine.
//!
//! Maps (current session, inbound text) to outbound replies and the next
//! session state. All handling for one chat is serialized through the
//! shared [`SessionLocks`], including against poll ticks for that chat.
//!
//! Directory failures are converted to user-visible text here and never
//! escape; store and transport failures propagate as [`HandleError`].

use crate::error::HandleError;
use crate::locks::SessionLocks;
use crate::pagination::{self, DEFAULT_PAGE_SIZE};
use crate::session::{Session, SessionStore};
use crate::tracker::VenueTracker;
use crate::transport::ChatTransport;
use std::sync::Arc;
use venuewatch_core::ChatId;
use venuewatch_directory::{Venue, VenueDirectory};

/// Greeting sent on `/start` and on first contact.
pub const WELCOME_TEXT: &str = "I'm a bot to update you about Wolt venue statuses!\n\
    If at any point you'd like to restart please send /start";

/// Prompt for the venue search query.
pub const QUERY_PROMPT_TEXT: &str = "What is the name of the venue you are looking for?";

/// Reply when a search matches nothing.
pub const NO_MATCH_TEXT: &str = "Sorry, there's no venue matching your search\n\
    If you'd like to try again please reply /start";

/// Reply when the selected venue is already taking orders.
pub const ALREADY_ONLINE_TEXT: &str = "The venue is already online!\n\
    To search for another venue please reply /start";

/// Acknowledgement that tracking has started.
pub const OFFLINE_ACK_TEXT: &str =
    "The venue seems to be offline, I'll update you once it is open";

/// The one-time notification a poll job sends when the venue opens.
pub const VENUE_ONLINE_TEXT: &str = "The venue is now online!\n\
    To search for another venue please reply /start";

/// Reply to a numeric selection outside the result list.
pub const INVALID_SELECTION_TEXT: &str =
    "That number isn't on the list, please reply with one of the listed numbers";

/// Reply when the delivery service cannot be reached.
pub const UPSTREAM_FAILURE_TEXT: &str =
    "Sorry, I couldn't reach the delivery service just now, please try again";

/// Reply to "next" when the last page is already shown.
pub const END_OF_LIST_TEXT: &str = "That's the whole list, reply with a number to pick a venue\n\
    or send /start to search for something else";

fn still_tracking_text(venue: &Venue) -> String {
    format!(
        "I'm still keeping an eye on {}, I'll message you once it opens.\n\
         To start over please send /start",
        venue.title.trim(),
    )
}

/// The per-chat conversation state machine.
pub struct Conversation<S, D, W, T> {
    store: Arc<S>,
    directory: Arc<D>,
    tracker: W,
    transport: Arc<T>,
    locks: Arc<SessionLocks>,
    page_size: usize,
}

impl<S, D, W, T> Conversation<S, D, W, T>
where
    S: SessionStore,
    D: VenueDirectory,
    W: VenueTracker,
    T: ChatTransport,
{
    /// Creates a state machine over the given collaborators.
    pub fn new(
        store: Arc<S>,
        directory: Arc<D>,
        tracker: W,
        transport: Arc<T>,
        locks: Arc<SessionLocks>,
    ) -> Self {
        Self {
            store,
            directory,
            tracker,
            transport,
            locks,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Overrides the pagination page size.
    #[must_use]
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    /// Handles an explicit reset (`/start`).
    ///
    /// Cancels any active poll job for the chat, then greets and prompts
    /// for a fresh query.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store or the transport fails.
    pub async fn handle_reset(&self, chat: ChatId) -> Result<(), HandleError> {
        let _guard = self.locks.acquire(chat).await;
        tracing::info!(chat = %chat, "reset requested");
        self.start_over(chat).await
    }

    /// Handles an inbound text message for the chat.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store or the transport fails.
    pub async fn handle_message(&self, chat: ChatId, text: &str) -> Result<(), HandleError> {
        let _guard = self.locks.acquire(chat).await;

        match self.store.get(chat).await? {
            None => {
                // First contact behaves like an explicit reset.
                tracing::info!(chat = %chat, "first contact");
                self.start_over(chat).await
            }
            Some(Session::AwaitingQuery) => self.run_search(chat, text).await,
            Some(Session::AwaitingSelection { venues, page_num }) => {
                match text.trim().parse::<usize>() {
                    Ok(index) => self.select_venue(chat, venues, index).await,
                    Err(_) => self.advance_page(chat, venues, page_num).await,
                }
            }
            Some(Session::Tracking { venue }) => {
                self.transport
                    .send(chat, &still_tracking_text(&venue))
                    .await?;
                Ok(())
            }
        }
    }

    async fn start_over(&self, chat: ChatId) -> Result<(), HandleError> {
        self.tracker.cancel(chat).await;
        self.store.set(chat, Session::AwaitingQuery).await?;
        self.transport.send(chat, WELCOME_TEXT).await?;
        self.transport.send(chat, QUERY_PROMPT_TEXT).await?;
        Ok(())
    }

    async fn run_search(&self, chat: ChatId, query: &str) -> Result<(), HandleError> {
        tracing::info!(chat = %chat, query, "searching venues");

        let venues = match self.directory.search(query).await {
            Ok(venues) => venues,
            Err(e) => {
                tracing::warn!(chat = %chat, error = %e, "venue search failed");
                // Session untouched: the user can retry the same query.
                self.transport.send(chat, UPSTREAM_FAILURE_TEXT).await?;
                return Ok(());
            }
        };

        if venues.is_empty() {
            tracing::info!(chat = %chat, query, "no venues matched");
            self.store.clear(chat).await?;
            self.transport.send(chat, NO_MATCH_TEXT).await?;
            return Ok(());
        }

        let prompt = pagination::render_page(&venues, 0, self.page_size);
        self.store
            .set(chat, Session::AwaitingSelection { venues, page_num: 0 })
            .await?;
        self.transport.send(chat, &prompt).await?;
        Ok(())
    }

    async fn select_venue(
        &self,
        chat: ChatId,
        mut venues: Vec<Venue>,
        index: usize,
    ) -> Result<(), HandleError> {
        // The index is 1-based and absolute over the full captured list,
        // not relative to the page currently displayed.
        if index == 0 || index > venues.len() {
            tracing::info!(chat = %chat, index, choices = venues.len(), "selection out of range");
            self.transport.send(chat, INVALID_SELECTION_TEXT).await?;
            return Ok(());
        }
        let venue = venues.swap_remove(index - 1);
        tracing::info!(chat = %chat, venue = %venue.title, "venue selected");

        match self.directory.check_status(&venue).await {
            Ok(true) => {
                self.store.clear(chat).await?;
                self.transport.send(chat, ALREADY_ONLINE_TEXT).await?;
            }
            Ok(false) => {
                self.store
                    .set(chat, Session::Tracking { venue: venue.clone() })
                    .await?;
                self.transport.send(chat, OFFLINE_ACK_TEXT).await?;
                self.tracker.track(chat, venue).await;
            }
            Err(e) => {
                tracing::warn!(chat = %chat, error = %e, "status check failed");
                // Session untouched: the user can pick again.
                self.transport.send(chat, UPSTREAM_FAILURE_TEXT).await?;
            }
        }
        Ok(())
    }

    async fn advance_page(
        &self,
        chat: ChatId,
        venues: Vec<Venue>,
        page_num: usize,
    ) -> Result<(), HandleError> {
        let next = page_num + 1;
        let (page, _) = pagination::paginate(&venues, next, self.page_size);
        if page.is_empty() {
            // Keep the cursor where it is instead of walking off the list.
            self.transport.send(chat, END_OF_LIST_TEXT).await?;
            return Ok(());
        }

        let prompt = pagination::render_page(&venues, next, self.page_size);
        self.store
            .set(
                chat,
                Session::AwaitingSelection {
                    venues,
                    page_num: next,
                },
            )
            .await?;
        self.transport.send(chat, &prompt).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::MemorySessionStore;
    use crate::tracker::RecordingTracker;
    use crate::transport::MemoryTransport;
    use venuewatch_directory::{DirectoryError, MockDirectory};

    struct Fixture {
        machine: Conversation<MemorySessionStore, MockDirectory, RecordingTracker, MemoryTransport>,
        store: Arc<MemorySessionStore>,
        transport: Arc<MemoryTransport>,
        tracker: RecordingTracker,
    }

    fn fixture(directory: MockDirectory) -> Fixture {
        let store = Arc::new(MemorySessionStore::new());
        let transport = Arc::new(MemoryTransport::new());
        let tracker = RecordingTracker::new();
        let machine = Conversation::new(
            Arc::clone(&store),
            Arc::new(directory),
            tracker.clone(),
            Arc::clone(&transport),
            Arc::new(SessionLocks::new()),
        );
        Fixture {
            machine,
            store,
            transport,
            tracker,
        }
    }

    fn venues(count: usize) -> Vec<Venue> {
        (1..=count)
            .map(|n| Venue {
                title: format!("Venue {n}"),
                description: format!("Description {n}"),
                rating: Some(8.0),
                track_id: format!("venue-{n}"),
            })
            .collect()
    }

    const CHAT: ChatId = ChatId::new(100);

    async fn seed_selection(store: &MemorySessionStore, venues: Vec<Venue>, page_num: usize) {
        store
            .set(CHAT, Session::AwaitingSelection { venues, page_num })
            .await
            .expect("seed session");
    }

    #[tokio::test]
    async fn first_contact_greets_and_awaits_query() {
        let f = fixture(MockDirectory::returning(vec![]));

        f.machine.handle_message(CHAT, "hello").await.expect("handle");

        assert_eq!(
            f.transport.texts_for(CHAT),
            vec![WELCOME_TEXT.to_string(), QUERY_PROMPT_TEXT.to_string()]
        );
        assert_eq!(
            f.store.get(CHAT).await.expect("get"),
            Some(Session::AwaitingQuery)
        );
    }

    #[tokio::test]
    async fn empty_search_clears_session_and_reports_no_match() {
        let f = fixture(MockDirectory::returning(vec![]));
        f.store
            .set(CHAT, Session::AwaitingQuery)
            .await
            .expect("seed");

        f.machine.handle_message(CHAT, "pizza").await.expect("handle");

        assert_eq!(f.transport.texts_for(CHAT), vec![NO_MATCH_TEXT.to_string()]);
        assert_eq!(f.store.get(CHAT).await.expect("get"), None);
    }

    #[tokio::test]
    async fn search_stores_results_and_renders_first_page() {
        let f = fixture(MockDirectory::returning(venues(15)));
        f.store
            .set(CHAT, Session::AwaitingQuery)
            .await
            .expect("seed");

        f.machine.handle_message(CHAT, "sushi").await.expect("handle");

        let sent = f.transport.texts_for(CHAT);
        assert_eq!(sent.len(), 1);
        assert!(sent[0].starts_with("Select venue:\n"));
        assert!(sent[0].contains("10. Venue 10"));
        assert!(!sent[0].contains("11. Venue 11"));
        assert!(sent[0].contains("reply \"next\""));

        match f.store.get(CHAT).await.expect("get") {
            Some(Session::AwaitingSelection { venues, page_num }) => {
                assert_eq!(venues.len(), 15);
                assert_eq!(page_num, 0);
            }
            other => panic!("expected selection state, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn non_numeric_reply_advances_the_page() {
        let f = fixture(MockDirectory::returning(vec![]));
        seed_selection(&f.store, venues(15), 0).await;

        f.machine.handle_message(CHAT, "next").await.expect("handle");

        let sent = f.transport.texts_for(CHAT);
        assert!(sent[0].contains("11. Venue 11"));
        assert!(sent[0].contains("15. Venue 15"));
        assert!(!sent[0].starts_with("Select venue:"));
        assert!(!sent[0].contains("next\""));

        match f.store.get(CHAT).await.expect("get") {
            Some(Session::AwaitingSelection { page_num, .. }) => assert_eq!(page_num, 1),
            other => panic!("expected selection state, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn advancing_past_the_last_page_keeps_the_cursor() {
        let f = fixture(MockDirectory::returning(vec![]));
        seed_selection(&f.store, venues(15), 1).await;

        f.machine.handle_message(CHAT, "more").await.expect("handle");

        assert_eq!(
            f.transport.texts_for(CHAT),
            vec![END_OF_LIST_TEXT.to_string()]
        );
        match f.store.get(CHAT).await.expect("get") {
            Some(Session::AwaitingSelection { page_num, .. }) => assert_eq!(page_num, 1),
            other => panic!("expected selection state, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn numeric_reply_selects_by_absolute_index() {
        let directory = MockDirectory::returning(vec![]).with_statuses([Ok(false)]);
        let f = fixture(directory);
        // Cursor on page 1: the index must still resolve against the full list.
        seed_selection(&f.store, venues(15), 1).await;

        f.machine.handle_message(CHAT, "3").await.expect("handle");

        assert_eq!(
            f.transport.texts_for(CHAT),
            vec![OFFLINE_ACK_TEXT.to_string()]
        );
        match f.store.get(CHAT).await.expect("get") {
            Some(Session::Tracking { venue }) => assert_eq!(venue.track_id, "venue-3"),
            other => panic!("expected tracking state, got {other:?}"),
        }
        let tracked = f.tracker.tracked();
        assert_eq!(tracked.len(), 1);
        assert_eq!(tracked[0].1.track_id, "venue-3");
    }

    #[tokio::test]
    async fn out_of_range_selection_reprompts_without_state_change() {
        let f = fixture(MockDirectory::returning(vec![]));
        seed_selection(&f.store, venues(5), 0).await;

        f.machine.handle_message(CHAT, "99").await.expect("handle");
        f.machine.handle_message(CHAT, "0").await.expect("handle");

        assert_eq!(
            f.transport.texts_for(CHAT),
            vec![
                INVALID_SELECTION_TEXT.to_string(),
                INVALID_SELECTION_TEXT.to_string()
            ]
        );
        match f.store.get(CHAT).await.expect("get") {
            Some(Session::AwaitingSelection { venues, page_num }) => {
                assert_eq!(venues.len(), 5);
                assert_eq!(page_num, 0);
            }
            other => panic!("expected selection state, got {other:?}"),
        }
        assert!(f.tracker.tracked().is_empty());
    }

    #[tokio::test]
    async fn already_online_venue_notifies_immediately_without_tracking() {
        let directory = MockDirectory::returning(vec![]).with_statuses([Ok(true)]);
        let f = fixture(directory);
        seed_selection(&f.store, venues(3), 0).await;

        f.machine.handle_message(CHAT, "2").await.expect("handle");

        assert_eq!(
            f.transport.texts_for(CHAT),
            vec![ALREADY_ONLINE_TEXT.to_string()]
        );
        assert_eq!(f.store.get(CHAT).await.expect("get"), None);
        assert!(f.tracker.tracked().is_empty());
    }

    #[tokio::test]
    async fn search_failure_reports_and_keeps_state() {
        let f = fixture(MockDirectory::failing(DirectoryError::UnexpectedStatus {
            status: 502,
        }));
        f.store
            .set(CHAT, Session::AwaitingQuery)
            .await
            .expect("seed");

        f.machine.handle_message(CHAT, "ramen").await.expect("handle");

        assert_eq!(
            f.transport.texts_for(CHAT),
            vec![UPSTREAM_FAILURE_TEXT.to_string()]
        );
        assert_eq!(
            f.store.get(CHAT).await.expect("get"),
            Some(Session::AwaitingQuery)
        );
    }

    #[tokio::test]
    async fn status_check_failure_keeps_selection_for_retry() {
        let directory = MockDirectory::returning(vec![]).with_statuses([Err(
            DirectoryError::RequestFailed {
                reason: "timeout".to_string(),
            },
        )]);
        let f = fixture(directory);
        seed_selection(&f.store, venues(3), 0).await;

        f.machine.handle_message(CHAT, "1").await.expect("handle");

        assert_eq!(
            f.transport.texts_for(CHAT),
            vec![UPSTREAM_FAILURE_TEXT.to_string()]
        );
        match f.store.get(CHAT).await.expect("get") {
            Some(Session::AwaitingSelection { venues, .. }) => assert_eq!(venues.len(), 3),
            other => panic!("expected selection state, got {other:?}"),
        }
        assert!(f.tracker.tracked().is_empty());
    }

    #[tokio::test]
    async fn reset_cancels_tracking_and_restarts() {
        let f = fixture(MockDirectory::returning(vec![]));
        f.store
            .set(
                CHAT,
                Session::Tracking {
                    venue: venues(1).remove(0),
                },
            )
            .await
            .expect("seed");

        f.machine.handle_reset(CHAT).await.expect("reset");

        assert_eq!(f.tracker.cancelled(), vec![CHAT]);
        assert_eq!(
            f.store.get(CHAT).await.expect("get"),
            Some(Session::AwaitingQuery)
        );
        assert_eq!(
            f.transport.texts_for(CHAT),
            vec![WELCOME_TEXT.to_string(), QUERY_PROMPT_TEXT.to_string()]
        );
    }

    #[tokio::test]
    async fn message_while_tracking_is_informational() {
        let f = fixture(MockDirectory::returning(vec![]));
        let venue = venues(1).remove(0);
        f.store
            .set(CHAT, Session::Tracking { venue: venue.clone() })
            .await
            .expect("seed");

        f.machine
            .handle_message(CHAT, "any news?")
            .await
            .expect("handle");

        let sent = f.transport.texts_for(CHAT);
        assert_eq!(sent.len(), 1);
        assert!(sent[0].contains("Venue 1"));
        assert_eq!(
            f.store.get(CHAT).await.expect("get"),
            Some(Session::Tracking { venue })
        );
    }

    #[tokio::test]
    async fn store_outage_surfaces_as_handle_error() {
        let f = fixture(MockDirectory::returning(vec![]));
        f.store.set_unavailable(true);

        let result = f.machine.handle_message(CHAT, "hello").await;

        assert!(matches!(result, Err(HandleError::Store(_))));
        assert!(f.transport.sent().is_empty());
    }
}
