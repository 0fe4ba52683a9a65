//! Conversation core for the venuewatch bot.
//!
//! This crate provides:
//!
//! - **Session model and store contract**: Per-chat persisted state
//! - **Pagination engine**: Deterministic slicing of search results
//! - **Conversation state machine**: Maps (session, inbound text) to replies
//! - **Collaborator contracts**: Chat transport and venue tracker seams
//!
//! The state machine never talks to Telegram or Wolt directly; it consumes
//! the [`ChatTransport`], [`VenueDirectory`](venuewatch_directory::VenueDirectory),
//! [`SessionStore`], and [`VenueTracker`] traits so every transition is
//! testable in memory.

pub mod error;
pub mod locks;
pub mod machine;
pub mod pagination;
pub mod session;
pub mod tracker;
pub mod transport;

pub use error::{HandleError, StoreError, TransportError};
pub use locks::SessionLocks;
pub use machine::Conversation;
pub use session::{MemorySessionStore, Session, SessionStore};
pub use tracker::{RecordingTracker, VenueTracker};
pub use transport::{ChatTransport, MemoryTransport};
