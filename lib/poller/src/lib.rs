//! Recurring venue availability polling for the venuewatch bot.
//!
//! One in-memory poll job per chat, each on its own fixed-interval tokio
//! timer. Jobs are cancelled on reset, replaced on re-selection, detect
//! staleness through the persisted session, and are re-derived from the
//! session store at startup.

pub mod watcher;

pub use watcher::{DEFAULT_POLL_INTERVAL, VenueWatcher};
