//! Core domain types for the venuewatch bot.
//!
//! This crate provides the foundational identifier types shared by the
//! directory, conversation, and poller crates.

pub mod id;

pub use id::ChatId;
