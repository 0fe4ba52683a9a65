//! Venue directory client for the venuewatch bot.
//!
//! This crate provides:
//!
//! - **Venue**: The read-only venue value returned by search
//! - **VenueDirectory**: The search and status-check contract
//! - **WoltDirectory**: The production implementation over the Wolt HTTP API

pub mod client;
pub mod error;
pub mod venue;
pub mod wolt;

pub use client::{MockDirectory, VenueDirectory};
pub use error::DirectoryError;
pub use venue::Venue;
pub use wolt::{Location, WoltDirectory};
