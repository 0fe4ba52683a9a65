//! The venuewatch Telegram bot.
//!
//! Wires the Postgres session store, the Wolt directory client, the
//! Telegram transport, the availability watcher, and the conversation
//! state machine, then runs the update dispatch loop until interrupted.

mod config;
mod db;
mod dispatch;
mod telegram;

use crate::config::BotConfig;
use crate::db::PgSessionStore;
use crate::telegram::TelegramClient;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use venuewatch_conversation::{Conversation, SessionLocks};
use venuewatch_directory::WoltDirectory;
use venuewatch_poller::VenueWatcher;

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = BotConfig::from_env().expect("failed to load configuration");
    tracing::info!("Loaded configuration");

    let db_pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await
        .expect("failed to connect to database");

    tracing::info!("Running database migrations...");
    sqlx::migrate!("./migrations")
        .run(&db_pool)
        .await
        .expect("failed to run migrations");

    let store = Arc::new(PgSessionStore::new(db_pool));
    let directory =
        Arc::new(WoltDirectory::new(config.wolt.location).expect("failed to build Wolt client"));
    let telegram = Arc::new(
        TelegramClient::new(&config.telegram.access_token)
            .expect("failed to build Telegram client"),
    );
    let locks = Arc::new(SessionLocks::new());

    let watcher = VenueWatcher::new(
        Arc::clone(&store),
        Arc::clone(&directory),
        Arc::clone(&telegram),
        Arc::clone(&locks),
        Duration::from_secs(config.wolt.poll_interval_seconds),
    );

    // Pick hours-long waits back up after a restart.
    match watcher.resume().await {
        Ok(count) if count > 0 => {
            tracing::info!(resumed = count, "Resumed poll jobs from persisted sessions");
        }
        Ok(_) => {}
        Err(e) => {
            tracing::warn!(error = %e, "Failed to resume poll jobs");
        }
    }

    let conversation = Conversation::new(
        store,
        directory,
        watcher,
        Arc::clone(&telegram),
        locks,
    );

    tracing::info!("Listening for updates");
    tokio::select! {
        () = dispatch::run(&conversation, &telegram, &config.telegram) => {}
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutting down");
        }
    }
}
