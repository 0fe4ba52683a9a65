//! Centralized bot configuration.
//!
//! Strongly-typed configuration loaded via the `config` crate from
//! environment variables, e.g. `TELEGRAM__ACCESS_TOKEN` or
//! `WOLT__LOCATION__LAT`. Library-level config types
//! ([`Location`](venuewatch_directory::Location)) are composed rather than
//! redefined.

use serde::Deserialize;
use venuewatch_core::ChatId;
use venuewatch_directory::Location;

/// Top-level bot configuration.
#[derive(Debug, Deserialize)]
pub struct BotConfig {
    /// PostgreSQL database connection URL.
    pub database_url: String,

    /// Telegram transport configuration.
    pub telegram: TelegramConfig,

    /// Wolt directory configuration.
    pub wolt: WoltConfig,
}

/// Telegram-related configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct TelegramConfig {
    /// Bot API access token.
    pub access_token: String,

    /// Chats allowed to use the bot. Everyone else gets a polite refusal
    /// with their chat id, so the owner can add them.
    #[serde(default)]
    pub allowed_chats: Vec<i64>,

    /// Long-poll timeout for getUpdates, in seconds.
    #[serde(default = "default_update_timeout_seconds")]
    pub update_timeout_seconds: u64,
}

impl TelegramConfig {
    /// Returns whether the chat is on the allow-list.
    #[must_use]
    pub fn is_chat_allowed(&self, chat: ChatId) -> bool {
        self.allowed_chats.contains(&chat.as_i64())
    }
}

/// Wolt directory configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct WoltConfig {
    /// Delivery coordinates searches and status checks are scoped to.
    pub location: Location,

    /// Interval between availability checks of a tracked venue, in seconds.
    #[serde(default = "default_poll_interval_seconds")]
    pub poll_interval_seconds: u64,
}

fn default_update_timeout_seconds() -> u64 {
    50
}

fn default_poll_interval_seconds() -> u64 {
    60
}

impl BotConfig {
    /// Loads configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if required configuration is missing or invalid.
    pub fn from_env() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(
                config::Environment::default()
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("telegram.allowed_chats"),
            )
            .build()?
            .try_deserialize()
    }
}
