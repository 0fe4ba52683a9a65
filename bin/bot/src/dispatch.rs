//! The inbound update dispatch loop.
//!
//! Pulls updates off the Telegram long poll, gates them on the chat
//! allow-list, and routes them into the conversation state machine.
//! Updates are handled sequentially; per-chat ordering against poll ticks
//! comes from the shared session locks inside the machine.

use crate::config::TelegramConfig;
use crate::telegram::TelegramClient;
use std::time::Duration;
use venuewatch_conversation::{ChatTransport, Conversation, SessionStore, VenueTracker};
use venuewatch_core::ChatId;
use venuewatch_directory::VenueDirectory;

/// Pause after a failed getUpdates call before retrying.
const RETRY_BACKOFF: Duration = Duration::from_secs(5);

/// Where an inbound text should be routed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Route {
    /// `/start`: reset the conversation.
    Reset,
    /// Any other command: not ours, ignore.
    OtherCommand,
    /// Plain text for the state machine.
    Text,
}

fn route(text: &str) -> Route {
    let trimmed = text.trim();
    if !trimmed.starts_with('/') {
        return Route::Text;
    }

    // Commands may arrive as "/start@botname" in group chats, possibly
    // with trailing arguments.
    let command = trimmed.split_whitespace().next().unwrap_or(trimmed);
    let command = command.split('@').next().unwrap_or(command);
    match command {
        "/start" => Route::Reset,
        _ => Route::OtherCommand,
    }
}

fn unauthorized_text(chat: ChatId) -> String {
    format!(
        "I'm sorry but you are currently an unrecognized user. To gain access to the bot \
         please ask the owner to add you to the allowed users. Your chat id {chat}",
    )
}

/// Runs the dispatch loop until the surrounding task is cancelled.
pub async fn run<S, D, W, T>(
    conversation: &Conversation<S, D, W, T>,
    telegram: &TelegramClient,
    config: &TelegramConfig,
) where
    S: SessionStore,
    D: VenueDirectory,
    W: VenueTracker,
    T: ChatTransport,
{
    let timeout = Duration::from_secs(config.update_timeout_seconds);
    let mut offset = 0i64;

    loop {
        let updates = match telegram.get_updates(offset, timeout).await {
            Ok(updates) => updates,
            Err(e) => {
                tracing::warn!(error = %e, "getUpdates failed, backing off");
                tokio::time::sleep(RETRY_BACKOFF).await;
                continue;
            }
        };

        for update in updates {
            offset = offset.max(update.update_id + 1);

            let Some(message) = update.message else {
                continue;
            };
            let Some(text) = message.text else {
                continue;
            };
            let chat = ChatId::new(message.chat.id);

            if !config.is_chat_allowed(chat) {
                tracing::info!(chat = %chat, "rejected message from unrecognized chat");
                if let Err(e) = telegram.send_message(chat, &unauthorized_text(chat)).await {
                    tracing::warn!(chat = %chat, error = %e, "failed to send rejection");
                }
                continue;
            }

            let result = match route(&text) {
                Route::Reset => conversation.handle_reset(chat).await,
                Route::OtherCommand => {
                    tracing::debug!(chat = %chat, "ignoring unsupported command");
                    Ok(())
                }
                Route::Text => conversation.handle_message(chat, &text).await,
            };

            if let Err(e) = result {
                tracing::error!(chat = %chat, error = %e, "failed to handle update");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_command_routes_to_reset() {
        assert_eq!(route("/start"), Route::Reset);
        assert_eq!(route("  /start  "), Route::Reset);
        assert_eq!(route("/start@venuewatch_bot"), Route::Reset);
        assert_eq!(route("/start now"), Route::Reset);
    }

    #[test]
    fn other_commands_are_ignored() {
        assert_eq!(route("/help"), Route::OtherCommand);
        assert_eq!(route("/stop@venuewatch_bot"), Route::OtherCommand);
    }

    #[test]
    fn plain_text_routes_to_the_machine() {
        assert_eq!(route("sushi"), Route::Text);
        assert_eq!(route("3"), Route::Text);
        assert_eq!(route("next"), Route::Text);
        assert_eq!(route("email@example.com"), Route::Text);
    }

    #[test]
    fn unauthorized_text_includes_chat_id() {
        let text = unauthorized_text(ChatId::new(987));
        assert!(text.contains("987"));
    }
}
