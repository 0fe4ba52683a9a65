//! Postgres-backed session store.
//!
//! One row per chat in `chat_sessions`, with the serialized session enum in
//! a JSONB column. Upserts keep each write atomic per key; the tracking
//! query filters on the serialized state tag.

use async_trait::async_trait;
use sqlx::{FromRow, PgPool};
use venuewatch_conversation::{Session, SessionStore, StoreError};
use venuewatch_core::ChatId;
use venuewatch_directory::Venue;

/// Session store over a PostgreSQL pool.
pub struct PgSessionStore {
    pool: PgPool,
}

impl PgSessionStore {
    /// Creates a store over the given pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Row type for single-record queries.
#[derive(FromRow)]
struct SessionRow {
    record: serde_json::Value,
}

/// Row type for the tracking listing.
#[derive(FromRow)]
struct TrackingRow {
    chat_id: i64,
    record: serde_json::Value,
}

fn unavailable(e: sqlx::Error) -> StoreError {
    StoreError::Unavailable {
        reason: e.to_string(),
    }
}

fn decode(record: serde_json::Value) -> Result<Session, StoreError> {
    serde_json::from_value(record).map_err(|e| StoreError::Serialization {
        reason: e.to_string(),
    })
}

#[async_trait]
impl SessionStore for PgSessionStore {
    async fn get(&self, chat: ChatId) -> Result<Option<Session>, StoreError> {
        let row: Option<SessionRow> =
            sqlx::query_as("SELECT record FROM chat_sessions WHERE chat_id = $1")
                .bind(chat.as_i64())
                .fetch_optional(&self.pool)
                .await
                .map_err(unavailable)?;

        row.map(|r| decode(r.record)).transpose()
    }

    async fn set(&self, chat: ChatId, session: Session) -> Result<(), StoreError> {
        let record = serde_json::to_value(&session).map_err(|e| StoreError::Serialization {
            reason: e.to_string(),
        })?;

        sqlx::query(
            r#"
            INSERT INTO chat_sessions (chat_id, record)
            VALUES ($1, $2)
            ON CONFLICT (chat_id)
            DO UPDATE SET record = EXCLUDED.record, updated_at = now()
            "#,
        )
        .bind(chat.as_i64())
        .bind(record)
        .execute(&self.pool)
        .await
        .map_err(unavailable)?;

        Ok(())
    }

    async fn clear(&self, chat: ChatId) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM chat_sessions WHERE chat_id = $1")
            .bind(chat.as_i64())
            .execute(&self.pool)
            .await
            .map_err(unavailable)?;

        Ok(())
    }

    async fn tracking(&self) -> Result<Vec<(ChatId, Venue)>, StoreError> {
        let rows: Vec<TrackingRow> = sqlx::query_as(
            "SELECT chat_id, record FROM chat_sessions WHERE record ->> 'state' = 'tracking'",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(unavailable)?;

        rows.into_iter()
            .map(|row| {
                let session = decode(row.record)?;
                match session.tracked_venue() {
                    Some(venue) => Ok((ChatId::new(row.chat_id), venue.clone())),
                    None => Err(StoreError::Serialization {
                        reason: format!(
                            "chat {} matched tracking filter but record has no venue",
                            row.chat_id
                        ),
                    }),
                }
            })
            .collect()
    }
}
