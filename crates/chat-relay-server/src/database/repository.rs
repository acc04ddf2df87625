use async_trait::async_trait;
use sqlx::types::Json;
use tracing::{debug, error};

use super::{ChatUserRow, DbPool};
use crate::services::conversation::{
    ChatStore, ConversationThread, StoreError, UserPresence, UserRecord,
};

/// PostgreSQL-backed [`ChatStore`]. One row per user, so every write is a
/// single-row statement and therefore atomic for that user.
pub struct PgChatStore {
    pool: DbPool,
}

impl PgChatStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ChatStore for PgChatStore {
    async fn find(&self, user_id: &str) -> Result<Option<UserRecord>, StoreError> {
        let row: Option<ChatUserRow> = sqlx::query_as(
            r#"SELECT
                user_id,
                chats,
                created_at,
                updated_at
               FROM chat_users
               WHERE user_id = $1"#
        )
        .bind(user_id)
        .fetch_optional(self.pool.get_pool())
        .await
        .map_err(|e| {
            error!("Database error finding user {}: {}", user_id, e);
            StoreError::Database(e)
        })?;

        Ok(row.map(UserRecord::from))
    }

    async fn upsert_if_absent(&self, user_id: &str) -> Result<UserPresence, StoreError> {
        let result = sqlx::query(
            r#"INSERT INTO chat_users (user_id, chats)
               VALUES ($1, '[]'::jsonb)
               ON CONFLICT (user_id) DO NOTHING"#
        )
        .bind(user_id)
        .execute(self.pool.get_pool())
        .await?;

        let presence = if result.rows_affected() == 1 {
            UserPresence::Created
        } else {
            UserPresence::Existing
        };
        debug!("User {} presence: {:?}", user_id, presence);
        Ok(presence)
    }

    async fn replace_threads(
        &self,
        user_id: &str,
        threads: &[ConversationThread],
    ) -> Result<(), StoreError> {
        sqlx::query(
            r#"INSERT INTO chat_users (user_id, chats)
               VALUES ($1, $2)
               ON CONFLICT (user_id)
               DO UPDATE SET chats = EXCLUDED.chats, updated_at = NOW()"#
        )
        .bind(user_id)
        .bind(Json(threads))
        .execute(self.pool.get_pool())
        .await
        .map_err(|e| {
            error!("Database error storing threads for {}: {}", user_id, e);
            StoreError::Database(e)
        })?;

        debug!("Stored {} threads for user {}", threads.len(), user_id);
        Ok(())
    }
}
