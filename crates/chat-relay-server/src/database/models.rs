use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::FromRow;

use crate::services::conversation::{ConversationThread, UserRecord};

/// Row of `chat_users`; `chats` is the JSONB thread list
#[derive(Debug, Clone, FromRow)]
pub struct ChatUserRow {
    pub user_id: String,
    pub chats: Json<Vec<ConversationThread>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ChatUserRow> for UserRecord {
    fn from(row: ChatUserRow) -> Self {
        UserRecord {
            user_id: row.user_id,
            chats: row.chats.0,
        }
    }
}
