use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

use super::types::{ConversationThread, UserPresence, UserRecord};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Durable owner of user records. Each user record is written atomically.
#[async_trait]
pub trait ChatStore: Send + Sync {
    async fn find(&self, user_id: &str) -> Result<Option<UserRecord>, StoreError>;

    /// Create an empty record unless one already exists. Never clobbers.
    async fn upsert_if_absent(&self, user_id: &str) -> Result<UserPresence, StoreError>;

    /// Overwrite the complete thread list of a user
    async fn replace_threads(
        &self,
        user_id: &str,
        threads: &[ConversationThread],
    ) -> Result<(), StoreError>;
}

/// In-process store: user -> (topic -> thread) held in a DashMap
#[derive(Clone, Default)]
pub struct MemoryChatStore {
    storage: Arc<DashMap<String, UserRecord>>,
}

impl MemoryChatStore {
    pub fn new() -> Self {
        info!("Initializing in-memory chat store");
        Self::default()
    }

    /// Number of user records
    pub fn len(&self) -> usize {
        self.storage.len()
    }

    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }
}

#[async_trait]
impl ChatStore for MemoryChatStore {
    async fn find(&self, user_id: &str) -> Result<Option<UserRecord>, StoreError> {
        Ok(self.storage.get(user_id).map(|entry| entry.value().clone()))
    }

    async fn upsert_if_absent(&self, user_id: &str) -> Result<UserPresence, StoreError> {
        let mut presence = UserPresence::Existing;
        self.storage.entry(user_id.to_string()).or_insert_with(|| {
            presence = UserPresence::Created;
            UserRecord::new(user_id)
        });
        debug!("User {} presence: {:?}", user_id, presence);
        Ok(presence)
    }

    async fn replace_threads(
        &self,
        user_id: &str,
        threads: &[ConversationThread],
    ) -> Result<(), StoreError> {
        let mut entry = self
            .storage
            .entry(user_id.to_string())
            .or_insert_with(|| UserRecord::new(user_id));
        entry.chats = threads.to_vec();
        debug!("Stored {} threads for user {}", threads.len(), user_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::conversation::types::{Role, Turn};
    use chrono::Utc;

    #[tokio::test]
    async fn test_upsert_if_absent_is_first_write_wins() {
        let store = MemoryChatStore::new();
        assert_eq!(store.upsert_if_absent("u1").await.unwrap(), UserPresence::Created);

        let mut thread = ConversationThread::new("general", Utc::now());
        thread.push(Turn::new(Role::User, "hello"), Utc::now());
        store.replace_threads("u1", &[thread]).await.unwrap();

        // Second upsert must not wipe existing content
        assert_eq!(store.upsert_if_absent("u1").await.unwrap(), UserPresence::Existing);
        let record = store.find("u1").await.unwrap().unwrap();
        assert_eq!(record.chats.len(), 1);
        assert_eq!(record.chats[0].history[0].content, "hello");
    }

    #[tokio::test]
    async fn test_find_missing_user() {
        let store = MemoryChatStore::new();
        assert!(store.find("nobody").await.unwrap().is_none());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_user_ids_with_separators_do_not_collide() {
        let store = MemoryChatStore::new();
        let now = Utc::now();
        store.upsert_if_absent("a:b").await.unwrap();
        store.upsert_if_absent("a").await.unwrap();
        store
            .replace_threads("a:b", &[ConversationThread::new("c", now)])
            .await
            .unwrap();
        store
            .replace_threads("a", &[ConversationThread::new("b:c", now)])
            .await
            .unwrap();

        assert_eq!(store.len(), 2);
        let ab = store.find("a:b").await.unwrap().unwrap();
        assert!(ab.thread("c").is_some());
        assert!(ab.thread("b:c").is_none());
    }
}
