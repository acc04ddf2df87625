use chrono::{Duration, Utc};
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

use crate::config::HistoryConfig;
use crate::models::chat::ChatMessage;

use super::expiry::{classify_staleness, trailing_window};
use super::locks::KeyedLocks;
use super::store::{ChatStore, StoreError};
use super::types::{ClearOutcome, ExpiryStatus, Role, Turn, UserPresence, UserRecord};

#[derive(Error, Debug)]
pub enum HistoryError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Turns with role '{0}' are not persisted")]
    UnpersistableRole(Role),
}

/// Reads and writes conversation threads through a [`ChatStore`].
///
/// Holds no copy of the history between calls; every operation reloads the
/// user record. Writes for the same user are serialized in-process.
pub struct HistoryManager {
    store: Arc<dyn ChatStore>,
    locks: KeyedLocks,
    window_size: usize,
    expiry_threshold: Duration,
}

impl HistoryManager {
    pub fn new(store: Arc<dyn ChatStore>, config: &HistoryConfig) -> Self {
        info!(
            "Initializing history manager: window={}, expiry={}d",
            config.window_size, config.expiry_days
        );
        Self {
            store,
            locks: KeyedLocks::new(),
            window_size: config.window_size,
            expiry_threshold: Duration::days(config.expiry_days),
        }
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    /// Fetch the user record, creating it first if it does not exist yet
    pub async fn ensure_user(&self, user_id: &str) -> Result<(UserRecord, UserPresence), HistoryError> {
        let presence = self.store.upsert_if_absent(user_id).await?;
        if presence == UserPresence::Created {
            info!("Created user record for {}", user_id);
        }

        let record = self
            .store
            .find(user_id)
            .await?
            .unwrap_or_else(|| UserRecord::new(user_id));

        Ok((record, presence))
    }

    pub async fn append(
        &self,
        user_id: &str,
        topic: &str,
        role: Role,
        content: &str,
    ) -> Result<Turn, HistoryError> {
        if role == Role::System {
            return Err(HistoryError::UnpersistableRole(role));
        }

        let _guard = self.locks.acquire(user_id).await;

        let (mut record, _) = self.ensure_user(user_id).await?;
        let now = Utc::now();
        let turn = Turn::new(role, content);

        let thread = record.thread_mut_or_insert(topic, now);
        thread.push(turn.clone(), now);
        let len = thread.history.len();

        self.store.replace_threads(user_id, &record.chats).await?;

        debug!(
            "Appended {} turn to user={}, topic={} (history_len={})",
            role, user_id, topic, len
        );
        Ok(turn)
    }

    /// System instruction followed by the trailing window of the thread
    pub async fn build_prompt(
        &self,
        user_id: &str,
        topic: &str,
        system_prompt: &str,
    ) -> Result<Vec<ChatMessage>, HistoryError> {
        let history = self.get_history(user_id, topic).await?;
        let window = trailing_window(&history, self.window_size);

        let mut messages = Vec::with_capacity(window.len() + 1);
        messages.push(ChatMessage::system(system_prompt));
        messages.extend(window.iter().map(ChatMessage::from));

        debug!(
            "Built prompt for user={}, topic={}: {} of {} turns",
            user_id,
            topic,
            window.len(),
            history.len()
        );
        Ok(messages)
    }

    pub async fn get_history(&self, user_id: &str, topic: &str) -> Result<Vec<Turn>, HistoryError> {
        let history = self
            .store
            .find(user_id)
            .await?
            .and_then(|record| {
                record
                    .chats
                    .into_iter()
                    .find(|t| t.topic == topic)
                    .map(|t| t.history)
            })
            .unwrap_or_default();

        Ok(history)
    }

    pub async fn get_all(&self, user_id: &str) -> Result<BTreeMap<String, Vec<Turn>>, HistoryError> {
        let chats = self
            .store
            .find(user_id)
            .await?
            .map(|record| {
                record
                    .chats
                    .into_iter()
                    .map(|t| (t.topic, t.history))
                    .collect()
            })
            .unwrap_or_default();

        Ok(chats)
    }

    /// Delete the thread entity for `topic`
    pub async fn clear(&self, user_id: &str, topic: &str) -> Result<ClearOutcome, HistoryError> {
        let _guard = self.locks.acquire(user_id).await;

        let Some(mut record) = self.store.find(user_id).await? else {
            return Ok(ClearOutcome::NotFound);
        };

        if !record.remove_thread(topic) {
            return Ok(ClearOutcome::NotFound);
        }

        self.store.replace_threads(user_id, &record.chats).await?;
        info!("Cleared thread user={}, topic={}", user_id, topic);
        Ok(ClearOutcome::Cleared)
    }

    pub async fn check_expiry(&self, user_id: &str, topic: &str) -> Result<ExpiryStatus, HistoryError> {
        self.check_expiry_at(user_id, topic, Utc::now()).await
    }

    pub async fn check_expiry_at(
        &self,
        user_id: &str,
        topic: &str,
        now: chrono::DateTime<Utc>,
    ) -> Result<ExpiryStatus, HistoryError> {
        let last_updated = self
            .store
            .find(user_id)
            .await?
            .and_then(|record| record.thread(topic).map(|t| t.last_updated));

        let status = match last_updated {
            Some(last_updated) => classify_staleness(last_updated, now, self.expiry_threshold),
            None => ExpiryStatus::NotFound,
        };

        debug!("Expiry check user={}, topic={}: {}", user_id, topic, status.as_status());
        Ok(status)
    }
}
