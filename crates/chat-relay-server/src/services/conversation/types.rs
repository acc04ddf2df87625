use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use crate::models::chat::Role;

/// One exchange unit. Immutable once appended to a thread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

impl Turn {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self { role, content: content.into() }
    }
}

/// A single ongoing conversation scoped to one user and one topic
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationThread {
    pub topic: String,

    /// Insertion order is conversational order
    pub history: Vec<Turn>,

    /// Time of the most recent append
    pub last_updated: DateTime<Utc>,
}

impl ConversationThread {
    pub fn new(topic: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            topic: topic.into(),
            history: Vec::new(),
            last_updated: now,
        }
    }

    /// Push a turn and advance `last_updated` without ever moving it backwards
    pub fn push(&mut self, turn: Turn, now: DateTime<Utc>) {
        self.history.push(turn);
        if now > self.last_updated {
            self.last_updated = now;
        }
    }
}

/// Everything stored for one user: their threads, unique by topic
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct UserRecord {
    pub user_id: String,
    pub chats: Vec<ConversationThread>,
}

impl UserRecord {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            chats: Vec::new(),
        }
    }

    pub fn thread(&self, topic: &str) -> Option<&ConversationThread> {
        self.chats.iter().find(|t| t.topic == topic)
    }

    /// Find the thread for `topic`, creating an empty one if absent
    pub fn thread_mut_or_insert(&mut self, topic: &str, now: DateTime<Utc>) -> &mut ConversationThread {
        let idx = match self.chats.iter().position(|t| t.topic == topic) {
            Some(idx) => idx,
            None => {
                self.chats.push(ConversationThread::new(topic, now));
                self.chats.len() - 1
            }
        };
        &mut self.chats[idx]
    }

    /// Drop the whole thread for `topic`. Returns whether one existed.
    pub fn remove_thread(&mut self, topic: &str) -> bool {
        let before = self.chats.len();
        self.chats.retain(|t| t.topic != topic);
        self.chats.len() != before
    }
}

/// Result of the create-or-fetch step on a user record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserPresence {
    Created,
    Existing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClearOutcome {
    Cleared,
    NotFound,
}

impl ClearOutcome {
    pub fn as_status(&self) -> &'static str {
        match self {
            ClearOutcome::Cleared => "cleared",
            ClearOutcome::NotFound => "no_history_found",
        }
    }
}

/// Advisory staleness of a thread. Never triggers deletion by itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExpiryStatus {
    Active,
    Expired { message: String },
    NotFound,
}

impl ExpiryStatus {
    pub fn as_status(&self) -> &'static str {
        match self {
            ExpiryStatus::Active => "active",
            ExpiryStatus::Expired { .. } => "expired",
            ExpiryStatus::NotFound => "no_history_found",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_thread_mut_or_insert_keeps_topics_unique() {
        let now = Utc::now();
        let mut record = UserRecord::new("u1");
        record.thread_mut_or_insert("contracts", now).push(Turn::new(Role::User, "a"), now);
        record.thread_mut_or_insert("contracts", now).push(Turn::new(Role::Assistant, "b"), now);
        record.thread_mut_or_insert("torts", now);

        assert_eq!(record.chats.len(), 2);
        assert_eq!(record.thread("contracts").unwrap().history.len(), 2);
        assert!(record.thread("torts").unwrap().history.is_empty());
    }

    #[test]
    fn test_push_never_moves_last_updated_backwards() {
        let now = Utc::now();
        let mut thread = ConversationThread::new("general", now);
        thread.push(Turn::new(Role::User, "late"), now - Duration::minutes(5));
        assert_eq!(thread.last_updated, now);

        let later = now + Duration::seconds(1);
        thread.push(Turn::new(Role::Assistant, "reply"), later);
        assert_eq!(thread.last_updated, later);
    }

    #[test]
    fn test_remove_thread() {
        let now = Utc::now();
        let mut record = UserRecord::new("u1");
        record.thread_mut_or_insert("general", now);
        assert!(record.remove_thread("general"));
        assert!(!record.remove_thread("general"));
        assert!(record.chats.is_empty());
    }
}
