use std::sync::Arc;

use crate::config::HistoryConfig;
use crate::services::{conversation::HistoryManager, ChatService};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub history: Arc<HistoryManager>,
    pub chat_service: Arc<ChatService>,
    pub history_config: HistoryConfig,
}

impl AppState {
    pub fn user_id_or_default(&self, user_id: Option<String>) -> String {
        crate::models::chat::or_default(user_id, &self.history_config.default_user_id)
    }

    pub fn topic_or_default(&self, topic: Option<String>) -> String {
        crate::models::chat::or_default(topic, &self.history_config.default_topic)
    }
}
