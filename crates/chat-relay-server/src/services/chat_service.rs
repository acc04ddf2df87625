use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

use crate::models::chat::Role;
use crate::services::conversation::HistoryManager;
use crate::services::llm_service::{CompletionClient, CompletionOptions};
use crate::services::sanitizer::sanitize;
use crate::utils::error::ApiError;

/// Relays one user message through history, completion and sanitizing
pub struct ChatService {
    history: Arc<HistoryManager>,
    completion: Arc<dyn CompletionClient>,
    options: CompletionOptions,
    system_prompt: String,
}

impl ChatService {
    pub fn new(
        history: Arc<HistoryManager>,
        completion: Arc<dyn CompletionClient>,
        options: CompletionOptions,
        system_prompt: String,
    ) -> Self {
        Self {
            history,
            completion,
            options,
            system_prompt,
        }
    }

    pub async fn reply(&self, user_id: &str, topic: &str, message: &str) -> Result<String, ApiError> {
        if message.trim().is_empty() {
            return Err(ApiError::BadRequest("Message is required".to_string()));
        }

        let start_time = Instant::now();
        info!(
            "Chat request: user={}, topic={}, message_len={}",
            user_id,
            topic,
            message.len()
        );

        self.history.append(user_id, topic, Role::User, message).await?;

        let messages = self
            .history
            .build_prompt(user_id, topic, &self.system_prompt)
            .await?;

        let raw_reply = match self.completion.complete(&messages, self.options).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!("Completion failed for user={}, topic={}: {}", user_id, topic, e);
                return Err(e.into());
            }
        };

        let reply = sanitize(&raw_reply);
        self.history.append(user_id, topic, Role::Assistant, &reply).await?;

        info!("Chat completed in {}ms", start_time.elapsed().as_millis());
        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HistoryConfig;
    use crate::models::chat::ChatMessage;
    use crate::services::conversation::{MemoryChatStore, Turn};
    use crate::services::llm_service::{CompletionError, MockCompletionClient};

    const OPTIONS: CompletionOptions = CompletionOptions { temperature: 0.7, max_tokens: 1024 };

    fn service(mock: MockCompletionClient) -> (ChatService, Arc<HistoryManager>) {
        let history = Arc::new(HistoryManager::new(
            Arc::new(MemoryChatStore::new()),
            &HistoryConfig::default(),
        ));
        let service = ChatService::new(history.clone(), Arc::new(mock), OPTIONS, "legal only".to_string());
        (service, history)
    }

    #[tokio::test]
    async fn test_reply_is_sanitized_and_recorded() {
        let mut mock = MockCompletionClient::new();
        mock.expect_complete()
            .times(1)
            .returning(|messages, options| {
                assert_eq!(options.max_tokens, 1024);
                assert_eq!(
                    messages,
                    &[ChatMessage::system("legal only"), ChatMessage::user("What is a contract?")]
                );
                Ok("**A contract** is:\n\n3. an offer\n4. an acceptance".to_string())
            });

        let (service, history) = service(mock);
        let reply = service.reply("u1", "contracts", "What is a contract?").await.unwrap();

        assert_eq!(reply, "A contract is:\n\n1. an offer\n1. an acceptance");
        assert_eq!(
            history.get_history("u1", "contracts").await.unwrap(),
            vec![
                Turn::new(Role::User, "What is a contract?"),
                Turn::new(Role::Assistant, reply),
            ]
        );
    }

    #[tokio::test]
    async fn test_prompt_includes_previous_turns() {
        let mut mock = MockCompletionClient::new();
        let mut call = 0;
        mock.expect_complete().times(2).returning(move |messages, _| {
            call += 1;
            // system + 1 turn, then system + 3 turns
            assert_eq!(messages.len(), call * 2);
            Ok(format!("answer {}", call))
        });

        let (service, _) = service(mock);
        service.reply("u1", "general", "first").await.unwrap();
        let second = service.reply("u1", "general", "second").await.unwrap();
        assert_eq!(second, "answer 2");
    }

    #[tokio::test]
    async fn test_blank_message_is_rejected_without_side_effects() {
        let mut mock = MockCompletionClient::new();
        mock.expect_complete().never();

        let (service, history) = service(mock);
        let err = service.reply("u1", "general", "   ").await.unwrap_err();

        assert!(matches!(err, ApiError::BadRequest(ref m) if m == "Message is required"));
        assert!(history.get_all("u1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_upstream_failure_keeps_only_user_turn() {
        let mut mock = MockCompletionClient::new();
        mock.expect_complete()
            .times(1)
            .returning(|_, _| Err(CompletionError::Transport("connection reset".to_string())));

        let (service, history) = service(mock);
        let err = service.reply("u1", "general", "hello").await.unwrap_err();

        assert!(matches!(err, ApiError::LlmError(ref m) if m.contains("connection reset")));
        assert_eq!(
            history.get_history("u1", "general").await.unwrap(),
            vec![Turn::new(Role::User, "hello")]
        );
    }
}
