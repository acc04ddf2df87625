pub mod chat_service;
pub mod conversation;
pub mod llm_service;
pub mod sanitizer;

pub use chat_service::ChatService;
pub use llm_service::{CompletionClient, CompletionOptions, LlmService};
pub use sanitizer::sanitize;
