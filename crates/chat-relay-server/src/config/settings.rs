use anyhow::Result;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::services::conversation::expiry::{DEFAULT_EXPIRY_DAYS, DEFAULT_WINDOW_SIZE};

pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a highly knowledgeable legal assistant trained in various areas of law including contract law, constitutional law, tort law, property law, and criminal law. You only respond to questions that are clearly legal in nature. If a question is outside your legal scope, such as questions about general knowledge, personal advice, or other unrelated topics, you must respond politely that you only assist with legal questions. Always provide clear, concise, and accurate legal information suitable for a non-lawyer to understand, and avoid offering personal opinions or advice outside legal interpretation.";

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Settings {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub database: DatabaseConfig,
    pub llm: LlmConfig,
    pub history: HistoryConfig,
    pub prompts: PromptsConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Postgres,
    Memory,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct StorageConfig {
    pub backend: StorageBackend,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub pool_max_size: u32,
    pub pool_timeout_seconds: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LlmConfig {
    pub base_url: String,
    /// Sent as a bearer token when non-empty
    #[serde(default)]
    pub api_key: String,
    pub model: String,
    pub timeout_seconds: u64,
    pub max_tokens: usize,
    pub temperature: f32,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct HistoryConfig {
    /// Number of trailing turns sent to the model
    pub window_size: usize,
    /// Staleness threshold for `check_expiry`
    pub expiry_days: i64,
    pub default_topic: String,
    pub default_user_id: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct PromptsConfig {
    pub system_prompt: String,
}

impl Settings {
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let config = Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 5000)?
            .set_default("storage.backend", "postgres")?
            .set_default("database.url", "postgres://localhost/chat_relay")?
            .set_default("database.pool_max_size", 10)?
            .set_default("database.pool_timeout_seconds", 5)?
            .set_default("llm.base_url", "https://api.groq.com/openai")?
            .set_default("llm.api_key", "")?
            .set_default("llm.model", "meta-llama/llama-4-scout-17b-16e-instruct")?
            .set_default("llm.timeout_seconds", 60)?
            .set_default("llm.max_tokens", 1024)?
            .set_default("llm.temperature", 0.7)?
            .set_default("history.window_size", DEFAULT_WINDOW_SIZE as i64)?
            .set_default("history.expiry_days", DEFAULT_EXPIRY_DAYS)?
            .set_default("history.default_topic", "general")?
            .set_default("history.default_user_id", "default_user")?
            .set_default("prompts.system_prompt", DEFAULT_SYSTEM_PROMPT)?
            .add_source(File::with_name("config/settings").required(false))
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true)
            )
            .build()?;

        let settings: Settings = config.try_deserialize()?;
        Ok(settings)
    }
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            window_size: DEFAULT_WINDOW_SIZE,
            expiry_days: DEFAULT_EXPIRY_DAYS,
            default_topic: "general".to_string(),
            default_user_id: "default_user".to_string(),
        }
    }
}
