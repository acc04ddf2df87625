//! Conversation history management
//!
//! Per-user, per-topic threads kept in a [`ChatStore`]:
//! - Create-or-fetch of user records with an explicit presence signal
//! - Trailing window used to bound the prompt
//! - Advisory staleness check
//! - Per-user serialization of read-modify-write cycles

pub mod expiry;
mod locks;
pub mod manager;
pub mod store;
pub mod types;

pub use locks::{KeyGuard, KeyedLocks};
pub use manager::{HistoryError, HistoryManager};
pub use store::{ChatStore, MemoryChatStore, StoreError};
pub use types::{
    ClearOutcome, ConversationThread, ExpiryStatus, Role, Turn, UserPresence, UserRecord,
};
