pub mod chat;
pub mod health;
pub mod history;
pub mod user;
