pub mod config;
pub mod database;
pub mod handlers;
pub mod models;
pub mod services;
pub mod state;
pub mod utils;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, TraceLayer},
};

use state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/chat", post(handlers::chat::chat_handler))
        .route("/chat_history", get(handlers::history::chat_history_handler))
        .route("/user_id", get(handlers::user::new_user_id))
        .route("/history/clear", post(handlers::history::clear_history_handler))
        .route("/history/check_expiry", post(handlers::history::check_expiry_handler))
        .route("/ping", get(handlers::health::ping))
        .route("/health", get(handlers::health::health_check))
        .with_state(state)
        // CORS
        .layer(CorsLayer::permissive())
        // Tracing
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::default().include_headers(false)),
        )
}
