use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    Json,
};
use tracing::info;

use crate::models::chat::{ChatHistoryResponse, HistoryQuery, StatusResponse, ThreadRequest};
use crate::services::conversation::ExpiryStatus;
use crate::state::AppState;
use crate::utils::error::ApiError;

pub async fn chat_history_handler(
    State(state): State<AppState>,
    query: Result<Query<HistoryQuery>, QueryRejection>,
) -> Result<Json<ChatHistoryResponse>, ApiError> {
    let Query(query) = query?;
    let user_id = state.user_id_or_default(query.user_id);

    let chats = state.history.get_all(&user_id).await?;
    info!("History request: user={}, topics={}", user_id, chats.len());

    Ok(Json(ChatHistoryResponse { chats }))
}

pub async fn clear_history_handler(
    State(state): State<AppState>,
    payload: Result<Json<ThreadRequest>, JsonRejection>,
) -> Result<Json<StatusResponse>, ApiError> {
    let Json(request) = payload?;
    let user_id = state.user_id_or_default(request.user_id);
    let topic = state.topic_or_default(request.topic);

    let outcome = state.history.clear(&user_id, &topic).await?;

    Ok(Json(StatusResponse::new(outcome.as_status())))
}

pub async fn check_expiry_handler(
    State(state): State<AppState>,
    payload: Result<Json<ThreadRequest>, JsonRejection>,
) -> Result<Json<StatusResponse>, ApiError> {
    let Json(request) = payload?;
    let user_id = state.user_id_or_default(request.user_id);
    let topic = state.topic_or_default(request.topic);

    let status = state.history.check_expiry(&user_id, &topic).await?;

    let response = match status {
        ExpiryStatus::Expired { message } => StatusResponse::with_message("expired", message),
        other => StatusResponse::new(other.as_status()),
    };
    Ok(Json(response))
}
