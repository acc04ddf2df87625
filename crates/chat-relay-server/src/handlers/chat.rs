use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};

use crate::models::chat::{ChatRequest, ChatResponse};
use crate::state::AppState;
use crate::utils::error::ApiError;

pub async fn chat_handler(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, ApiError> {
    let Json(request) = payload?;

    let message = request
        .message
        .ok_or_else(|| ApiError::BadRequest("Message is required".to_string()))?;
    let user_id = state.user_id_or_default(request.user_id);
    let topic = state.topic_or_default(request.topic);

    let reply = state.chat_service.reply(&user_id, &topic, &message).await?;

    Ok(Json(ChatResponse { reply }))
}
