use axum::Json;
use tracing::debug;

use crate::models::chat::UserIdResponse;

/// Hand out a fresh opaque user id
pub async fn new_user_id() -> Json<UserIdResponse> {
    let user_id = uuid::Uuid::new_v4().to_string();
    debug!("Issued user id {}", user_id);
    Json(UserIdResponse { user_id })
}
