use axum::{http::StatusCode, Json};
use serde::Serialize;

#[derive(Serialize)]
pub struct HealthResponse {
    status: String,
    version: String,
}

#[derive(Serialize)]
pub struct PingResponse {
    status: &'static str,
}

/// Keep-alive probe used by clients to wake the service
pub async fn ping() -> (StatusCode, Json<PingResponse>) {
    (StatusCode::OK, Json(PingResponse { status: "awake" }))
}

pub async fn health_check() -> (StatusCode, Json<HealthResponse>) {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "healthy".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }),
    )
}
