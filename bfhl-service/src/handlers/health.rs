use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};

use crate::models::ApiResponse;
use crate::services::get_metrics;
use crate::startup::AppState;

/// Liveness probe. No dependencies are checked, so it never fails.
pub async fn health_check(State(state): State<AppState>) -> Json<ApiResponse<()>> {
    Json(ApiResponse::health(
        state.config.identity.official_email.as_str(),
    ))
}

pub async fn metrics_endpoint() -> impl IntoResponse {
    (
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        get_metrics(),
    )
}
