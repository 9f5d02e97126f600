use axum::{body::Bytes, extract::State, Json};

use crate::models::{ApiResponse, OperationOutput};
use crate::startup::AppState;
use service_core::error::AppError;

/// `POST /bfhl`.
///
/// The body is taken as raw bytes so decoding failures come back in the
/// standard failure envelope instead of axum's plain-text rejection.
#[tracing::instrument(skip(state, body), fields(body_len = body.len()))]
pub async fn dispatch_operation(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<ApiResponse<OperationOutput>>, AppError> {
    let output = state.dispatcher.handle(&body).await?;

    Ok(Json(ApiResponse::success(
        state.config.identity.official_email.as_str(),
        output,
    )))
}
