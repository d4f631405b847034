use axum::extract::{Path, State};
use axum::Json;
use garde::Validate;

use crate::app_state::AppState;
use crate::error::ApiError;
use crate::models::tryon::{PollOutcome, SubmitResponse, TryOnRequest};
use crate::services::kling::ProviderError;
use crate::services::tryon::TryOnError;

/// POST /api/tryon — submit a try-on job to the provider.
///
/// A provider-side rejection of the request or credential is a 401; any
/// other submission fault is a 500.
pub async fn submit_tryon(
    State(state): State<AppState>,
    Json(request): Json<TryOnRequest>,
) -> Result<Json<SubmitResponse>, ApiError> {
    request.validate()?;

    let id = state
        .tryon
        .submit(&request.model_image, &request.clothing_image)
        .await
        .map_err(|e| match e {
            TryOnError::Provider(ProviderError::Auth { message, .. }) => {
                ApiError::unauthorized(message)
            }
            other => ApiError::internal(format!("Try-on failed: {other}")),
        })?;

    Ok(Json(SubmitResponse { id }))
}

/// GET /api/tryon/status/{task_id} — poll a task.
///
/// Terminal and non-terminal statuses are all 200s; a relay, persistence,
/// or provider-communication fault during the poll is an error response
/// even when the provider-side job has succeeded. The caller polls again.
pub async fn tryon_status(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
) -> Result<Json<PollOutcome>, ApiError> {
    let outcome = state.tryon.poll(&task_id).await?;
    Ok(Json(outcome))
}
