use axum::extract::{Path, State};
use axum::Json;
use base64::Engine;
use garde::Validate;
use serde::Serialize;
use uuid::Uuid;

use crate::app_state::AppState;
use crate::db::queries;
use crate::error::ApiError;
use crate::models::model_photo::{AddModelRequest, AddModelResponse, ModelPhoto};
use crate::routes::items::MessageResponse;
use crate::services::relay::MODELS_FOLDER;

#[derive(Serialize)]
pub struct ModelsResponse {
    pub models: Vec<ModelPhoto>,
}

/// GET /api/models
pub async fn list_models(State(state): State<AppState>) -> Result<Json<ModelsResponse>, ApiError> {
    let models = queries::list_models(&state.db).await?;
    Ok(Json(ModelsResponse { models }))
}

/// POST /api/models — host the uploaded photo and insert.
pub async fn add_model(
    State(state): State<AppState>,
    Json(request): Json<AddModelRequest>,
) -> Result<Json<AddModelResponse>, ApiError> {
    request.validate()?;

    let image_bytes = base64::engine::general_purpose::STANDARD
        .decode(request.image_base64.as_bytes())
        .map_err(|_| ApiError::bad_request("imageBase64 is not valid base64"))?;

    let image_url = state
        .relay
        .upload_bytes(&image_bytes, MODELS_FOLDER)
        .await?;

    let model = queries::insert_model(
        &state.db,
        &request.name,
        &request.gender,
        &request.style,
        &image_url,
    )
    .await?;
    tracing::info!(model_id = %model.id, "Model photo added");

    Ok(Json(AddModelResponse {
        id: model.id,
        image_url: model.image_url,
    }))
}

/// DELETE /api/models/{model_id}
pub async fn delete_model(
    State(state): State<AppState>,
    Path(model_id): Path<Uuid>,
) -> Result<Json<MessageResponse>, ApiError> {
    if queries::delete_model(&state.db, model_id).await? {
        Ok(Json(MessageResponse {
            message: "Model deleted".to_string(),
        }))
    } else {
        Err(ApiError::not_found("Model not found"))
    }
}
