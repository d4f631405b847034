use axum::extract::{Path, State};
use axum::Json;
use base64::Engine;
use garde::Validate;
use serde::Serialize;
use uuid::Uuid;

use crate::app_state::AppState;
use crate::db::queries;
use crate::error::ApiError;
use crate::models::item::{
    AddItemRequest, AddItemResponse, BatchDeleteRequest, CatalogItem, UpdateItemRequest,
};
use crate::services::relay::ITEMS_FOLDER;

/// Garment types the classifier is trusted to assign directly.
const ALLOWED_TYPES: &[&str] = &["top", "pants", "t-shirt", "pajama", "dress", "jacket", "skirt"];

#[derive(Serialize)]
pub struct ItemsResponse {
    pub items: Vec<CatalogItem>,
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Serialize)]
pub struct BatchDeleteResponse {
    pub deleted: u64,
}

/// GET /api/items
pub async fn list_items(State(state): State<AppState>) -> Result<Json<ItemsResponse>, ApiError> {
    let items = queries::list_items(&state.db).await?;
    Ok(Json(ItemsResponse { items }))
}

/// POST /api/items — host the uploaded image, classify it when the client
/// gave no type, then insert.
pub async fn add_item(
    State(state): State<AppState>,
    Json(request): Json<AddItemRequest>,
) -> Result<Json<AddItemResponse>, ApiError> {
    request.validate()?;

    let image_bytes = base64::engine::general_purpose::STANDARD
        .decode(request.image_base64.as_bytes())
        .map_err(|_| ApiError::bad_request("imageBase64 is not valid base64"))?;

    let image_url = state.relay.upload_bytes(&image_bytes, ITEMS_FOLDER).await?;
    tracing::debug!(image_url = %image_url, "Item image hosted");

    let item_type = match request
        .item_type
        .as_deref()
        .filter(|t| !t.is_empty() && *t != "unknown")
    {
        Some(explicit) => explicit.to_string(),
        None => classify_garment(&state, image_bytes).await,
    };

    let item = queries::insert_item(&state.db, &request.name, &item_type, &image_url).await?;
    tracing::info!(item_id = %item.id, item_type = %item.item_type, "Item added");

    Ok(Json(AddItemResponse {
        id: item.id,
        item_type: item.item_type,
    }))
}

/// Classify image bytes, collapsing unrecognized labels and any classifier
/// fault to "others".
async fn classify_garment(state: &AppState, image_bytes: Vec<u8>) -> String {
    match state.classifier.classify(image_bytes).await {
        Ok(label) if ALLOWED_TYPES.contains(&label.as_str()) => label,
        Ok(label) => {
            tracing::debug!(label = %label, "Predicted label outside allowed set");
            "others".to_string()
        }
        Err(e) => {
            tracing::warn!(error = %e, "Classification failed, tagging as others");
            "others".to_string()
        }
    }
}

/// PUT /api/items/{item_id}
pub async fn update_item(
    State(state): State<AppState>,
    Path(item_id): Path<Uuid>,
    Json(update): Json<UpdateItemRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let updated = queries::update_item(
        &state.db,
        item_id,
        update.name.as_deref(),
        update.item_type.as_deref(),
    )
    .await?;

    if updated {
        Ok(Json(MessageResponse {
            message: "Item updated".to_string(),
        }))
    } else {
        Err(ApiError::not_found("Item not found"))
    }
}

/// DELETE /api/items/{item_id}
pub async fn delete_item(
    State(state): State<AppState>,
    Path(item_id): Path<Uuid>,
) -> Result<Json<MessageResponse>, ApiError> {
    if queries::delete_item(&state.db, item_id).await? {
        Ok(Json(MessageResponse {
            message: "Item deleted".to_string(),
        }))
    } else {
        Err(ApiError::not_found("Item not found"))
    }
}

/// POST /api/items/batch-delete
pub async fn batch_delete_items(
    State(state): State<AppState>,
    Json(request): Json<BatchDeleteRequest>,
) -> Result<Json<BatchDeleteResponse>, ApiError> {
    let deleted = queries::delete_items(&state.db, &request.item_ids).await?;
    Ok(Json(BatchDeleteResponse { deleted }))
}
