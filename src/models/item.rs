use chrono::{DateTime, Utc};
use garde::Validate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A wardrobe catalog item. Generated try-on results are stored here too,
/// distinguishable only by their `"tryon"` type tag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogItem {
    pub id: Uuid,
    pub name: String,
    #[serde(rename = "type")]
    pub item_type: String,
    #[serde(rename = "imageUrl")]
    pub image_url: String,
    pub created_at: DateTime<Utc>,
}

/// Request to add a wardrobe item (client-uploaded image).
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AddItemRequest {
    #[garde(length(min = 1, max = 200))]
    pub name: String,

    /// Base64-encoded image payload.
    #[garde(length(min = 1))]
    pub image_base64: String,

    /// Garment type; classified automatically when absent or "unknown".
    #[garde(skip)]
    #[serde(rename = "type", default)]
    pub item_type: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AddItemResponse {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub item_type: String,
}

/// Partial update of an item's name and/or type.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateItemRequest {
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub item_type: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct BatchDeleteRequest {
    pub item_ids: Vec<Uuid>,
}
