use chrono::{DateTime, Utc};
use garde::Validate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A model photo used as the "person" side of a try-on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelPhoto {
    pub id: Uuid,
    pub name: String,
    pub gender: String,
    pub style: String,
    #[serde(rename = "imageUrl")]
    pub image_url: String,
    pub created_at: DateTime<Utc>,
}

/// Request to upload a model photo.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AddModelRequest {
    #[garde(length(min = 1, max = 200))]
    pub name: String,

    /// Base64-encoded image payload.
    #[garde(length(min = 1))]
    pub image_base64: String,

    #[garde(skip)]
    #[serde(default = "unspecified")]
    pub gender: String,

    #[garde(skip)]
    #[serde(default = "unspecified")]
    pub style: String,
}

fn unspecified() -> String {
    "unspecified".to_string()
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AddModelResponse {
    pub id: Uuid,
    #[serde(rename = "imageUrl")]
    pub image_url: String,
}
