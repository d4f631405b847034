use image::ImageFormat;
use reqwest::Client;
use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use crate::services::storage::{MediaStorage, StorageError};

/// Logical folder for re-hosted try-on results.
pub const TRYON_FOLDER: &str = "closetly/tryon";
/// Logical folder for client-uploaded wardrobe items.
pub const ITEMS_FOLDER: &str = "closetly/items";
/// Logical folder for client-uploaded model photos.
pub const MODELS_FOLDER: &str = "closetly/models";

const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(15);

/// Re-publishes images under the system's own hosting account.
///
/// Provider-produced results arrive as remote URLs in whatever format the
/// provider emits; the relay normalizes them to PNG (at most one re-encode
/// pass) before uploading. Client uploads are raw bytes and go up as-is.
pub struct MediaRelay {
    http: Client,
    storage: Arc<MediaStorage>,
}

impl MediaRelay {
    pub fn new(storage: Arc<MediaStorage>) -> Result<Self, RelayError> {
        let http = Client::builder()
            .timeout(DOWNLOAD_TIMEOUT)
            .build()
            .map_err(RelayError::Download)?;
        Ok(Self { http, storage })
    }

    /// Fetch a remote image, normalize it to PNG, and host it under
    /// `folder`. Returns the stable public URL.
    pub async fn relay_url(&self, source_url: &str, folder: &str) -> Result<String, RelayError> {
        let response = self
            .http
            .get(source_url)
            .send()
            .await
            .map_err(RelayError::Download)?
            .error_for_status()
            .map_err(RelayError::Download)?;

        let bytes = response.bytes().await.map_err(RelayError::Download)?;
        let png = to_png(&bytes)?;

        let key = format!("{}/{}.png", folder, Uuid::new_v4());
        self.storage
            .upload(&key, &png, "image/png")
            .await
            .map_err(RelayError::Upload)
    }

    /// Host raw image bytes under `folder` without re-encoding.
    pub async fn upload_bytes(&self, bytes: &[u8], folder: &str) -> Result<String, RelayError> {
        let (ext, content_type) = match image::guess_format(bytes) {
            Ok(ImageFormat::Jpeg) => ("jpg", "image/jpeg"),
            Ok(ImageFormat::WebP) => ("webp", "image/webp"),
            // Clients send PNG; treat anything unrecognized the same way.
            _ => ("png", "image/png"),
        };

        let key = format!("{}/{}.{}", folder, Uuid::new_v4(), ext);
        self.storage
            .upload(&key, bytes, content_type)
            .await
            .map_err(RelayError::Upload)
    }
}

/// Re-encode arbitrary image bytes to PNG. Bytes already in PNG form are
/// passed through untouched, keeping the relay to a single encode pass.
fn to_png(bytes: &[u8]) -> Result<Vec<u8>, RelayError> {
    if matches!(image::guess_format(bytes), Ok(ImageFormat::Png)) {
        return Ok(bytes.to_vec());
    }

    let decoded = image::load_from_memory(bytes).map_err(RelayError::Decode)?;
    let mut out = Vec::new();
    decoded
        .write_to(&mut Cursor::new(&mut out), ImageFormat::Png)
        .map_err(RelayError::Decode)?;
    Ok(out)
}

#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("result download failed: {0}")]
    Download(#[from] reqwest::Error),

    #[error("image decode failed: {0}")]
    Decode(#[from] image::ImageError),

    #[error("hosting upload failed: {0}")]
    Upload(#[from] StorageError),
}
