use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;

const MODEL_ID: &str = "google/vit-base-patch16-224";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Client for the Hugging Face image-classification inference endpoint.
pub struct HfClassifier {
    http: Client,
    api_token: String,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct Prediction {
    label: String,
}

impl HfClassifier {
    pub fn new(api_token: &str) -> Result<Self, ClassifierError> {
        Self::with_base_url(api_token, "https://api-inference.huggingface.co")
    }

    pub fn with_base_url(api_token: &str, base_url: &str) -> Result<Self, ClassifierError> {
        if api_token.is_empty() {
            return Err(ClassifierError::Config);
        }

        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(ClassifierError::Http)?;

        Ok(Self {
            http,
            api_token: api_token.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Classify raw image bytes, returning the top predicted label
    /// (lowercased).
    pub async fn classify(&self, image_bytes: Vec<u8>) -> Result<String, ClassifierError> {
        let url = format!("{}/models/{}", self.base_url, MODEL_ID);

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_token)
            .body(image_bytes)
            .send()
            .await
            .map_err(ClassifierError::Http)?;

        if response.status() == StatusCode::SERVICE_UNAVAILABLE {
            return Err(ClassifierError::ModelLoading);
        }
        if !response.status().is_success() {
            return Err(ClassifierError::Status(response.status().as_u16()));
        }

        let predictions: Vec<Prediction> =
            response.json().await.map_err(ClassifierError::Http)?;

        predictions
            .first()
            .map(|p| p.label.to_lowercase())
            .ok_or(ClassifierError::Empty)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ClassifierError {
    #[error("classifier API token is not configured")]
    Config,

    #[error("inference request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("inference model is still loading")]
    ModelLoading,

    #[error("inference endpoint returned HTTP {0}")]
    Status(u16),

    #[error("inference returned no predictions")]
    Empty,
}
