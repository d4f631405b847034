use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Fixed, versioned job-type selector for the virtual try-on endpoint.
const JOB_TYPE: &str = "kolors-virtual-try-on-v1";

/// Token validity window in seconds. Tokens are regenerated for every
/// outbound call rather than cached for the window.
const TOKEN_TTL_SECS: i64 = 3600;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Client for the Kling "Kolors Virtual Try-On" API.
///
/// Holds no job state; a task id returned from [`submit`](Self::submit) is
/// only resolvable back through [`poll`](Self::poll).
pub struct KlingClient {
    http: Client,
    base_url: String,
    access_key: String,
    secret_key: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    iss: String,
    iat: i64,
    nbf: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct KlingEnvelope<T> {
    code: i64,
    #[serde(default)]
    message: String,
    data: Option<T>,
}

#[derive(Debug, Deserialize)]
struct SubmitData {
    task_id: String,
}

/// Raw task payload as reported by the provider.
#[derive(Debug, Clone, Deserialize)]
pub struct KlingTask {
    pub task_id: String,
    pub task_status: String,
    #[serde(default)]
    pub task_status_msg: Option<String>,
    #[serde(default)]
    pub task_result: Option<KlingTaskResult>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct KlingTaskResult {
    #[serde(default)]
    pub images: Vec<KlingImage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct KlingImage {
    pub url: String,
}

impl KlingClient {
    pub fn new(
        base_url: &str,
        access_key: &str,
        secret_key: &str,
    ) -> Result<Self, ProviderError> {
        if access_key.is_empty() || secret_key.is_empty() {
            return Err(ProviderError::Config);
        }

        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(ProviderError::Http)?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            access_key: access_key.to_string(),
            secret_key: secret_key.to_string(),
        })
    }

    /// Sign a fresh short-lived bearer token.
    ///
    /// A new token is produced for every call; reusing one across the
    /// validity window invites clock-skew rejections at the provider.
    fn bearer_token(&self) -> Result<String, ProviderError> {
        let now = chrono::Utc::now().timestamp();
        let claims = Claims {
            iss: self.access_key.clone(),
            iat: now,
            nbf: now,
            exp: now + TOKEN_TTL_SECS,
        };

        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.secret_key.as_bytes()),
        )
        .map_err(ProviderError::Sign)
    }

    /// Submit a try-on job. Returns the provider-assigned task id.
    pub async fn submit(
        &self,
        human_image: &str,
        cloth_image: &str,
    ) -> Result<String, ProviderError> {
        let token = self.bearer_token()?;
        let url = format!("{}/v1/images/kolors-virtual-try-on", self.base_url);

        let body = serde_json::json!({
            "model_name": JOB_TYPE,
            "human_image": human_image,
            "cloth_image": cloth_image,
        });

        let response = self
            .http
            .post(&url)
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .map_err(ProviderError::Http)?;

        let envelope: KlingEnvelope<SubmitData> =
            response.json().await.map_err(ProviderError::Http)?;

        if envelope.code != 0 {
            return Err(ProviderError::Auth {
                code: envelope.code,
                message: non_empty_or(envelope.message, "Auth or request error"),
            });
        }

        envelope
            .data
            .map(|d| d.task_id)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| ProviderError::Response("ok response carried no task id".to_string()))
    }

    /// Fetch the current state of a previously submitted job.
    pub async fn poll(&self, task_id: &str) -> Result<KlingTask, ProviderError> {
        let token = self.bearer_token()?;
        let url = format!("{}/v1/images/kolors-virtual-try-on/{task_id}", self.base_url);

        let response = self
            .http
            .get(&url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(ProviderError::Http)?;

        let envelope: KlingEnvelope<KlingTask> =
            response.json().await.map_err(ProviderError::Http)?;

        if envelope.code != 0 {
            return Err(ProviderError::Auth {
                code: envelope.code,
                message: non_empty_or(envelope.message, "Auth or API error"),
            });
        }

        envelope
            .data
            .ok_or_else(|| ProviderError::Response("ok response carried no task data".to_string()))
    }
}

fn non_empty_or(message: String, fallback: &str) -> String {
    if message.is_empty() {
        fallback.to_string()
    } else {
        message
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("provider credentials are not configured")]
    Config,

    #[error("token signing failed: {0}")]
    Sign(#[from] jsonwebtoken::errors::Error),

    #[error("provider rejected the request (code {code}): {message}")]
    Auth { code: i64, message: String },

    #[error("provider unreachable: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected provider response: {0}")]
    Response(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{decode, DecodingKey, Validation};

    #[test]
    fn rejects_missing_credentials() {
        assert!(matches!(
            KlingClient::new("https://api.example.com", "", "secret"),
            Err(ProviderError::Config)
        ));
        assert!(matches!(
            KlingClient::new("https://api.example.com", "ak", ""),
            Err(ProviderError::Config)
        ));
    }

    #[test]
    fn bearer_token_carries_issuer_and_expiry() {
        let client = KlingClient::new("https://api.example.com", "ak-123", "sk-456").unwrap();
        let token = client.bearer_token().unwrap();

        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&["ak-123"]);
        let decoded = decode::<Claims>(
            &token,
            &DecodingKey::from_secret(b"sk-456"),
            &validation,
        )
        .expect("token should verify against the signing secret");

        assert_eq!(decoded.claims.iss, "ak-123");
        assert_eq!(decoded.claims.exp - decoded.claims.iat, TOKEN_TTL_SECS);
        assert_eq!(decoded.claims.nbf, decoded.claims.iat);
    }

    #[test]
    fn tokens_are_freshly_generated_per_call() {
        let client = KlingClient::new("https://api.example.com", "ak", "sk").unwrap();
        // Same second may produce identical tokens; both must at least verify
        // independently.
        let a = client.bearer_token().unwrap();
        let b = client.bearer_token().unwrap();
        assert!(!a.is_empty());
        assert!(!b.is_empty());
    }

    #[test]
    fn poll_payload_parses_result_images() {
        let raw = r#"{
            "code": 0,
            "message": "SUCCEED",
            "data": {
                "task_id": "task-123",
                "task_status": "succeed",
                "task_result": {"images": [{"url": "https://cdn/a.webp"}, {"url": "https://cdn/b.webp"}]}
            }
        }"#;
        let envelope: KlingEnvelope<KlingTask> = serde_json::from_str(raw).unwrap();
        let task = envelope.data.unwrap();
        assert_eq!(task.task_status, "succeed");
        let images = task.task_result.unwrap().images;
        assert_eq!(images.len(), 2);
        assert_eq!(images[1].url, "https://cdn/b.webp");
    }

    #[test]
    fn poll_payload_tolerates_missing_result() {
        let raw = r#"{"code": 0, "data": {"task_id": "t", "task_status": "processing"}}"#;
        let envelope: KlingEnvelope<KlingTask> = serde_json::from_str(raw).unwrap();
        let task = envelope.data.unwrap();
        assert!(task.task_result.is_none());
        assert!(task.task_status_msg.is_none());
    }
}
