use garde::Validate;
use serde::{Deserialize, Serialize};

/// Normalized status of a try-on task.
///
/// `Pending` and `Running` are non-terminal; `Succeeded` and `Failed` are
/// terminal and admit no further transition.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    Running,
    Succeeded,
    Failed,
}

impl TaskStatus {
    /// Translate a provider status token into the normalized vocabulary.
    ///
    /// Kling's terminal-success token is `succeed`, not `succeeded`. Tokens
    /// outside the known set are treated as failures rather than invented
    /// in-progress states.
    pub fn from_provider(token: &str) -> Self {
        match token {
            "submitted" | "pending" => Self::Pending,
            "processing" | "running" => Self::Running,
            "succeed" => Self::Succeeded,
            _ => Self::Failed,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }
}

/// Request body for POST /api/tryon.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TryOnRequest {
    /// Base64-encoded photo of the person.
    #[garde(length(min = 1))]
    pub model_image: String,

    /// Base64-encoded photo of the garment.
    #[garde(length(min = 1))]
    pub clothing_image: String,
}

/// Response body for POST /api/tryon.
#[derive(Debug, Serialize, Deserialize)]
pub struct SubmitResponse {
    pub id: String,
}

/// Outcome of polling a try-on task, as returned to the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollOutcome {
    pub status: TaskStatus,

    /// Re-hosted result URL; present only on `succeeded`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_url: Option<String>,

    /// Provider-supplied failure message; present only on `failed`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PollOutcome {
    pub fn in_progress(status: TaskStatus) -> Self {
        Self {
            status,
            output_url: None,
            error: None,
        }
    }

    pub fn succeeded(output_url: String) -> Self {
        Self {
            status: TaskStatus::Succeeded,
            output_url: Some(output_url),
            error: None,
        }
    }

    pub fn failed(error: String) -> Self {
        Self {
            status: TaskStatus::Failed,
            output_url: None,
            error: Some(error),
        }
    }
}
