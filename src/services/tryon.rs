use std::sync::Arc;

use crate::db::catalog::{CatalogError, CatalogStore};
use crate::models::tryon::{PollOutcome, TaskStatus};
use crate::services::kling::{KlingClient, ProviderError};
use crate::services::relay::{MediaRelay, RelayError, TRYON_FOLDER};

/// Catalog name given to persisted try-on results.
const RESULT_ITEM_NAME: &str = "Try-On Result";
/// Catalog type tag for generated results.
const RESULT_ITEM_TYPE: &str = "tryon";

/// Orchestrates the try-on lifecycle: submit a job to the provider, poll it,
/// and on terminal success re-host the result image and persist a catalog
/// record.
///
/// Keeps no job state of its own. Every poll is a live round-trip to the
/// provider; a lost task id makes the job unreachable from here, which is
/// acceptable — provider jobs are fire-and-forget.
pub struct TryOnOrchestrator {
    provider: Arc<KlingClient>,
    relay: Arc<MediaRelay>,
    catalog: Arc<dyn CatalogStore>,
}

impl TryOnOrchestrator {
    pub fn new(
        provider: Arc<KlingClient>,
        relay: Arc<MediaRelay>,
        catalog: Arc<dyn CatalogStore>,
    ) -> Self {
        Self {
            provider,
            relay,
            catalog,
        }
    }

    /// Submit a try-on job. Returns the provider-assigned task id.
    pub async fn submit(
        &self,
        model_image: &str,
        clothing_image: &str,
    ) -> Result<String, TryOnError> {
        let task_id = self.provider.submit(model_image, clothing_image).await?;

        metrics::counter!("tryon_jobs_submitted_total").increment(1);
        tracing::info!(task_id = %task_id, "Try-on job submitted");

        Ok(task_id)
    }

    /// Poll a task and, on success, run the relay + persistence path.
    ///
    /// A relay or catalog failure after the provider reports success
    /// surfaces as an error even though the job itself succeeded; the caller
    /// is expected to poll again, and a later successful poll repeats the
    /// relay + insert. There is no idempotency key, so repeated success
    /// observations can insert duplicate catalog records.
    pub async fn poll(&self, task_id: &str) -> Result<PollOutcome, TryOnError> {
        let task = self.provider.poll(task_id).await?;
        let status = TaskStatus::from_provider(&task.task_status);

        match status {
            TaskStatus::Succeeded => {
                // Fixed arbitrary tie-break: the last image in the list.
                let source_url = task
                    .task_result
                    .as_ref()
                    .and_then(|r| r.images.last())
                    .map(|img| img.url.clone())
                    .ok_or(TryOnError::MissingResult)?;

                tracing::debug!(task_id = %task_id, source_url = %source_url, "Relaying result image");
                let output_url = self.relay.relay_url(&source_url, TRYON_FOLDER).await?;

                let item = self
                    .catalog
                    .insert_item(RESULT_ITEM_NAME, RESULT_ITEM_TYPE, &output_url)
                    .await?;

                metrics::counter!("tryon_jobs_succeeded_total").increment(1);
                tracing::info!(
                    task_id = %task_id,
                    item_id = %item.id,
                    output_url = %output_url,
                    "Try-on result relayed and cataloged"
                );

                Ok(PollOutcome::succeeded(output_url))
            }
            TaskStatus::Failed => {
                metrics::counter!("tryon_jobs_failed_total").increment(1);
                let message = task
                    .task_status_msg
                    .unwrap_or_else(|| "Unknown failure".to_string());
                tracing::info!(task_id = %task_id, error = %message, "Try-on job failed at provider");
                Ok(PollOutcome::failed(message))
            }
            TaskStatus::Pending | TaskStatus::Running => Ok(PollOutcome::in_progress(status)),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TryOnError {
    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Relay(#[from] RelayError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error("provider reported success without a result image")]
    MissingResult,
}
