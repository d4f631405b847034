use sqlx::PgPool;
use std::sync::Arc;

use crate::services::{classifier::HfClassifier, relay::MediaRelay, tryon::TryOnOrchestrator};

/// Shared application state passed to all route handlers.
///
/// Every external collaborator is an explicitly constructed client owned
/// here; nothing is initialized at module load.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub relay: Arc<MediaRelay>,
    pub classifier: Arc<HfClassifier>,
    pub tryon: Arc<TryOnOrchestrator>,
}

impl AppState {
    pub fn new(
        db: PgPool,
        relay: Arc<MediaRelay>,
        classifier: Arc<HfClassifier>,
        tryon: Arc<TryOnOrchestrator>,
    ) -> Self {
        Self {
            db,
            relay,
            classifier,
            tryon,
        }
    }
}
