use async_trait::async_trait;
use sqlx::PgPool;

use crate::db::queries;
use crate::models::item::CatalogItem;

/// Append-only write surface the try-on pipeline persists results through.
///
/// A trait seam rather than a pool reference so the orchestrator's
/// persistence collaborator is injectable.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn insert_item(
        &self,
        name: &str,
        item_type: &str,
        image_url: &str,
    ) -> Result<CatalogItem, CatalogError>;
}

/// Postgres-backed catalog store.
pub struct PgCatalog {
    pool: PgPool,
}

impl PgCatalog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CatalogStore for PgCatalog {
    async fn insert_item(
        &self,
        name: &str,
        item_type: &str,
        image_url: &str,
    ) -> Result<CatalogItem, CatalogError> {
        queries::insert_item(&self.pool, name, item_type, image_url)
            .await
            .map_err(CatalogError::Db)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("catalog write failed: {0}")]
    Db(#[from] sqlx::Error),
}
