use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::models::item::CatalogItem;
use crate::models::model_photo::ModelPhoto;

fn item_from_row(row: &PgRow) -> Result<CatalogItem, sqlx::Error> {
    Ok(CatalogItem {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        item_type: row.try_get("item_type")?,
        image_url: row.try_get("image_url")?,
        created_at: row.try_get("created_at")?,
    })
}

fn model_from_row(row: &PgRow) -> Result<ModelPhoto, sqlx::Error> {
    Ok(ModelPhoto {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        gender: row.try_get("gender")?,
        style: row.try_get("style")?,
        image_url: row.try_get("image_url")?,
        created_at: row.try_get("created_at")?,
    })
}

/// Insert a wardrobe item
pub async fn insert_item(
    pool: &PgPool,
    name: &str,
    item_type: &str,
    image_url: &str,
) -> Result<CatalogItem, sqlx::Error> {
    let row = sqlx::query(
        r#"
        INSERT INTO items (name, item_type, image_url)
        VALUES ($1, $2, $3)
        RETURNING id, name, item_type, image_url, created_at
        "#,
    )
    .bind(name)
    .bind(item_type)
    .bind(image_url)
    .fetch_one(pool)
    .await?;

    item_from_row(&row)
}

/// List all wardrobe items, newest first
pub async fn list_items(pool: &PgPool) -> Result<Vec<CatalogItem>, sqlx::Error> {
    let rows = sqlx::query(
        r#"
        SELECT id, name, item_type, image_url, created_at
        FROM items
        ORDER BY created_at DESC
        "#,
    )
    .fetch_all(pool)
    .await?;

    rows.iter().map(item_from_row).collect()
}

/// List up to `limit` items whose type is in `types`
pub async fn list_items_by_types(
    pool: &PgPool,
    types: &[String],
    limit: i64,
) -> Result<Vec<CatalogItem>, sqlx::Error> {
    let rows = sqlx::query(
        r#"
        SELECT id, name, item_type, image_url, created_at
        FROM items
        WHERE item_type = ANY($1)
        ORDER BY created_at DESC
        LIMIT $2
        "#,
    )
    .bind(types)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    rows.iter().map(item_from_row).collect()
}

/// Update an item's name and/or type. Returns false when the id is unknown.
pub async fn update_item(
    pool: &PgPool,
    item_id: Uuid,
    name: Option<&str>,
    item_type: Option<&str>,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE items
        SET name = COALESCE($1, name),
            item_type = COALESCE($2, item_type)
        WHERE id = $3
        "#,
    )
    .bind(name)
    .bind(item_type)
    .bind(item_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// Delete an item. Returns false when the id is unknown.
pub async fn delete_item(pool: &PgPool, item_id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM items WHERE id = $1")
        .bind(item_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() == 1)
}

/// Delete a batch of items, returning how many were removed
pub async fn delete_items(pool: &PgPool, item_ids: &[Uuid]) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM items WHERE id = ANY($1)")
        .bind(item_ids)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}

/// Insert a model photo
pub async fn insert_model(
    pool: &PgPool,
    name: &str,
    gender: &str,
    style: &str,
    image_url: &str,
) -> Result<ModelPhoto, sqlx::Error> {
    let row = sqlx::query(
        r#"
        INSERT INTO models (name, gender, style, image_url)
        VALUES ($1, $2, $3, $4)
        RETURNING id, name, gender, style, image_url, created_at
        "#,
    )
    .bind(name)
    .bind(gender)
    .bind(style)
    .bind(image_url)
    .fetch_one(pool)
    .await?;

    model_from_row(&row)
}

/// List all model photos, newest first
pub async fn list_models(pool: &PgPool) -> Result<Vec<ModelPhoto>, sqlx::Error> {
    let rows = sqlx::query(
        r#"
        SELECT id, name, gender, style, image_url, created_at
        FROM models
        ORDER BY created_at DESC
        "#,
    )
    .fetch_all(pool)
    .await?;

    rows.iter().map(model_from_row).collect()
}

/// Delete a model photo. Returns false when the id is unknown.
pub async fn delete_model(pool: &PgPool, model_id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM models WHERE id = $1")
        .bind(model_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() == 1)
}
