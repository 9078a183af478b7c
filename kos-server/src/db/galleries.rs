//! Gallery photos

use shared::models::Gallery;
use shared::util::now_millis;
use sqlx::SqlitePool;

pub async fn list(pool: &SqlitePool, category: Option<&str>) -> Result<Vec<Gallery>, sqlx::Error> {
    sqlx::query_as(
        "SELECT * FROM galleries WHERE (? IS NULL OR category = ?)
         ORDER BY created_at DESC, id DESC",
    )
    .bind(category)
    .bind(category)
    .fetch_all(pool)
    .await
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> Result<Option<Gallery>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM galleries WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn create(
    pool: &SqlitePool,
    title: &str,
    category: &str,
    image_url: &str,
) -> Result<Gallery, sqlx::Error> {
    sqlx::query_as(
        "INSERT INTO galleries (title, category, image_url, created_at)
         VALUES (?, ?, ?, ?) RETURNING *",
    )
    .bind(title)
    .bind(category)
    .bind(image_url)
    .bind(now_millis())
    .fetch_one(pool)
    .await
}

pub async fn delete(pool: &SqlitePool, id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM galleries WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
