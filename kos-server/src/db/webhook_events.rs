//! Processed payment-gateway notifications

use shared::util::now_millis;
use sqlx::SqlitePool;

/// Record an event; returns false when it was already processed
pub async fn record(pool: &SqlitePool, event_id: &str, event_type: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "INSERT INTO processed_webhook_events (event_id, event_type, processed_at)
         VALUES (?, ?, ?) ON CONFLICT DO NOTHING",
    )
    .bind(event_id)
    .bind(event_type)
    .bind(now_millis())
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Forget an event so a retried notification is processed again
pub async fn forget(pool: &SqlitePool, event_id: &str) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM processed_webhook_events WHERE event_id = ?")
        .bind(event_id)
        .execute(pool)
        .await?;
    Ok(())
}
