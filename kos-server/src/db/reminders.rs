//! Payment reminders

use chrono::NaiveDate;
use shared::models::{PaymentReminder, ReminderDetail, ReminderStatus};
use shared::util::now_millis;
use sqlx::{SqliteConnection, SqlitePool};

const DETAIL_SELECT: &str = "SELECT pr.*, b.id AS booking_id, r.name AS room_name, b.user_id
     FROM payment_reminders pr
     JOIN payments pm ON pm.id = pr.payment_id
     JOIN bookings b ON b.id = pm.booking_id
     JOIN rooms r ON r.id = b.room_id";

pub async fn create(
    conn: &mut SqliteConnection,
    payment_id: i64,
    amount: f64,
    due_date: NaiveDate,
) -> Result<i64, sqlx::Error> {
    let result = sqlx::query(
        "INSERT INTO payment_reminders (payment_id, amount, due_date, status, is_sent, created_at)
         VALUES (?, ?, ?, 'Pending', 0, ?)",
    )
    .bind(payment_id)
    .bind(amount)
    .bind(due_date)
    .bind(now_millis())
    .execute(conn)
    .await?;
    Ok(result.last_insert_rowid())
}

pub async fn list_for_payment(pool: &SqlitePool, payment_id: i64) -> Result<Vec<PaymentReminder>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM payment_reminders WHERE payment_id = ? ORDER BY due_date, id")
        .bind(payment_id)
        .fetch_all(pool)
        .await
}

/// A user's reminders, earliest due first
pub async fn list_for_user(pool: &SqlitePool, user_id: i64) -> Result<Vec<ReminderDetail>, sqlx::Error> {
    sqlx::query_as(&format!(
        "{DETAIL_SELECT} WHERE b.user_id = ? ORDER BY pr.due_date ASC, pr.id ASC"
    ))
    .bind(user_id)
    .fetch_all(pool)
    .await
}

/// Pending, not yet sent, due on or before `today`
pub async fn due_unsent(pool: &SqlitePool, today: NaiveDate) -> Result<Vec<ReminderDetail>, sqlx::Error> {
    sqlx::query_as(&format!(
        "{DETAIL_SELECT} WHERE pr.status = 'Pending' AND pr.is_sent = 0 AND pr.due_date <= ?
         ORDER BY pr.due_date, pr.id"
    ))
    .bind(today)
    .fetch_all(pool)
    .await
}

pub async fn mark_sent(pool: &SqlitePool, id: i64) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE payment_reminders SET is_sent = 1 WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Pending reminders of a payment become Paid
pub async fn mark_paid(conn: &mut SqliteConnection, payment_id: i64) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE payment_reminders SET status = 'Paid' WHERE payment_id = ? AND status = 'Pending'",
    )
    .bind(payment_id)
    .execute(conn)
    .await?;
    Ok(result.rows_affected())
}

/// Pending reminders of every payment of a booking become Paid
pub async fn mark_paid_for_booking(conn: &mut SqliteConnection, booking_id: i64) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE payment_reminders SET status = 'Paid'
         WHERE status = 'Pending'
           AND payment_id IN (SELECT id FROM payments WHERE booking_id = ?)",
    )
    .bind(booking_id)
    .execute(conn)
    .await?;
    Ok(result.rows_affected())
}

/// Pending reminders whose payment failed or whose booking was cancelled
pub async fn expire_orphaned(pool: &SqlitePool) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE payment_reminders SET status = 'Expired'
         WHERE status = 'Pending' AND payment_id IN (
             SELECT pm.id FROM payments pm
             JOIN bookings b ON b.id = pm.booking_id
             WHERE pm.status IN ('Failed', 'Rejected') OR b.status = 'Cancelled'
         )",
    )
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}

pub async fn count_with_status(pool: &SqlitePool, status: ReminderStatus) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM payment_reminders WHERE status = ?")
        .bind(status)
        .fetch_one(pool)
        .await
}
