//! Installment reminders

use chrono::{Days, Months, NaiveDate};
use shared::models::{Notification, NotificationKind, PaymentStatus};
use shared::money;
use sqlx::SqlitePool;

use crate::db;
use crate::email::templates;
use crate::error::ServiceResult;
use crate::state::AppState;

/// Days between reminder creation and due date
pub const MONTHLY_REMINDER_DUE_DAYS: u64 = 3;

/// One month's rent reminder for each confirmed down payment whose booking
/// is not yet paid in full.
///
/// A payment gets a new reminder once it has no unsent Pending reminder and
/// the new due date falls at least a month after every earlier one. A sent
/// reminder therefore no longer blocks the next month's.
pub async fn create_monthly_reminders(pool: &SqlitePool, today: NaiveDate) -> ServiceResult<usize> {
    let due = today + Days::new(MONTHLY_REMINDER_DUE_DAYS);
    let latest_previous_due = due.checked_sub_months(Months::new(1)).unwrap_or(NaiveDate::MIN);
    let payments = db::payments::down_payments_without_reminder(pool, latest_previous_due).await?;
    let mut created = 0;

    for payment in payments {
        if payment.status != PaymentStatus::Confirmed {
            continue;
        }
        let mut tx = pool.begin().await?;
        let Some(booking) = db::bookings::find_by_id(&mut tx, payment.booking_id).await? else {
            continue;
        };
        if !booking.status.is_active_lease() {
            continue;
        }
        let lease_total = money::rent_total(booking.monthly_rent, booking.duration_months);
        if booking.total_paid >= lease_total || money::money_eq(booking.total_paid, lease_total) {
            continue;
        }

        db::reminders::create(&mut tx, payment.id, booking.monthly_rent, due).await?;
        tx.commit().await?;
        created += 1;
    }
    Ok(created)
}

/// Email and push every Pending, unsent reminder due on or before `today`
pub async fn send_pending_reminders(state: &AppState, today: NaiveDate) -> ServiceResult<usize> {
    let due = db::reminders::due_unsent(state.pool(), today).await?;
    let mut sent = 0;

    for detail in due {
        let reminder = &detail.reminder;
        let due_str = reminder.due_date.to_string();

        if let Some(profile) = db::tenants::find_by_user(state.pool(), detail.user_id).await?
            && let Some(to) = profile.email.as_deref()
        {
            let name = profile.full_name.as_deref().unwrap_or("Penghuni");
            let (subject, html) =
                templates::payment_reminder(name, &detail.room_name, reminder.amount, &due_str);
            if let Err(e) = state.mailer.send(to, &subject, &html).await {
                tracing::warn!(reminder_id = reminder.id, error = %e, "Reminder email failed");
            }
        }

        state.notifier.send_to_user(
            detail.user_id,
            Notification::new(
                NotificationKind::PaymentReminder,
                "Payment due",
                format!("Rp {:.0} for room {} is due on {due_str}", reminder.amount, detail.room_name),
            )
            .with_data(serde_json::json!({
                "reminder_id": reminder.id,
                "payment_id": reminder.payment_id,
                "booking_id": detail.booking_id,
            })),
        );

        mark_sent(state.pool(), reminder.id).await?;
        sent += 1;
    }
    Ok(sent)
}

/// Pending reminders whose booking was cancelled become Expired
pub async fn expire_overdue(pool: &SqlitePool) -> ServiceResult<u64> {
    Ok(db::reminders::expire_orphaned(pool).await?)
}

pub async fn mark_sent(pool: &SqlitePool, reminder_id: i64) -> ServiceResult<()> {
    Ok(db::reminders::mark_sent(pool, reminder_id).await?)
}
