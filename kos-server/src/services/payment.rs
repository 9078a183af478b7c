//! Payments, proofs, confirmation and the Midtrans flow

use chrono::{Days, NaiveDate};
use shared::error::{AppError, ErrorCode};
use shared::models::{
    Booking, BookingStatus, Notification, NotificationKind, Payment, PaymentCreate,
    PaymentMethod, PaymentStatus, PaymentSummary, PaymentType, ReminderDetail, SnapSession,
    lease_end,
};
use shared::money;
use shared::util::now_millis;
use sqlx::{SqliteConnection, SqlitePool};

use super::room::sync_room_status;
use crate::auth::CurrentUser;
use crate::db;
use crate::email::{self, templates};
use crate::error::{ServiceError, ServiceResult};
use crate::midtrans::{self, MidtransNotification, NotificationOutcome};
use crate::state::AppState;
use crate::uploads::UploadedFile;

/// Days until the remainder of a down payment is due
pub const DOWN_PAYMENT_REMAINDER_DAYS: u64 = 30;
/// Days until an extension payment is due
pub const EXTENSION_DUE_DAYS: u64 = 3;

pub(crate) struct PendingPayment<'a> {
    pub payment_type: PaymentType,
    pub extend_months: i64,
    pub method: PaymentMethod,
    pub proof_url: Option<&'a str>,
}

/// Insert a Pending payment for `booking` and the reminder that goes with it.
///
/// - full: whole lease
/// - dp: 30% now, remainder reminder due in 30 days
/// - extend: `monthly_rent * months`, reminder due in 3 days
pub(crate) async fn insert_pending_payment(
    conn: &mut SqliteConnection,
    booking: &Booking,
    pending: PendingPayment<'_>,
    today: NaiveDate,
) -> ServiceResult<Payment> {
    let lease_total = money::rent_total(booking.monthly_rent, booking.duration_months);

    let (amount, down_payment_amount, due_date, reminder) = match pending.payment_type {
        PaymentType::Full => (lease_total, 0.0, None, None),
        PaymentType::DownPayment => {
            let dp = money::down_payment(lease_total);
            let remainder = money::remaining_after_down_payment(lease_total);
            (
                dp,
                dp,
                Some(lease_end(booking.start_date, 1)),
                Some((remainder, today + Days::new(DOWN_PAYMENT_REMAINDER_DAYS))),
            )
        }
        PaymentType::Extend => {
            let amount = money::rent_total(booking.monthly_rent, pending.extend_months);
            (amount, 0.0, None, Some((amount, today + Days::new(EXTENSION_DUE_DAYS))))
        }
    };

    let id = db::payments::create(
        conn,
        &db::payments::NewPayment {
            booking_id: booking.id,
            amount,
            method: pending.method,
            payment_type: pending.payment_type,
            down_payment_amount,
            due_date,
            extend_months: pending.extend_months,
            proof_url: pending.proof_url,
        },
    )
    .await?;

    if let Some((reminder_amount, due)) = reminder {
        db::reminders::create(conn, id, reminder_amount, due).await?;
    }

    let payment = db::payments::find_by_id(conn, id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::PaymentNotFound))?;
    Ok(payment)
}

async fn load_payment(pool: &SqlitePool, id: i64) -> ServiceResult<(Payment, Booking)> {
    let mut conn = pool.acquire().await?;
    let payment = db::payments::find_by_id(&mut conn, id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::PaymentNotFound))?;
    let booking = db::bookings::find_by_id(&mut conn, payment.booking_id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::BookingNotFound))?;
    Ok((payment, booking))
}

pub async fn list_payments(pool: &SqlitePool, status: Option<PaymentStatus>) -> ServiceResult<Vec<PaymentSummary>> {
    Ok(db::payments::list_summaries(pool, status).await?)
}

/// Tenant starts paying for a booking (`full` or `dp`)
pub async fn create_payment_session(
    pool: &SqlitePool,
    user: &CurrentUser,
    data: &PaymentCreate,
    today: NaiveDate,
) -> ServiceResult<Payment> {
    let payment_type: PaymentType = data.payment_type.parse().map_err(|_| {
        AppError::with_message(
            ErrorCode::InvalidPaymentType,
            format!("Payment type must be full or dp, got '{}'", data.payment_type),
        )
    })?;

    let mut tx = pool.begin().await?;
    let booking = db::bookings::find_by_id(&mut tx, data.booking_id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::BookingNotFound))?;
    if !user.can_access(booking.user_id) {
        return Err(AppError::new(ErrorCode::NotResourceOwner).into());
    }
    if !booking.status.is_open() {
        return Err(AppError::new(ErrorCode::BookingClosed).into());
    }

    let payment = insert_pending_payment(
        &mut tx,
        &booking,
        PendingPayment {
            payment_type,
            extend_months: 0,
            method: PaymentMethod::Manual,
            proof_url: None,
        },
        today,
    )
    .await?;
    tx.commit().await?;

    tracing::info!(payment_id = payment.id, booking_id = booking.id, amount = payment.amount, "Payment created");
    Ok(payment)
}

/// Attach a transfer receipt to a Pending payment
pub async fn upload_proof(
    state: &AppState,
    user: &CurrentUser,
    payment_id: i64,
    file: &UploadedFile,
) -> ServiceResult<Payment> {
    let (payment, booking) = load_payment(state.pool(), payment_id).await?;
    if !user.can_access(booking.user_id) {
        return Err(AppError::new(ErrorCode::NotResourceOwner).into());
    }
    if payment.status != PaymentStatus::Pending {
        return Err(AppError::new(ErrorCode::PaymentNotPending).into());
    }

    let url = state.uploads.save_image("payments", &file.data, &file.filename).await?;

    let mut conn = state.pool().acquire().await?;
    db::payments::set_proof(&mut conn, payment_id, &url).await?;
    let updated = db::payments::find_by_id(&mut conn, payment_id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::PaymentNotFound))?;

    tracing::info!(payment_id, "Payment proof uploaded");
    Ok(updated)
}

/// A payment confirmed inside a transaction, for the post-commit side effects
struct ConfirmedPayment {
    payment: Payment,
    booking: Booking,
    room_name: String,
}

/// Pending payment of an open booking
async fn load_confirmable(conn: &mut SqliteConnection, payment_id: i64) -> ServiceResult<(Payment, Booking)> {
    let payment = db::payments::find_by_id(conn, payment_id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::PaymentNotFound))?;
    match payment.status {
        PaymentStatus::Pending => {}
        PaymentStatus::Confirmed => return Err(AppError::new(ErrorCode::PaymentAlreadyConfirmed).into()),
        _ => return Err(AppError::new(ErrorCode::PaymentNotPending).into()),
    }

    let booking = db::bookings::find_by_id(conn, payment.booking_id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::BookingNotFound))?;
    if !booking.status.is_open() {
        return Err(AppError::new(ErrorCode::BookingClosed).into());
    }
    Ok((payment, booking))
}

/// Confirm and apply to the booking: status, extension months, paid total,
/// room status, profile level and reminders.
///
/// Reminders of a full or extension payment are settled with it. A down
/// payment's remainder reminder stays open until the lease is paid in full.
async fn confirm_in_tx(conn: &mut SqliteConnection, payment_id: i64) -> ServiceResult<ConfirmedPayment> {
    let (payment, booking) = load_confirmable(conn, payment_id).await?;

    if !db::payments::confirm(conn, payment_id, now_millis()).await? {
        return Err(AppError::new(ErrorCode::PaymentAlreadyConfirmed).into());
    }
    if booking.status == BookingStatus::Pending {
        db::bookings::set_status(conn, booking.id, BookingStatus::Confirmed).await?;
    }
    let mut duration = booking.duration_months;
    if payment.payment_type == PaymentType::Extend && payment.extend_months > 0 {
        db::bookings::add_months(conn, booking.id, payment.extend_months).await?;
        duration += payment.extend_months;
    }
    let total_paid = money::sum(db::payments::confirmed_amounts(conn, booking.id).await?);
    db::bookings::set_total_paid(conn, booking.id, total_paid).await?;
    sync_room_status(conn, booking.room_id).await?;
    db::tenants::promote_to_tenant(conn, booking.user_id).await?;

    let lease_total = money::rent_total(booking.monthly_rent, duration);
    if total_paid >= lease_total || money::money_eq(total_paid, lease_total) {
        db::reminders::mark_paid_for_booking(conn, booking.id).await?;
    } else if payment.payment_type != PaymentType::DownPayment {
        db::reminders::mark_paid(conn, payment_id).await?;
    }

    let room_name = db::rooms::find_by_id(conn, booking.room_id)
        .await?
        .map(|r| r.name)
        .unwrap_or_default();
    let payment = db::payments::find_by_id(conn, payment_id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::PaymentNotFound))?;
    Ok(ConfirmedPayment {
        payment,
        booking,
        room_name,
    })
}

/// Email and realtime notification, after the commit
async fn announce_confirmed(state: &AppState, confirmed: &ConfirmedPayment) -> ServiceResult<()> {
    let ConfirmedPayment {
        payment,
        booking,
        room_name,
    } = confirmed;
    tracing::info!(payment_id = payment.id, booking_id = booking.id, amount = payment.amount, "Payment confirmed");

    if let Some(profile) = db::tenants::find_by_user(state.pool(), booking.user_id).await?
        && let Some(to) = profile.email
    {
        let name = profile.full_name.as_deref().unwrap_or("Penghuni");
        let (subject, html) = templates::payment_confirmed(name, room_name, payment.amount);
        email::send_in_background(state.mailer.clone(), to, subject, html);
    }
    state.notifier.send_to_user(
        booking.user_id,
        Notification::new(
            NotificationKind::PaymentConfirmed,
            "Payment confirmed",
            format!("Your payment of Rp {:.0} for room {room_name} was confirmed", payment.amount),
        )
        .with_data(serde_json::json!({ "payment_id": payment.id, "booking_id": booking.id })),
    );
    Ok(())
}

/// Confirm a payment and apply it to its booking
pub async fn confirm_payment(state: &AppState, payment_id: i64) -> ServiceResult<Payment> {
    let mut tx = state.pool().begin().await?;
    let confirmed = confirm_in_tx(&mut tx, payment_id).await?;
    tx.commit().await?;

    announce_confirmed(state, &confirmed).await?;
    Ok(confirmed.payment)
}

pub async fn reject_payment(state: &AppState, payment_id: i64) -> ServiceResult<Payment> {
    let (_, booking) = load_payment(state.pool(), payment_id).await?;

    let mut conn = state.pool().acquire().await?;
    if !db::payments::close_pending(&mut conn, payment_id, PaymentStatus::Rejected).await? {
        return Err(AppError::new(ErrorCode::PaymentNotPending).into());
    }
    let updated = db::payments::find_by_id(&mut conn, payment_id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::PaymentNotFound))?;
    drop(conn);

    tracing::info!(payment_id, "Payment rejected");
    state.notifier.send_to_user(
        booking.user_id,
        Notification::new(
            NotificationKind::PaymentRejected,
            "Payment rejected",
            "Your payment proof was rejected, please upload a new one",
        )
        .with_data(serde_json::json!({ "payment_id": payment_id })),
    );
    Ok(updated)
}

/// Admin received cash at the front desk.
///
/// Method, proof and confirmation commit together; a stored proof is
/// removed again when the confirmation fails.
pub async fn confirm_cash_payment(
    state: &AppState,
    payment_id: i64,
    proof: Option<&UploadedFile>,
) -> ServiceResult<Payment> {
    let mut tx = state.pool().begin().await?;
    load_confirmable(&mut tx, payment_id).await?;

    let proof_url = match proof {
        Some(file) => Some(state.uploads.save_image("payments", &file.data, &file.filename).await?),
        None => None,
    };

    let result = async {
        db::payments::set_method(&mut tx, payment_id, PaymentMethod::Cash).await?;
        if let Some(url) = &proof_url {
            db::payments::set_proof(&mut tx, payment_id, url).await?;
        }
        let confirmed = confirm_in_tx(&mut tx, payment_id).await?;
        tx.commit().await?;
        Ok::<_, ServiceError>(confirmed)
    }
    .await;

    let confirmed = match result {
        Ok(confirmed) => confirmed,
        Err(e) => {
            if let Some(url) = &proof_url {
                state.uploads.remove(url).await;
            }
            return Err(e);
        }
    };
    announce_confirmed(state, &confirmed).await?;
    Ok(confirmed.payment)
}

pub async fn list_reminders(pool: &SqlitePool, user_id: i64) -> ServiceResult<Vec<ReminderDetail>> {
    Ok(db::reminders::list_for_user(pool, user_id).await?)
}

/// Open a Midtrans Snap session for a Pending payment
pub async fn create_snap(state: &AppState, user: &CurrentUser, payment_id: i64) -> ServiceResult<SnapSession> {
    let Some(gateway) = &state.midtrans else {
        return Err(AppError::with_message(ErrorCode::FeatureDisabled, "Online payment is not configured").into());
    };

    let (payment, booking) = load_payment(state.pool(), payment_id).await?;
    if !user.can_access(booking.user_id) {
        return Err(AppError::new(ErrorCode::NotResourceOwner).into());
    }
    if payment.status != PaymentStatus::Pending {
        return Err(AppError::new(ErrorCode::PaymentNotPending).into());
    }

    let profile = db::tenants::find_by_user(state.pool(), booking.user_id).await?;
    let name = profile
        .as_ref()
        .and_then(|p| p.full_name.clone())
        .unwrap_or_else(|| user.username.clone());
    let email = profile.and_then(|p| p.email);
    let order_id = midtrans::order_id(payment_id, now_millis());
    let gross_amount = payment.amount.round() as i64;

    let snap = gateway
        .create_transaction(
            &order_id,
            gross_amount,
            &name,
            email.as_deref(),
            &format!("Sewa kamar booking #{}", booking.id),
        )
        .await
        .map_err(|e| {
            tracing::error!(payment_id, error = %e, "Midtrans transaction failed");
            AppError::with_message(ErrorCode::PaymentGatewayError, e.to_string())
        })?;

    db::payments::set_snap(state.pool(), payment_id, &order_id, &snap.token).await?;
    {
        let mut conn = state.pool().acquire().await?;
        db::payments::set_method(&mut conn, payment_id, PaymentMethod::Midtrans).await?;
    }

    tracing::info!(payment_id, order_id = %order_id, "Snap session created");
    Ok(SnapSession {
        payment_id,
        order_id,
        token: snap.token,
        redirect_url: snap.redirect_url,
    })
}

/// Midtrans HTTP notification. Replays of the same
/// `(order_id, transaction_status)` are acknowledged without effect.
pub async fn handle_notification(state: &AppState, notification: &MidtransNotification) -> ServiceResult<()> {
    let Some(gateway) = &state.midtrans else {
        return Err(AppError::with_message(ErrorCode::FeatureDisabled, "Online payment is not configured").into());
    };
    if !gateway.verify(notification) {
        tracing::warn!(order_id = %notification.order_id, "Midtrans signature mismatch");
        return Err(AppError::new(ErrorCode::InvalidSignature).into());
    }

    let event_id = format!("{}:{}", notification.order_id, notification.transaction_status);
    if !db::webhook_events::record(state.pool(), &event_id, &notification.transaction_status).await? {
        tracing::info!(event_id = %event_id, "Duplicate Midtrans notification, skipping");
        return Ok(());
    }

    let result = apply_notification(state, notification).await;
    if result.is_err() {
        // Allow Midtrans to retry this event
        db::webhook_events::forget(state.pool(), &event_id).await?;
    }
    result
}

async fn apply_notification(state: &AppState, notification: &MidtransNotification) -> ServiceResult<()> {
    let payment = match db::payments::find_by_order_id(state.pool(), &notification.order_id).await? {
        Some(p) => p,
        None => {
            let id = midtrans::parse_order_id(&notification.order_id)
                .ok_or_else(|| AppError::new(ErrorCode::PaymentNotFound))?;
            load_payment(state.pool(), id).await?.0
        }
    };

    match notification.outcome() {
        NotificationOutcome::Paid => match confirm_payment(state, payment.id).await {
            Ok(_) => {}
            Err(e) if is_code(&e, ErrorCode::PaymentAlreadyConfirmed) => {
                tracing::info!(payment_id = payment.id, "Payment already confirmed");
            }
            Err(e) => return Err(e),
        },
        NotificationOutcome::Failed => {
            let mut conn = state.pool().acquire().await?;
            if db::payments::close_pending(&mut conn, payment.id, PaymentStatus::Failed).await? {
                tracing::info!(payment_id = payment.id, status = %notification.transaction_status, "Payment failed");
            }
        }
        NotificationOutcome::Ignored => {
            tracing::debug!(
                payment_id = payment.id,
                status = %notification.transaction_status,
                "Midtrans notification ignored"
            );
        }
    }
    Ok(())
}

fn is_code(err: &ServiceError, code: ErrorCode) -> bool {
    matches!(err, ServiceError::App(e) if e.code == code)
}
