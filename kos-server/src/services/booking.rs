//! Booking lifecycle
//!
//! Every booking status change runs in one transaction with
//! [`sync_room_status`] so the room never disagrees with its bookings.

use chrono::NaiveDate;
use shared::error::{AppError, ErrorCode};
use shared::models::{
    Booking, BookingCreate, BookingDetail, BookingStats, BookingStatus, BookingSummary,
    BookingUpdate, MAX_LEASE_MONTHS, Notification, NotificationKind, Payment, PaymentMethod,
    PaymentStatus, PaymentType, RoomStatus,
};
use shared::money;
use shared::util::parse_date;
use sqlx::{SqliteConnection, SqlitePool};

use super::payment::{PendingPayment, insert_pending_payment};
use super::room::sync_room_status;
use crate::auth::CurrentUser;
use crate::db;
use crate::error::{ServiceError, ServiceResult};
use crate::state::AppState;
use crate::uploads::UploadedFile;

/// Pending bookings older than this are cancelled by the scheduler
pub const PENDING_EXPIRY_MILLIS: i64 = 7 * 24 * 60 * 60 * 1000;

fn check_duration(months: i64) -> ServiceResult<()> {
    if !(1..=MAX_LEASE_MONTHS).contains(&months) {
        return Err(AppError::with_message(
            ErrorCode::InvalidDuration,
            format!("Duration must be between 1 and {MAX_LEASE_MONTHS} months"),
        )
        .into());
    }
    Ok(())
}

/// Inserts a Pending booking after checking every booking rule.
/// Runs inside the caller's transaction.
async fn insert_booking(
    conn: &mut SqliteConnection,
    user_id: i64,
    data: &BookingCreate,
    today: NaiveDate,
) -> ServiceResult<Booking> {
    let start_date = parse_date(&data.start_date).ok_or_else(|| {
        AppError::with_message(ErrorCode::InvalidDate, "Start date must be YYYY-MM-DD")
    })?;
    if start_date < today {
        return Err(AppError::with_message(ErrorCode::InvalidDate, "Start date is in the past").into());
    }
    check_duration(data.duration_months)?;

    let pending = db::bookings::find_by_user_and_status(conn, user_id, &[BookingStatus::Pending]).await?;
    if !pending.is_empty() {
        return Err(AppError::new(ErrorCode::BookingPending).into());
    }

    let leases = db::bookings::find_by_user_and_status(
        conn,
        user_id,
        &[BookingStatus::Confirmed, BookingStatus::Active],
    )
    .await?;
    if let Some(end) = leases.iter().map(Booking::end_date).filter(|end| *end > today).max() {
        return Err(AppError::lease_still_active(end).into());
    }

    let room = db::rooms::find_by_id(conn, data.room_id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::RoomNotFound))?;
    if room.status != RoomStatus::Available {
        return Err(AppError::room_not_available(&room.name, room.status.as_str()).into());
    }

    let notes = data.notes.as_deref().map(str::trim).filter(|n| !n.is_empty());
    let id = db::bookings::create(
        conn,
        &db::bookings::NewBooking {
            user_id,
            room_id: room.id,
            start_date,
            duration_months: data.duration_months,
            monthly_rent: room.price,
            notes,
        },
    )
    .await?;

    db::tenants::promote_to_tenant(conn, user_id).await?;
    sync_room_status(conn, room.id).await?;

    let booking = db::bookings::find_by_id(conn, id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::BookingNotFound))?;
    Ok(booking)
}

pub async fn create_booking(
    pool: &SqlitePool,
    user: &CurrentUser,
    data: &BookingCreate,
    today: NaiveDate,
) -> ServiceResult<Booking> {
    let mut tx = pool.begin().await?;
    let booking = insert_booking(&mut tx, user.id, data, today).await?;
    tx.commit().await?;

    tracing::info!(booking_id = booking.id, user_id = user.id, room_id = booking.room_id, "Booking created");
    Ok(booking)
}

/// Booking plus its first payment, with a transfer proof attached
pub async fn create_booking_with_proof(
    state: &AppState,
    user: &CurrentUser,
    data: &BookingCreate,
    payment_type: PaymentType,
    method: PaymentMethod,
    proof: &UploadedFile,
    today: NaiveDate,
) -> ServiceResult<(Booking, Payment)> {
    let mut tx = state.pool().begin().await?;
    let booking = insert_booking(&mut tx, user.id, data, today).await?;

    // Stored only after the booking rules pass; removed again if the insert fails
    let proof_url = state
        .uploads
        .save_image("payments", &proof.data, &proof.filename)
        .await?;
    let result = async {
        let payment = insert_pending_payment(
            &mut tx,
            &booking,
            PendingPayment {
                payment_type,
                extend_months: 0,
                method,
                proof_url: Some(&proof_url),
            },
            today,
        )
        .await?;
        tx.commit().await?;
        Ok::<_, ServiceError>(payment)
    }
    .await;
    let payment = match result {
        Ok(payment) => payment,
        Err(e) => {
            state.uploads.remove(&proof_url).await;
            return Err(e);
        }
    };

    tracing::info!(
        booking_id = booking.id,
        payment_id = payment.id,
        payment_type = ?payment_type,
        "Booking created with payment proof"
    );
    Ok((booking, payment))
}

async fn build_detail(pool: &SqlitePool, mut booking: Booking) -> ServiceResult<BookingDetail> {
    let payments = db::payments::list_for_booking(pool, booking.id).await?;
    let room = {
        let mut conn = pool.acquire().await?;
        db::rooms::find_by_id(&mut conn, booking.room_id)
            .await?
            .ok_or_else(|| AppError::new(ErrorCode::RoomNotFound))?
    };

    booking.total_paid = money::sum(
        payments
            .iter()
            .filter(|p| p.status == PaymentStatus::Confirmed)
            .map(|p| p.amount),
    );
    Ok(BookingDetail {
        end_date: booking.end_date(),
        last_payment_status: payments.first().map(|p| p.status),
        booking,
        room,
        payments,
    })
}

/// The tenant's own bookings, newest first
pub async fn list_user_bookings(pool: &SqlitePool, user_id: i64) -> ServiceResult<Vec<BookingDetail>> {
    let bookings = db::bookings::list_for_user(pool, user_id).await?;
    let mut details = Vec::with_capacity(bookings.len());
    for booking in bookings {
        details.push(build_detail(pool, booking).await?);
    }
    Ok(details)
}

pub async fn list_bookings(
    pool: &SqlitePool,
    status: Option<BookingStatus>,
    user_id: Option<i64>,
) -> ServiceResult<Vec<BookingSummary>> {
    Ok(db::bookings::list_summaries(pool, status, user_id).await?)
}

pub async fn get_booking(pool: &SqlitePool, user: &CurrentUser, id: i64) -> ServiceResult<BookingDetail> {
    let booking = {
        let mut conn = pool.acquire().await?;
        db::bookings::find_by_id(&mut conn, id)
            .await?
            .ok_or_else(|| AppError::new(ErrorCode::BookingNotFound))?
    };
    if !user.can_access(booking.user_id) {
        return Err(AppError::new(ErrorCode::NotResourceOwner).into());
    }
    build_detail(pool, booking).await
}

/// Admin edit of notes and/or status
pub async fn update_booking(pool: &SqlitePool, id: i64, data: &BookingUpdate) -> ServiceResult<Booking> {
    let mut tx = pool.begin().await?;
    let booking = db::bookings::find_by_id(&mut tx, id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::BookingNotFound))?;

    if let Some(next) = data.status
        && next != booking.status
    {
        if !booking.status.can_transition_to(next) {
            return Err(AppError::with_message(
                ErrorCode::InvalidBookingTransition,
                format!("Cannot move booking from {} to {}", booking.status.as_str(), next.as_str()),
            )
            .into());
        }
        db::bookings::set_status(&mut tx, id, next).await?;
        match next {
            BookingStatus::Cancelled => {
                db::payments::delete_pending_for_booking(&mut tx, id).await?;
            }
            BookingStatus::Confirmed => {
                db::tenants::promote_to_tenant(&mut tx, booking.user_id).await?;
            }
            _ => {}
        }
        sync_room_status(&mut tx, booking.room_id).await?;
        tracing::info!(booking_id = id, from = booking.status.as_str(), to = next.as_str(), "Booking status changed");
    }

    if let Some(notes) = &data.notes {
        db::bookings::set_notes(&mut tx, id, notes.trim()).await?;
    }

    let updated = db::bookings::find_by_id(&mut tx, id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::BookingNotFound))?;
    tx.commit().await?;
    Ok(updated)
}

/// Tenant (or admin) cancellation. No refund is issued.
pub async fn cancel_booking(state: &AppState, user: &CurrentUser, id: i64) -> ServiceResult<Booking> {
    let mut tx = state.pool().begin().await?;
    let booking = db::bookings::find_by_id(&mut tx, id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::BookingNotFound))?;
    if !user.can_access(booking.user_id) {
        return Err(AppError::new(ErrorCode::NotResourceOwner).into());
    }
    if !booking.status.is_open() {
        return Err(AppError::new(ErrorCode::BookingClosed).into());
    }

    db::bookings::set_status(&mut tx, id, BookingStatus::Cancelled).await?;
    let removed = db::payments::delete_pending_for_booking(&mut tx, id).await?;
    sync_room_status(&mut tx, booking.room_id).await?;
    let cancelled = db::bookings::find_by_id(&mut tx, id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::BookingNotFound))?;
    tx.commit().await?;

    tracing::info!(booking_id = id, cancelled_by = user.id, removed_payments = removed, "Booking cancelled");
    state.notifier.send_to_user(
        booking.user_id,
        Notification::new(
            NotificationKind::BookingCancelled,
            "Booking cancelled",
            format!("Booking #{id} has been cancelled"),
        )
        .with_data(serde_json::json!({ "booking_id": id })),
    );
    Ok(cancelled)
}

/// Request more months. The lease end only moves once the resulting
/// payment is confirmed.
pub async fn extend_booking(
    state: &AppState,
    user: &CurrentUser,
    id: i64,
    months: i64,
    today: NaiveDate,
) -> ServiceResult<Payment> {
    check_duration(months)?;

    let mut tx = state.pool().begin().await?;
    let booking = db::bookings::find_by_id(&mut tx, id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::BookingNotFound))?;
    if !user.can_access(booking.user_id) {
        return Err(AppError::new(ErrorCode::NotResourceOwner).into());
    }
    if !booking.status.is_active_lease() {
        return Err(AppError::new(ErrorCode::BookingNotExtendable).into());
    }

    let payment = insert_pending_payment(
        &mut tx,
        &booking,
        PendingPayment {
            payment_type: PaymentType::Extend,
            extend_months: months,
            method: PaymentMethod::Manual,
            proof_url: None,
        },
        today,
    )
    .await?;
    tx.commit().await?;

    tracing::info!(booking_id = id, payment_id = payment.id, months, "Booking extension requested");
    state.notifier.send_to_user(
        booking.user_id,
        Notification::new(
            NotificationKind::BookingExtended,
            "Extension requested",
            format!("Pay Rp {:.0} to extend your lease by {months} month(s)", payment.amount),
        )
        .with_data(serde_json::json!({ "booking_id": id, "payment_id": payment.id })),
    );
    Ok(payment)
}

/// Cancel Pending bookings created before `now - 7 days`
pub async fn auto_cancel_expired(pool: &SqlitePool, now: i64) -> ServiceResult<usize> {
    let stale = db::bookings::stale_pending(pool, now - PENDING_EXPIRY_MILLIS).await?;
    let mut cancelled = 0;
    for booking in stale {
        let mut tx = pool.begin().await?;
        let Some(current) = db::bookings::find_by_id(&mut tx, booking.id).await? else {
            continue;
        };
        if current.status != BookingStatus::Pending {
            continue;
        }
        db::bookings::set_status(&mut tx, booking.id, BookingStatus::Cancelled).await?;
        db::payments::delete_pending_for_booking(&mut tx, booking.id).await?;
        sync_room_status(&mut tx, booking.room_id).await?;
        tx.commit().await?;

        tracing::info!(booking_id = booking.id, "Expired pending booking cancelled");
        cancelled += 1;
    }
    Ok(cancelled)
}

/// Confirmed → Active on the start date, Confirmed/Active → Completed at the
/// end date. Returns `(activated, completed)`.
pub async fn advance_lifecycle(pool: &SqlitePool, today: NaiveDate) -> ServiceResult<(usize, usize)> {
    let bookings =
        db::bookings::find_by_status(pool, &[BookingStatus::Confirmed, BookingStatus::Active]).await?;

    let (mut activated, mut completed) = (0, 0);
    for booking in bookings {
        let next = if booking.end_date() <= today {
            BookingStatus::Completed
        } else if booking.status == BookingStatus::Confirmed && booking.start_date <= today {
            BookingStatus::Active
        } else {
            continue;
        };

        let mut tx = pool.begin().await?;
        db::bookings::set_status(&mut tx, booking.id, next).await?;
        sync_room_status(&mut tx, booking.room_id).await?;
        tx.commit().await?;

        if next == BookingStatus::Completed {
            completed += 1;
        } else {
            activated += 1;
        }
    }
    Ok((activated, completed))
}

pub async fn booking_stats(pool: &SqlitePool) -> ServiceResult<BookingStats> {
    let (total_revenue, _) = db::payments::totals_by_status(pool, PaymentStatus::Confirmed).await?;
    Ok(BookingStats {
        total_bookings: db::bookings::count_all(pool).await?,
        total_revenue,
        active_bookings: db::bookings::count_active(pool).await?,
        occupied_rooms: db::rooms::count_by_status(pool, RoomStatus::Occupied).await?,
    })
}
