mod common;

use common::{TestApp, date, days_after, receipt, today};
use kos_server::ServiceError;
use kos_server::db;
use kos_server::services::{booking, payment, profile, reminder, room};
use shared::error::ErrorCode;
use shared::models::{
    BookingCreate, BookingStatus, PaymentCreate, PaymentMethod, PaymentStatus, PaymentType, ProfileLevel,
    ReminderStatus, RoomStatus,
};
use shared::util::now_millis;

const PRICE: f64 = 1_500_000.0;

fn code<T: std::fmt::Debug>(result: Result<T, ServiceError>) -> ErrorCode {
    match result {
        Err(ServiceError::App(e)) => e.code,
        other => panic!("expected an app error, got {other:?}"),
    }
}

fn booking_request(room_id: i64, start: &str, months: i64) -> BookingCreate {
    BookingCreate {
        room_id,
        start_date: start.to_string(),
        duration_months: months,
        notes: Some("  Datang sore hari ".to_string()),
    }
}

fn payment_request(booking_id: i64, payment_type: &str) -> PaymentCreate {
    PaymentCreate {
        booking_id,
        payment_type: payment_type.to_string(),
    }
}

async fn room_status(app: &TestApp, room_id: i64) -> RoomStatus {
    room::get_room(app.pool(), room_id).await.unwrap().room.status
}

#[tokio::test]
async fn test_full_payment_flow_occupies_room() {
    let app = TestApp::new().await;
    let tenant = app.tenant("budi").await;
    let room_id = app.create_room("A1", PRICE).await;

    let created = booking::create_booking(app.pool(), &tenant, &booking_request(room_id, "2030-02-01", 3), today())
        .await
        .unwrap();
    assert_eq!(created.status, BookingStatus::Pending);
    assert_eq!(created.monthly_rent, PRICE);
    assert_eq!(created.notes.as_deref(), Some("Datang sore hari"));
    assert_eq!(room_status(&app, room_id).await, RoomStatus::Reserved);

    let pending = payment::create_payment_session(app.pool(), &tenant, &payment_request(created.id, "full"), today())
        .await
        .unwrap();
    assert_eq!(pending.payment_type, PaymentType::Full);
    assert_eq!(pending.status, PaymentStatus::Pending);
    assert_eq!(pending.amount, 4_500_000.0);

    let confirmed = payment::confirm_payment(&app.state, pending.id).await.unwrap();
    assert_eq!(confirmed.status, PaymentStatus::Confirmed);
    assert!(confirmed.paid_at.is_some());

    let detail = booking::get_booking(app.pool(), &tenant, created.id).await.unwrap();
    assert_eq!(detail.booking.status, BookingStatus::Confirmed);
    assert_eq!(detail.booking.total_paid, 4_500_000.0);
    assert_eq!(detail.end_date, date(2030, 5, 1));
    assert_eq!(detail.last_payment_status, Some(PaymentStatus::Confirmed));
    assert_eq!(detail.room.status, RoomStatus::Occupied);

    let me = profile::get_profile(app.pool(), tenant.id).await.unwrap();
    assert_eq!(me.profile.level, ProfileLevel::Tenant);

    assert_eq!(
        code(payment::confirm_payment(&app.state, pending.id).await),
        ErrorCode::PaymentAlreadyConfirmed
    );
}

#[tokio::test]
async fn test_cancel_releases_room_and_drops_pending_payments() {
    let app = TestApp::new().await;
    let tenant = app.tenant("sari").await;
    let room_id = app.create_room("B2", PRICE).await;

    let created = booking::create_booking(app.pool(), &tenant, &booking_request(room_id, "2030-02-01", 1), today())
        .await
        .unwrap();
    payment::create_payment_session(app.pool(), &tenant, &payment_request(created.id, "dp"), today())
        .await
        .unwrap();

    let cancelled = booking::cancel_booking(&app.state, &tenant, created.id).await.unwrap();
    assert_eq!(cancelled.status, BookingStatus::Cancelled);
    assert_eq!(room_status(&app, room_id).await, RoomStatus::Available);
    assert!(db::payments::list_for_booking(app.pool(), created.id).await.unwrap().is_empty());

    assert_eq!(
        code(booking::cancel_booking(&app.state, &tenant, created.id).await),
        ErrorCode::BookingClosed
    );
    assert_eq!(
        code(payment::create_payment_session(app.pool(), &tenant, &payment_request(created.id, "full"), today()).await),
        ErrorCode::BookingClosed
    );
}

#[tokio::test]
async fn test_booking_rules() {
    let app = TestApp::new().await;
    let budi = app.tenant("budi").await;
    let sari = app.tenant("sari").await;
    let a1 = app.create_room("A1", PRICE).await;
    let a2 = app.create_room("A2", PRICE).await;

    assert_eq!(
        code(booking::create_booking(app.pool(), &budi, &booking_request(a1, "2030-01-09", 1), today()).await),
        ErrorCode::InvalidDate
    );
    assert_eq!(
        code(booking::create_booking(app.pool(), &budi, &booking_request(a1, "09-01-2030", 1), today()).await),
        ErrorCode::InvalidDate
    );
    assert_eq!(
        code(booking::create_booking(app.pool(), &budi, &booking_request(a1, "2030-02-01", 0), today()).await),
        ErrorCode::InvalidDuration
    );
    assert_eq!(
        code(booking::create_booking(app.pool(), &budi, &booking_request(999, "2030-02-01", 1), today()).await),
        ErrorCode::RoomNotFound
    );

    let first = booking::create_booking(app.pool(), &budi, &booking_request(a1, "2030-02-01", 2), today())
        .await
        .unwrap();

    // one pending booking per tenant
    assert_eq!(
        code(booking::create_booking(app.pool(), &budi, &booking_request(a2, "2030-02-01", 1), today()).await),
        ErrorCode::BookingPending
    );
    // reserved room
    assert_eq!(
        code(booking::create_booking(app.pool(), &sari, &booking_request(a1, "2030-02-01", 1), today()).await),
        ErrorCode::RoomNotAvailable
    );
    assert_eq!(
        code(booking::get_booking(app.pool(), &sari, first.id).await),
        ErrorCode::NotResourceOwner
    );

    let pending = payment::create_payment_session(app.pool(), &budi, &payment_request(first.id, "full"), today())
        .await
        .unwrap();
    payment::confirm_payment(&app.state, pending.id).await.unwrap();

    // the lease runs until 2030-04-01
    assert_eq!(
        code(booking::create_booking(app.pool(), &budi, &booking_request(a2, "2030-02-01", 1), today()).await),
        ErrorCode::LeaseStillActive
    );
    assert_eq!(
        code(payment::create_payment_session(app.pool(), &budi, &payment_request(first.id, "extend"), today()).await),
        ErrorCode::InvalidPaymentType
    );
}

#[tokio::test]
async fn test_down_payment_reminders_and_extension() {
    let app = TestApp::new().await;
    let tenant = app.tenant("dewi").await;
    let room_id = app.create_room("C3", 1_000_000.0).await;

    let created = booking::create_booking(app.pool(), &tenant, &booking_request(room_id, "2030-02-01", 6), today())
        .await
        .unwrap();
    let dp = payment::create_payment_session(app.pool(), &tenant, &payment_request(created.id, "dp"), today())
        .await
        .unwrap();
    assert_eq!(dp.payment_type, PaymentType::DownPayment);
    assert_eq!(dp.amount, 1_800_000.0);
    assert_eq!(dp.down_payment_amount, 1_800_000.0);
    assert_eq!(dp.due_date, Some(date(2030, 3, 1)));

    let reminders = payment::list_reminders(app.pool(), tenant.id).await.unwrap();
    assert_eq!(reminders.len(), 1);
    assert_eq!(reminders[0].reminder.amount, 4_200_000.0);
    assert_eq!(reminders[0].reminder.due_date, days_after(today(), 30));
    assert_eq!(reminders[0].room_name, "C3");

    // the remainder is still owed after the down payment
    payment::confirm_payment(&app.state, dp.id).await.unwrap();
    let reminders = payment::list_reminders(app.pool(), tenant.id).await.unwrap();
    assert_eq!(reminders[0].reminder.status, ReminderStatus::Pending);

    // an unsent reminder holds back the monthly one
    assert_eq!(reminder::create_monthly_reminders(app.pool(), today()).await.unwrap(), 0);

    // due reminders are emailed once
    let remainder_due = days_after(today(), 30);
    assert_eq!(reminder::send_pending_reminders(&app.state, remainder_due).await.unwrap(), 1);
    assert_eq!(reminder::send_pending_reminders(&app.state, remainder_due).await.unwrap(), 0);
    let sent = app.mailer.sent().await;
    assert!(sent.iter().any(|m| m.to == "dewi@example.com"));

    // once sent, the next reminder comes a month after the last due date
    assert_eq!(reminder::create_monthly_reminders(app.pool(), date(2030, 2, 15)).await.unwrap(), 0);
    assert_eq!(reminder::create_monthly_reminders(app.pool(), date(2030, 3, 6)).await.unwrap(), 1);
    assert_eq!(reminder::create_monthly_reminders(app.pool(), date(2030, 3, 6)).await.unwrap(), 0);
    let reminders = payment::list_reminders(app.pool(), tenant.id).await.unwrap();
    assert_eq!(reminders.len(), 2);
    let monthly = reminders
        .iter()
        .find(|r| r.reminder.due_date == date(2030, 3, 9))
        .unwrap();
    assert_eq!(monthly.reminder.amount, 1_000_000.0);
    assert_eq!(monthly.reminder.status, ReminderStatus::Pending);
    assert!(!monthly.reminder.is_sent);

    assert_eq!(reminder::send_pending_reminders(&app.state, date(2030, 3, 9)).await.unwrap(), 1);
    assert_eq!(reminder::create_monthly_reminders(app.pool(), date(2030, 4, 6)).await.unwrap(), 1);

    let extension = booking::extend_booking(&app.state, &tenant, created.id, 2, today())
        .await
        .unwrap();
    assert_eq!(extension.payment_type, PaymentType::Extend);
    assert_eq!(extension.extend_months, 2);
    assert_eq!(extension.amount, 2_000_000.0);

    // the lease only grows once the extension is paid
    let detail = booking::get_booking(app.pool(), &tenant, created.id).await.unwrap();
    assert_eq!(detail.booking.duration_months, 6);

    payment::confirm_payment(&app.state, extension.id).await.unwrap();
    let detail = booking::get_booking(app.pool(), &tenant, created.id).await.unwrap();
    assert_eq!(detail.booking.duration_months, 8);
    assert_eq!(detail.booking.total_paid, 3_800_000.0);
    assert_eq!(detail.end_date, date(2030, 10, 1));

    // the extension's own reminder is settled, the rent reminders are not
    let reminders = payment::list_reminders(app.pool(), tenant.id).await.unwrap();
    let statuses: Vec<_> = reminders
        .iter()
        .map(|r| (r.reminder.payment_id, r.reminder.status))
        .collect();
    assert!(statuses.contains(&(extension.id, ReminderStatus::Paid)));
    assert_eq!(
        statuses
            .iter()
            .filter(|(id, status)| *id == dp.id && *status == ReminderStatus::Pending)
            .count(),
        3
    );
}

#[tokio::test]
async fn test_paying_the_lease_in_full_settles_reminders() {
    let app = TestApp::new().await;
    let tenant = app.tenant("wulan").await;
    let room_id = app.create_room("C4", 1_000_000.0).await;

    let created = booking::create_booking(app.pool(), &tenant, &booking_request(room_id, "2030-02-01", 2), today())
        .await
        .unwrap();
    let dp = payment::create_payment_session(app.pool(), &tenant, &payment_request(created.id, "dp"), today())
        .await
        .unwrap();
    assert_eq!(dp.amount, 600_000.0);
    payment::confirm_payment(&app.state, dp.id).await.unwrap();

    let reminders = payment::list_reminders(app.pool(), tenant.id).await.unwrap();
    assert_eq!(reminders.len(), 1);
    assert_eq!(reminders[0].reminder.amount, 1_400_000.0);
    assert_eq!(reminders[0].reminder.status, ReminderStatus::Pending);

    let rest = payment::create_payment_session(app.pool(), &tenant, &payment_request(created.id, "full"), today())
        .await
        .unwrap();
    payment::confirm_payment(&app.state, rest.id).await.unwrap();

    let reminders = payment::list_reminders(app.pool(), tenant.id).await.unwrap();
    assert!(reminders.iter().all(|r| r.reminder.status == ReminderStatus::Paid));
    assert_eq!(reminder::create_monthly_reminders(app.pool(), date(2030, 3, 6)).await.unwrap(), 0);
}

#[tokio::test]
async fn test_reject_then_confirm_cash() {
    let app = TestApp::new().await;
    let tenant = app.tenant("rina").await;
    let room_id = app.create_room("D4", PRICE).await;

    let created = booking::create_booking(app.pool(), &tenant, &booking_request(room_id, "2030-02-01", 1), today())
        .await
        .unwrap();
    let first = payment::create_payment_session(app.pool(), &tenant, &payment_request(created.id, "full"), today())
        .await
        .unwrap();
    let rejected = payment::reject_payment(&app.state, first.id).await.unwrap();
    assert_eq!(rejected.status, PaymentStatus::Rejected);
    assert_eq!(code(payment::confirm_payment(&app.state, first.id).await), ErrorCode::PaymentNotPending);
    assert_eq!(room_status(&app, room_id).await, RoomStatus::Reserved);

    let second = payment::create_payment_session(app.pool(), &tenant, &payment_request(created.id, "full"), today())
        .await
        .unwrap();
    let cash = payment::confirm_cash_payment(&app.state, second.id, None).await.unwrap();
    assert_eq!(cash.status, PaymentStatus::Confirmed);
    assert_eq!(cash.method, PaymentMethod::Cash);
    assert_eq!(room_status(&app, room_id).await, RoomStatus::Occupied);
}

#[tokio::test]
async fn test_lifecycle_and_expiry() {
    let app = TestApp::new().await;
    let budi = app.tenant("budi").await;
    let sari = app.tenant("sari").await;
    let a1 = app.create_room("A1", PRICE).await;
    let a2 = app.create_room("A2", PRICE).await;

    let leased = booking::create_booking(app.pool(), &budi, &booking_request(a1, "2030-02-01", 1), today())
        .await
        .unwrap();
    let pending = payment::create_payment_session(app.pool(), &budi, &payment_request(leased.id, "full"), today())
        .await
        .unwrap();
    payment::confirm_payment(&app.state, pending.id).await.unwrap();

    assert_eq!(booking::advance_lifecycle(app.pool(), today()).await.unwrap(), (0, 0));
    assert_eq!(booking::advance_lifecycle(app.pool(), date(2030, 2, 1)).await.unwrap(), (1, 0));
    let detail = booking::get_booking(app.pool(), &budi, leased.id).await.unwrap();
    assert_eq!(detail.booking.status, BookingStatus::Active);
    assert_eq!(detail.room.status, RoomStatus::Occupied);

    assert_eq!(booking::advance_lifecycle(app.pool(), date(2030, 3, 1)).await.unwrap(), (0, 1));
    let detail = booking::get_booking(app.pool(), &budi, leased.id).await.unwrap();
    assert_eq!(detail.booking.status, BookingStatus::Completed);
    assert_eq!(detail.room.status, RoomStatus::Available);

    let stale = booking::create_booking(app.pool(), &sari, &booking_request(a2, "2030-02-01", 1), today())
        .await
        .unwrap();
    assert_eq!(booking::auto_cancel_expired(app.pool(), now_millis()).await.unwrap(), 0);
    let later = now_millis() + booking::PENDING_EXPIRY_MILLIS + 1_000;
    assert_eq!(booking::auto_cancel_expired(app.pool(), later).await.unwrap(), 1);
    let detail = booking::get_booking(app.pool(), &sari, stale.id).await.unwrap();
    assert_eq!(detail.booking.status, BookingStatus::Cancelled);
    assert_eq!(room_status(&app, a2).await, RoomStatus::Available);
}

#[tokio::test]
async fn test_admin_status_update_enforces_transitions() {
    let app = TestApp::new().await;
    let tenant = app.tenant("budi").await;
    let room_id = app.create_room("A1", PRICE).await;

    let created = booking::create_booking(app.pool(), &tenant, &booking_request(room_id, "2030-02-01", 1), today())
        .await
        .unwrap();
    let update = |status| shared::models::BookingUpdate {
        status: Some(status),
        notes: None,
    };

    assert_eq!(
        code(booking::update_booking(app.pool(), created.id, &update(BookingStatus::Completed)).await),
        ErrorCode::InvalidBookingTransition
    );
    let confirmed = booking::update_booking(app.pool(), created.id, &update(BookingStatus::Confirmed))
        .await
        .unwrap();
    assert_eq!(confirmed.status, BookingStatus::Confirmed);
    assert_eq!(room_status(&app, room_id).await, RoomStatus::Occupied);

    booking::update_booking(app.pool(), created.id, &update(BookingStatus::Cancelled))
        .await
        .unwrap();
    assert_eq!(room_status(&app, room_id).await, RoomStatus::Available);

    let stats = booking::booking_stats(app.pool()).await.unwrap();
    assert_eq!(stats.total_bookings, 1);
    assert_eq!(stats.active_bookings, 0);
    assert_eq!(stats.occupied_rooms, 0);
}

#[tokio::test]
async fn test_cash_on_closed_booking_changes_nothing() {
    let app = TestApp::new().await;
    let tenant = app.tenant("yanti").await;
    let room_id = app.create_room("D5", PRICE).await;

    let created = booking::create_booking(app.pool(), &tenant, &booking_request(room_id, "2030-02-01", 1), today())
        .await
        .unwrap();
    let full = payment::create_payment_session(app.pool(), &tenant, &payment_request(created.id, "full"), today())
        .await
        .unwrap();
    payment::confirm_payment(&app.state, full.id).await.unwrap();
    let extension = booking::extend_booking(&app.state, &tenant, created.id, 1, today())
        .await
        .unwrap();

    // the lease ends before the extension is paid
    assert_eq!(booking::advance_lifecycle(app.pool(), date(2030, 3, 5)).await.unwrap(), (0, 1));

    let proof = receipt();
    assert_eq!(
        code(payment::confirm_cash_payment(&app.state, extension.id, Some(&proof)).await),
        ErrorCode::BookingClosed
    );

    let detail = booking::get_booking(app.pool(), &tenant, created.id).await.unwrap();
    assert_eq!(detail.booking.status, BookingStatus::Completed);
    assert_eq!(detail.booking.duration_months, 1);
    let untouched = detail.payments.iter().find(|p| p.id == extension.id).unwrap();
    assert_eq!(untouched.status, PaymentStatus::Pending);
    assert_eq!(untouched.method, PaymentMethod::Manual);
    assert_eq!(untouched.proof_url, None);
    assert_eq!(app.stored_files("payments"), 0);
}

#[tokio::test]
async fn test_rejected_booking_with_proof_stores_no_file() {
    let app = TestApp::new().await;
    let tenant = app.tenant("agus").await;
    let first_room = app.create_room("E1", PRICE).await;
    let second_room = app.create_room("E2", PRICE).await;

    booking::create_booking(app.pool(), &tenant, &booking_request(first_room, "2030-02-01", 3), today())
        .await
        .unwrap();

    let proof = receipt();
    assert_eq!(
        code(
            booking::create_booking_with_proof(
                &app.state,
                &tenant,
                &booking_request(second_room, "2030-02-01", 3),
                PaymentType::Full,
                PaymentMethod::Manual,
                &proof,
                today(),
            )
            .await
        ),
        ErrorCode::BookingPending
    );
    assert_eq!(app.stored_files("payments"), 0);
    assert_eq!(room_status(&app, second_room).await, RoomStatus::Available);
}

#[tokio::test]
async fn test_booking_with_proof_keeps_the_receipt() {
    let app = TestApp::new().await;
    let tenant = app.tenant("tono").await;
    let room_id = app.create_room("E3", PRICE).await;

    let (created, pending) = booking::create_booking_with_proof(
        &app.state,
        &tenant,
        &booking_request(room_id, "2030-02-01", 2),
        PaymentType::DownPayment,
        PaymentMethod::Manual,
        &receipt(),
        today(),
    )
    .await
    .unwrap();
    assert_eq!(created.status, BookingStatus::Pending);
    assert_eq!(pending.payment_type, PaymentType::DownPayment);
    assert!(pending.proof_url.as_deref().is_some_and(|url| url.ends_with(".png")));
    assert_eq!(app.stored_files("payments"), 1);
}
