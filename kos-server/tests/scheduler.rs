mod common;

use common::TestApp;
use kos_server::scheduler::{LeaseRun, ReminderRun, Scheduler, run_lease_jobs, run_reminder_jobs};
use shared::models::BookingCreate;
use shared::util::today;

#[tokio::test]
async fn test_jobs_on_empty_database() {
    let app = TestApp::new().await;
    assert_eq!(run_lease_jobs(&app.state).await.unwrap(), LeaseRun::default());
    assert_eq!(run_reminder_jobs(&app.state).await.unwrap(), ReminderRun::default());
}

#[tokio::test]
async fn test_fresh_pending_booking_survives_lease_jobs() {
    let app = TestApp::new().await;
    let tenant = app.tenant("budi").await;
    let room_id = app.create_room("A1", 1_000_000.0).await;
    let start = today().succ_opt().unwrap();
    kos_server::services::booking::create_booking(
        app.pool(),
        &tenant,
        &BookingCreate {
            room_id,
            start_date: start.to_string(),
            duration_months: 1,
            notes: None,
        },
        today(),
    )
    .await
    .unwrap();

    let run = run_lease_jobs(&app.state).await.unwrap();
    assert_eq!(run.expired, 0);
}

#[tokio::test]
async fn test_scheduler_starts_and_stops() {
    let app = TestApp::new().await;
    let scheduler = Scheduler::start(app.state.clone());
    tokio::task::yield_now().await;
    scheduler.shutdown().await;
}
