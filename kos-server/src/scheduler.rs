//! Periodic background jobs
//!
//! - lease: every hour, cancel stale Pending bookings and move leases
//!   through Confirmed -> Active -> Completed
//! - reminders: every six hours, create monthly installment reminders,
//!   deliver the due ones and expire orphans
//! - housekeeping: every five minutes, drop stale rate limit windows and
//!   notification channels nobody listens on
//!
//! A failing run is logged and the loop waits for the next tick.

use std::panic::AssertUnwindSafe;
use std::time::Duration;

use futures::FutureExt;
use shared::util::{now_millis, today};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::error::ServiceResult;
use crate::services::{booking, reminder};
use crate::state::AppState;

const LEASE_INTERVAL: Duration = Duration::from_secs(60 * 60);
const REMINDER_INTERVAL: Duration = Duration::from_secs(6 * 60 * 60);
const HOUSEKEEPING_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// Outcome of one lease pass
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LeaseRun {
    pub expired: usize,
    pub activated: usize,
    pub completed: usize,
}

/// Outcome of one reminder pass
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReminderRun {
    pub created: usize,
    pub sent: usize,
    pub expired: u64,
}

pub async fn run_lease_jobs(state: &AppState) -> ServiceResult<LeaseRun> {
    let expired = booking::auto_cancel_expired(state.pool(), now_millis()).await?;
    let (activated, completed) = booking::advance_lifecycle(state.pool(), today()).await?;
    Ok(LeaseRun {
        expired,
        activated,
        completed,
    })
}

pub async fn run_reminder_jobs(state: &AppState) -> ServiceResult<ReminderRun> {
    let today = today();
    let created = reminder::create_monthly_reminders(state.pool(), today).await?;
    let sent = reminder::send_pending_reminders(state, today).await?;
    let expired = reminder::expire_overdue(state.pool()).await?;
    Ok(ReminderRun { created, sent, expired })
}

async fn run_housekeeping(state: &AppState) {
    let removed = state.rate_limiter.cleanup().await;
    state.notifier.prune();
    if removed > 0 {
        tracing::debug!(removed, "Rate limit windows cleaned");
    }
}

/// Running scheduler jobs; dropping this does not stop them, call [`Scheduler::shutdown`]
pub struct Scheduler {
    handles: Vec<(&'static str, JoinHandle<()>)>,
    shutdown: CancellationToken,
}

impl Scheduler {
    /// Spawn every periodic job
    pub fn start(state: AppState) -> Self {
        let mut scheduler = Self {
            handles: Vec::new(),
            shutdown: CancellationToken::new(),
        };

        let s = state.clone();
        scheduler.spawn_periodic("lease", LEASE_INTERVAL, move || {
            let s = s.clone();
            async move {
                match run_lease_jobs(&s).await {
                    Ok(run) if run != LeaseRun::default() => tracing::info!(
                        expired = run.expired,
                        activated = run.activated,
                        completed = run.completed,
                        "Lease jobs finished"
                    ),
                    Ok(_) => {}
                    Err(e) => tracing::error!(error = %e, "Lease jobs failed"),
                }
            }
        });

        let s = state.clone();
        scheduler.spawn_periodic("reminders", REMINDER_INTERVAL, move || {
            let s = s.clone();
            async move {
                match run_reminder_jobs(&s).await {
                    Ok(run) if run != ReminderRun::default() => tracing::info!(
                        created = run.created,
                        sent = run.sent,
                        expired = run.expired,
                        "Reminder jobs finished"
                    ),
                    Ok(_) => {}
                    Err(e) => tracing::error!(error = %e, "Reminder jobs failed"),
                }
            }
        });

        scheduler.spawn_periodic("housekeeping", HOUSEKEEPING_INTERVAL, move || {
            let s = state.clone();
            async move { run_housekeeping(&s).await }
        });

        tracing::info!(jobs = scheduler.handles.len(), "Scheduler started");
        scheduler
    }

    /// Run `job` on every tick (the first tick fires immediately) until shutdown.
    /// A panicking run is logged and does not end the loop.
    fn spawn_periodic<F, Fut>(&mut self, name: &'static str, period: Duration, job: F)
    where
        F: Fn() -> Fut + Send + 'static,
        Fut: std::future::Future<Output = ()> + Send + 'static,
    {
        let shutdown = self.shutdown.clone();
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    _ = interval.tick() => {
                        if let Err(panic) = AssertUnwindSafe(job()).catch_unwind().await {
                            let msg = panic
                                .downcast_ref::<&str>()
                                .map(|s| (*s).to_string())
                                .or_else(|| panic.downcast_ref::<String>().cloned())
                                .unwrap_or_else(|| "Unknown panic".to_string());
                            tracing::error!(job = name, panic = %msg, "Scheduled job panicked");
                        }
                    }
                }
            }
            tracing::debug!(job = name, "Scheduled job stopped");
        });
        self.handles.push((name, handle));
    }

    /// Cancel all jobs and wait for in-flight runs to finish
    pub async fn shutdown(self) {
        self.shutdown.cancel();
        for (name, handle) in self.handles {
            if let Err(e) = handle.await {
                tracing::error!(job = name, error = ?e, "Scheduled job ended abnormally");
            }
        }
        tracing::info!("Scheduler stopped");
    }
}
