use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::anyhow;
use chrono::{NaiveDateTime, NaiveTime};
use pharmacy_core::{Clock, Database, LeaveService, NotificationSink, ReservationService};
use tokio::time::sleep;
use tracing::{debug, error, info};

/// First instant strictly after `now` whose wall-clock time is `at`.
pub fn next_run_after(now: NaiveDateTime, at: NaiveTime) -> NaiveDateTime {
    let today = now.date().and_time(at);
    if today > now {
        today
    } else {
        today + chrono::Duration::days(1)
    }
}

/// Shared state for the background jobs.
pub struct Jobs {
    db: Arc<Mutex<Database>>,
    clock: Arc<dyn Clock>,
    sink: Arc<dyn NotificationSink>,
}

impl Jobs {
    pub fn new(db: Arc<Mutex<Database>>, clock: Arc<dyn Clock>, sink: Arc<dyn NotificationSink>) -> Self {
        Self { db, clock, sink }
    }

    /// Reject every pending leave request whose first day has arrived.
    pub fn run_leave_sweep(&self) -> anyhow::Result<usize> {
        let db = self.db.lock().map_err(|_| anyhow!("database lock poisoned"))?;
        let rejected = LeaveService::new(&db, self.clock.as_ref(), self.sink.as_ref())
            .reject_pending_started_leave_requests()?;
        Ok(rejected)
    }

    /// Expire overdue reservations and put their stock back.
    pub fn run_expiry_sweep(&self) -> anyhow::Result<usize> {
        let db = self.db.lock().map_err(|_| anyhow!("database lock poisoned"))?;
        let expired = ReservationService::new(&db, self.clock.as_ref(), self.sink.as_ref())
            .expire_overdue()?;
        Ok(expired)
    }

    fn now(&self) -> NaiveDateTime {
        self.clock.now()
    }
}

/// Run the leave sweep every day at `at`, forever.
pub async fn daily_leave_sweep(jobs: Arc<Jobs>, at: NaiveTime) {
    loop {
        let now = jobs.now();
        let next = next_run_after(now, at);
        let wait = (next - now).to_std().unwrap_or(Duration::ZERO);
        info!(next_run = %next, "Leave sweep scheduled");
        sleep(wait).await;

        let worker = jobs.clone();
        match tokio::task::spawn_blocking(move || worker.run_leave_sweep()).await {
            Ok(Ok(rejected)) => info!(rejected, "Leave sweep finished"),
            Ok(Err(e)) => error!("Leave sweep failed: {:#}", e),
            Err(e) => error!("Leave sweep task panicked: {}", e),
        }
    }
}

/// Run the reservation expiry sweep every `interval`, forever.
pub async fn periodic_expiry_sweep(jobs: Arc<Jobs>, interval: Duration) {
    loop {
        let worker = jobs.clone();
        match tokio::task::spawn_blocking(move || worker.run_expiry_sweep()).await {
            Ok(Ok(0)) => debug!("No overdue reservations"),
            Ok(Ok(expired)) => info!(expired, "Expired overdue reservations"),
            Ok(Err(e)) => error!("Reservation expiry failed: {:#}", e),
            Err(e) => error!("Reservation expiry task panicked: {}", e),
        }
        sleep(interval).await;
    }
}
