use std::sync::{Arc, Mutex};

use pharmacy_core::{Database, SystemClock};
use pharmacy_scheduler::config::Config;
use pharmacy_scheduler::jobs::{daily_leave_sweep, periodic_expiry_sweep, Jobs};
use pharmacy_scheduler::mailer::{spawn_delivery, ChannelSink};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let config = Config::from_env()?;
    info!(db = %config.db_path, "Starting pharmacy scheduler");

    let db = Database::open(&config.db_path)?;
    let (sink, rx) = ChannelSink::new();
    let delivery = spawn_delivery(rx);

    let jobs = Arc::new(Jobs::new(
        Arc::new(Mutex::new(db)),
        Arc::new(SystemClock),
        Arc::new(sink),
    ));

    // Catch up on anything missed while the scheduler was down
    let startup = jobs.clone();
    match tokio::task::spawn_blocking(move || startup.run_leave_sweep()).await? {
        Ok(rejected) => info!(rejected, "Startup leave sweep finished"),
        Err(e) => error!("Startup leave sweep failed: {:#}", e),
    }

    let leave = tokio::spawn(daily_leave_sweep(jobs.clone(), config.leave_sweep_at));
    let expiry = tokio::spawn(periodic_expiry_sweep(jobs.clone(), config.reservation_sweep_interval));

    tokio::signal::ctrl_c().await?;
    info!("Shutting down");

    leave.abort();
    expiry.abort();
    let _ = leave.await;
    let _ = expiry.await;

    // Dropping the last sender lets the delivery task drain and stop
    drop(jobs);
    let delivered = delivery.await?;
    info!(delivered, "Scheduler stopped");

    Ok(())
}
