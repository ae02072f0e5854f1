use std::env;
use std::time::Duration;

use anyhow::Context;
use chrono::NaiveTime;

#[derive(Clone, Debug)]
pub struct Config {
    pub db_path: String,
    /// Local wall-clock time of the daily leave sweep
    pub leave_sweep_at: NaiveTime,
    pub reservation_sweep_interval: Duration,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup (the process environment in production).
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let db_path = lookup("PHARMACY_DB_PATH").context("PHARMACY_DB_PATH is not set")?;

        let leave_sweep_at = match lookup("LEAVE_SWEEP_AT") {
            Some(value) => NaiveTime::parse_from_str(&value, "%H:%M")
                .with_context(|| format!("LEAVE_SWEEP_AT must be HH:MM, got {}", value))?,
            None => NaiveTime::MIN,
        };

        let interval_secs = lookup("RESERVATION_SWEEP_INTERVAL_SECS")
            .and_then(|s| s.parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .unwrap_or(300);

        Ok(Self {
            db_path,
            leave_sweep_at,
            reservation_sweep_interval: Duration::from_secs(interval_secs),
        })
    }
}
