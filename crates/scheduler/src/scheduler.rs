//! Periodic maintenance jobs for the trending engine.
//!
//! Drives the hourly/daily counter resets and the staleness sweep on tokio
//! intervals. The engine operations are idempotent per invocation, so a
//! delayed, missed, or duplicated tick degrades counter freshness but never
//! corrupts invariants.

#![allow(missing_docs)]

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::time::interval;

/// Maintenance scheduling configuration.
#[derive(Debug, Clone)]
pub struct MaintenanceConfig {
    /// Interval between hourly resets (default: 1 hour).
    pub hourly_reset_interval: Duration,
    /// Interval between daily resets (default: 24 hours).
    pub daily_reset_interval: Duration,
    /// Interval between staleness sweeps (default: 24 hours).
    pub stale_sweep_interval: Duration,
    /// Days of inactivity before a trend is deactivated.
    pub stale_cutoff_days: i64,
}

impl Default for MaintenanceConfig {
    fn default() -> Self {
        Self {
            hourly_reset_interval: Duration::from_secs(3600),
            daily_reset_interval: Duration::from_secs(86400),
            stale_sweep_interval: Duration::from_secs(86400),
            stale_cutoff_days: 30,
        }
    }
}

impl MaintenanceConfig {
    /// Build a scheduling config from the application configuration.
    #[must_use]
    pub const fn from_config(config: &chirp_common::MaintenanceConfig) -> Self {
        Self {
            hourly_reset_interval: Duration::from_secs(config.hourly_reset_secs),
            daily_reset_interval: Duration::from_secs(config.daily_reset_secs),
            stale_sweep_interval: Duration::from_secs(config.stale_sweep_secs),
            stale_cutoff_days: config.stale_cutoff_days,
        }
    }
}

/// Scheduler state for tracking job runs.
#[derive(Debug, Clone, Default)]
pub struct MaintenanceState {
    pub last_hourly_reset: Option<DateTime<Utc>>,
    pub last_daily_reset: Option<DateTime<Utc>>,
    pub last_stale_sweep: Option<DateTime<Utc>>,
}

/// Executor trait for maintenance jobs.
#[async_trait::async_trait]
pub trait MaintenanceExecutor: Send + Sync {
    /// Zero the one-hour window counter of every active trend.
    async fn reset_hourly(&self) -> Result<u64, Box<dyn std::error::Error + Send + Sync>>;

    /// Zero the daily window counters of every active trend and rescore.
    async fn reset_daily(&self) -> Result<u64, Box<dyn std::error::Error + Send + Sync>>;

    /// Deactivate trends idle for longer than `cutoff_days`.
    async fn deactivate_stale(
        &self,
        cutoff_days: i64,
    ) -> Result<u64, Box<dyn std::error::Error + Send + Sync>>;
}

/// Run the maintenance scheduler with the given configuration and executor.
pub async fn run_maintenance<E: MaintenanceExecutor + 'static>(
    config: MaintenanceConfig,
    executor: Arc<E>,
) {
    let executor_hourly = executor.clone();
    let executor_daily = executor.clone();
    let executor_sweep = executor;

    let hourly_interval = config.hourly_reset_interval;
    let daily_interval = config.daily_reset_interval;
    let sweep_interval = config.stale_sweep_interval;
    let stale_cutoff_days = config.stale_cutoff_days;

    // Spawn hourly reset task
    tokio::spawn(async move {
        let mut interval = interval(hourly_interval);
        loop {
            interval.tick().await;
            match executor_hourly.reset_hourly().await {
                Ok(count) => {
                    if count > 0 {
                        tracing::info!(count, "Reset hourly window counters");
                    }
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to reset hourly window counters");
                }
            }
        }
    });

    // Spawn daily reset task
    tokio::spawn(async move {
        let mut interval = interval(daily_interval);
        loop {
            interval.tick().await;
            match executor_daily.reset_daily().await {
                Ok(count) => {
                    if count > 0 {
                        tracing::info!(count, "Reset daily window counters");
                    }
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to reset daily window counters");
                }
            }
        }
    });

    // Spawn staleness sweep task
    tokio::spawn(async move {
        let mut interval = interval(sweep_interval);
        loop {
            interval.tick().await;
            match executor_sweep.deactivate_stale(stale_cutoff_days).await {
                Ok(count) => {
                    if count > 0 {
                        tracing::info!(
                            count,
                            cutoff_days = stale_cutoff_days,
                            "Deactivated stale trends"
                        );
                    }
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to deactivate stale trends");
                }
            }
        }
    });
}
