//! Periodic maintenance driver for chirp.
//!
//! This crate runs the trending engine's maintenance operations on a cadence:
//!
//! - **Hourly reset**: zeroes the one-hour window counters
//! - **Daily reset**: zeroes the six/24-hour window counters and rescores
//! - **Staleness sweep**: deactivates trends with no recent activity

pub mod scheduler;

pub use scheduler::{MaintenanceConfig, MaintenanceExecutor, MaintenanceState, run_maintenance};
