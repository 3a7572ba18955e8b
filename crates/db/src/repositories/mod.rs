//! Database repositories.

#![allow(missing_docs)]

pub mod trend;

pub use trend::{LocationFilter, TrendRepository};
