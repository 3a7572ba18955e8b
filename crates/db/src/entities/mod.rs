//! Database entities.

#![allow(missing_docs)]

pub mod trend;

pub use trend::Entity as Trend;
