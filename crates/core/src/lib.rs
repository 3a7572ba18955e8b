//! Core business logic for chirp.

pub mod services;

pub use services::*;
