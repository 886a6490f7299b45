//! Common utilities shared across the articles API crates.
//!
//! This crate provides:
//! - Telemetry (tracing subscriber setup)
//! - DateTime operations
//! - Serialization helpers

pub mod datetime;
pub mod serialization;
pub mod telemetry;

// Re-export commonly used types
pub use datetime::{now_utc, now_utc_seconds, parse_date, today_utc, DateTimeError};
pub use telemetry::init_tracing;

/// Common error type used throughout the crate
pub type Result<T> = std::result::Result<T, anyhow::Error>;
