//! # Arena Dashboard
//!
//! Backend for a live time-series forecasting benchmark dashboard.
//!
//! ## Architecture
//!
//! - **duration**: ISO-8601 duration parsing, display labels and horizon steps
//! - **models**: Wire models for challenges, series, forecasts and rankings
//! - **client**: REST client for the benchmark API
//! - **summary**: Challenge summary cards (horizon, frequency, countdown)
//! - **plot**: Forecast comparison plot assembly
//! - **api**: REST API endpoints
//! - **config**: Configuration loading and validation

pub mod api;
pub mod client;
pub mod config;
pub mod duration;
pub mod models;
pub mod plot;
pub mod summary;

pub use duration::{
    format_max_unit, horizon_steps, parse_iso8601_duration, DurationBreakdown, DurationError,
    ParsedDuration,
};
pub use models::*;
