//! Call analytics service
//!
//! Aggregates call events into period-over-period KPIs, daily series,
//! distributions, breakdowns, and an activity heatmap, and serves the result
//! over HTTP.

pub mod analytics;
pub mod api;
pub mod config;
pub mod error;
pub mod metrics;
pub mod models;

pub use error::{AppError, Result};
