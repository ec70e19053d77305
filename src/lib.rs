//! pulseboard -- terminal client for a metrics anomaly dashboard.
//!
//! This crate triggers backend analysis jobs, refreshes the reports they
//! produce, and renders them as severity-tagged cards.

pub mod api;
pub mod config;
pub mod dashboard;
pub mod render;
pub mod report;
pub mod trigger;

use crate::api::ApiError;
use crate::config::{LogFormat, LoggingConfig};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DashboardError {
    #[error("failed to fetch reports: {0}")]
    FetchFailed(#[source] ApiError),
    #[error("failed to start {kind} analysis: {source}")]
    TriggerFailed { kind: String, source: ApiError },
}

/// Install the global tracing subscriber. `RUST_LOG` overrides the
/// configured level.
pub fn init_tracing(logging: &LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&logging.level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    match logging.format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Text => builder.init(),
    }
}
