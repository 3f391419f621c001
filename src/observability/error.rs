//! Error types for the telemetry pipeline.

use thiserror::Error;

/// Result type alias for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;

/// Telemetry error types.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// Collector endpoint is missing or malformed.
    #[error("Invalid exporter endpoint '{endpoint}': {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },

    /// An OTLP exporter could not be constructed.
    #[error("Exporter error: {0}")]
    Exporter(#[from] opentelemetry_otlp::ExporterBuildError),

    /// The global subscriber could not be installed.
    #[error("Subscriber error: {0}")]
    Subscriber(#[from] tracing_subscriber::util::TryInitError),

    /// Log filter directives did not parse.
    #[error("Filter error: {0}")]
    Filter(#[from] tracing_subscriber::filter::ParseError),

    /// Shutdown error
    #[error("Shutdown error: {0}")]
    Shutdown(String),
}
