//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! defaults
//!     → config file (TOML, optional)
//!     → OTEL_EXPORTER_OTLP_ENDPOINT / --otlp-endpoint overrides
//!     → validation.rs (semantic checks)
//!     → ServiceConfig (validated, immutable)
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; telemetry pipelines are built from it once
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{
    CaptureConfig, InstrumentationConfig, LimitsConfig, ListenerConfig, OtlpConfig,
    SamplerKind, SamplingConfig, ServiceConfig, SignalExporters, TelemetryConfig,
    TimeoutConfig, DEFAULT_OTLP_ENDPOINT,
};
