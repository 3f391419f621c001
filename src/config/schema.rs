//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the service.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Collector endpoint used when nothing else is configured.
pub const DEFAULT_OTLP_ENDPOINT: &str = "http://localhost:4317";

/// Root configuration for the service.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServiceConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Request size limits.
    pub limits: LimitsConfig,

    /// What the capture middleware attaches to spans.
    pub capture: CaptureConfig,

    /// Telemetry pipeline settings.
    pub telemetry: TelemetryConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Request size limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum request body size in bytes.
    pub max_body_size: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_body_size: 2 * 1024 * 1024, // 2MB
        }
    }
}

/// Request capture settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Maximum bytes of body text attached to a span (0 = unlimited).
    pub max_captured_bytes: usize,

    /// JSON object keys whose values are masked in the captured body.
    pub redact_fields: Vec<String>,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            max_captured_bytes: 16 * 1024,
            redact_fields: Vec::new(),
        }
    }
}

/// Telemetry pipeline configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// Service name attached to every exported record.
    pub service_name: String,

    /// Optional service version resource attribute.
    pub service_version: Option<String>,

    /// Log level (trace, debug, info, warn, error). `RUST_LOG` wins if set.
    pub log_level: String,

    /// Remote collector settings.
    pub otlp: OtlpConfig,

    /// Trace sampling.
    pub sampling: SamplingConfig,

    /// Sinks for spans.
    pub traces: SignalExporters,

    /// Sinks for metrics.
    pub metrics: SignalExporters,

    /// Sinks for log records.
    pub logs: SignalExporters,

    /// Metric export interval in seconds.
    pub metrics_interval_secs: u64,

    /// Instrumentation behavior.
    pub instrumentation: InstrumentationConfig,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "rolldice-otel".to_string(),
            service_version: Some(env!("CARGO_PKG_VERSION").to_string()),
            log_level: "info".to_string(),
            otlp: OtlpConfig::default(),
            sampling: SamplingConfig::default(),
            traces: SignalExporters {
                console: true,
                otlp: true,
            },
            metrics: SignalExporters {
                console: false,
                otlp: true,
            },
            logs: SignalExporters {
                console: true,
                otlp: true,
            },
            metrics_interval_secs: 60,
            instrumentation: InstrumentationConfig::default(),
        }
    }
}

/// OTLP collector configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct OtlpConfig {
    /// Collector endpoint shared by the trace and metric exporters.
    pub endpoint: String,

    /// Separate endpoint for log records. Falls back to `endpoint`.
    pub logs_endpoint: Option<String>,

    /// Per-export timeout in seconds.
    pub export_timeout_secs: u64,
}

impl Default for OtlpConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_OTLP_ENDPOINT.to_string(),
            logs_endpoint: None,
            export_timeout_secs: 10,
        }
    }
}

impl OtlpConfig {
    /// Endpoint the log pipeline exports to.
    pub fn effective_logs_endpoint(&self) -> &str {
        self.logs_endpoint.as_deref().unwrap_or(&self.endpoint)
    }
}

/// Which sampler decides whether a trace root is recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SamplerKind {
    AlwaysOn,
    AlwaysOff,
    Ratio,
}

/// Sampling configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SamplingConfig {
    pub policy: SamplerKind,

    /// Fraction of traces kept when `policy = "ratio"` (0.0 to 1.0).
    pub ratio: f64,

    /// Follow the caller's sampling decision when a parent context exists.
    pub parent_based: bool,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            policy: SamplerKind::AlwaysOn,
            ratio: 1.0,
            parent_based: false,
        }
    }
}

/// Sink selection for one signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct SignalExporters {
    /// Human-readable stdout sink.
    pub console: bool,

    /// Remote OTLP collector sink.
    pub otlp: bool,
}

/// Instrumentation options.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct InstrumentationConfig {
    /// Mark spans of failed requests as errors and log the failure inside them.
    pub record_exceptions: bool,
}

impl Default for InstrumentationConfig {
    fn default() -> Self {
        Self {
            record_exceptions: true,
        }
    }
}
