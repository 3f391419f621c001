//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! ServiceConfig.telemetry
//!     → resource.rs   (ResourceIdentity, ExporterEndpoint)
//!     → sampling.rs   (SamplingPolicy)
//!     → exporters.rs  (console / OTLP per signal, shared endpoint)
//!     → traces.rs, metrics.rs, logs.rs (one provider each)
//!     → pipeline.rs   (TelemetryPipeline, TelemetryHandle)
//!
//! Consumers:
//!     → stdout (human-readable, local debugging)
//!     → OTLP collector (gRPC)
//! ```
//!
//! # Design Decisions
//! - One resource value shared by all three providers
//! - Pipelines are immutable after startup; request code only records
//! - Export runs on SDK background workers, never on request tasks

pub mod error;
pub mod exporters;
pub mod logs;
pub mod metrics;
pub mod pipeline;
pub mod resource;
pub mod sampling;
pub mod traces;

pub use error::{TelemetryError, TelemetryResult};
pub use exporters::{PipelineExporters, SignalExporterSet};
pub use metrics::HttpServerMetrics;
pub use pipeline::{TelemetryHandle, TelemetryPipeline};
pub use resource::{ExporterEndpoint, ResourceIdentity};
pub use sampling::SamplingPolicy;
