//! Structured logging.
//!
//! # Responsibilities
//! - Build the logger provider with console and OTLP log exporters
//! - Install the process-wide `tracing` subscriber
//!
//! # Design Decisions
//! - Uses tracing crate for structured logging everywhere
//! - `tracing` events become OpenTelemetry log records through the appender
//!   bridge, so every record carries the resource and the active span's ids
//! - Log level configurable via config and `RUST_LOG`

use opentelemetry_appender_tracing::layer::OpenTelemetryTracingBridge;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::logs::{LoggerProviderBuilder, SdkLoggerProvider};
use opentelemetry_sdk::trace::SdkTracerProvider;
use opentelemetry_sdk::Resource;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::observability::error::TelemetryResult;
use crate::observability::exporters::SignalExporterSet;
use crate::observability::traces::span_layer;

/// Targets used by the export path itself. Bridging their events back into
/// the log pipeline would feed exports into exports.
const EXPORT_PATH_TARGETS: &[&str] = &[
    "h2",
    "hyper",
    "hyper_util",
    "tonic",
    "tower",
    "reqwest",
    "opentelemetry",
    "opentelemetry_sdk",
    "opentelemetry_otlp",
];

/// Build the logger provider for this process.
pub fn configure_logging(
    resource: Resource,
    exporters: &SignalExporterSet,
) -> TelemetryResult<SdkLoggerProvider> {
    Ok(logger_builder(resource, exporters)?.build())
}

/// Logger provider builder with the configured sinks attached. Further
/// processors may be added before building.
pub fn logger_builder(
    resource: Resource,
    exporters: &SignalExporterSet,
) -> TelemetryResult<LoggerProviderBuilder> {
    let mut builder = SdkLoggerProvider::builder().with_resource(resource);

    if exporters.console {
        builder = builder.with_batch_exporter(opentelemetry_stdout::LogExporter::default());
    }

    if let Some(ref endpoint) = exporters.otlp {
        let exporter = opentelemetry_otlp::LogExporter::builder()
            .with_tonic()
            .with_endpoint(endpoint.as_str())
            .with_timeout(exporters.export_timeout)
            .build()?;
        builder = builder.with_batch_exporter(exporter);
    }

    Ok(builder)
}

/// Filter for the log bridge: the configured level with export-path targets
/// switched off.
pub fn bridge_filter(log_level: &str) -> TelemetryResult<EnvFilter> {
    let mut directives = vec![log_level.to_string()];
    directives.extend(EXPORT_PATH_TARGETS.iter().map(|target| format!("{target}=off")));
    Ok(EnvFilter::try_new(directives.join(","))?)
}

/// Install the global subscriber: operator-facing fmt output, spans into the
/// trace pipeline and events into the log pipeline.
pub fn install_subscriber(
    tracer_provider: &SdkTracerProvider,
    logger_provider: &SdkLoggerProvider,
    instrumentation_scope: &str,
    log_level: &str,
) -> TelemetryResult<()> {
    let env_filter =
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(log_level))?;

    let log_bridge =
        OpenTelemetryTracingBridge::new(logger_provider).with_filter(bridge_filter(log_level)?);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .with(span_layer(tracer_provider, instrumentation_scope))
        .with(log_bridge)
        .try_init()?;

    Ok(())
}
