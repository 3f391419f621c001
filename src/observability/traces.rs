//! Trace pipeline.
//!
//! # Responsibilities
//! - Build the tracer provider with resource, sampler and span exporters
//! - Bridge `tracing` spans into OpenTelemetry spans
//!
//! # Design Decisions
//! - Both sinks sit behind batch processors so exporting never runs on a
//!   request task
//! - Inbound HTTP spans come from the capture middleware, not from a
//!   separate instrumentation layer

use opentelemetry::trace::TracerProvider as _;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::trace::{SdkTracer, SdkTracerProvider};
use opentelemetry_sdk::Resource;
use tracing_opentelemetry::OpenTelemetryLayer;
use tracing_subscriber::registry::LookupSpan;

use crate::observability::error::TelemetryResult;
use crate::observability::exporters::SignalExporterSet;
use crate::observability::sampling::SamplingPolicy;

/// Build the tracer provider for this process.
pub fn configure_tracing(
    resource: Resource,
    sampler: &SamplingPolicy,
    exporters: &SignalExporterSet,
) -> TelemetryResult<SdkTracerProvider> {
    let mut builder = SdkTracerProvider::builder()
        .with_resource(resource)
        .with_sampler(sampler.to_sampler());

    if exporters.console {
        builder = builder.with_batch_exporter(opentelemetry_stdout::SpanExporter::default());
    }

    if let Some(ref endpoint) = exporters.otlp {
        let exporter = opentelemetry_otlp::SpanExporter::builder()
            .with_tonic()
            .with_endpoint(endpoint.as_str())
            .with_timeout(exporters.export_timeout)
            .build()?;
        builder = builder.with_batch_exporter(exporter);
    }

    tracing::debug!(
        console = exporters.console,
        otlp = ?exporters.otlp.as_ref().map(|e| e.as_str()),
        sampler = ?sampler,
        "Trace pipeline configured"
    );

    Ok(builder.build())
}

/// `tracing` layer that turns spans into OpenTelemetry spans from `provider`.
pub fn span_layer<S>(
    provider: &SdkTracerProvider,
    instrumentation_scope: &str,
) -> OpenTelemetryLayer<S, SdkTracer>
where
    S: tracing::Subscriber + for<'span> LookupSpan<'span>,
{
    let tracer = provider.tracer(instrumentation_scope.to_string());
    tracing_opentelemetry::layer()
        .with_tracer(tracer)
        .with_error_records_to_exceptions(true)
}
