//! Telemetry pipeline composition.
//!
//! Builds the trace, metric and log providers from one resource identity,
//! one sampling policy and one set of exporters, and owns them until
//! shutdown.

use std::sync::Arc;
use std::time::Duration;

use opentelemetry::global;
use opentelemetry_sdk::logs::SdkLoggerProvider;
use opentelemetry_sdk::metrics::SdkMeterProvider;
use opentelemetry_sdk::propagation::TraceContextPropagator;
use opentelemetry_sdk::trace::SdkTracerProvider;

use crate::config::{ServiceConfig, TelemetryConfig};
use crate::http::middleware::capture::CapturePolicy;
use crate::observability::error::{TelemetryError, TelemetryResult};
use crate::observability::exporters::PipelineExporters;
use crate::observability::logs::{configure_logging, install_subscriber};
use crate::observability::metrics::{configure_metrics, HttpServerMetrics};
use crate::observability::resource::ResourceIdentity;
use crate::observability::sampling::SamplingPolicy;
use crate::observability::traces::configure_tracing;

/// The three signal providers of this process.
pub struct TelemetryPipeline {
    identity: ResourceIdentity,
    sampler: SamplingPolicy,
    exporters: PipelineExporters,
    tracer_provider: SdkTracerProvider,
    meter_provider: SdkMeterProvider,
    logger_provider: SdkLoggerProvider,
}

impl TelemetryPipeline {
    /// Build all three pipelines.
    ///
    /// Endpoints are validated before any provider exists, so a bad collector
    /// URI fails here and nothing is left half-started. OTLP exporters need a
    /// Tokio runtime, so call this from inside one.
    pub fn build(config: &TelemetryConfig) -> TelemetryResult<Self> {
        let exporters = PipelineExporters::from_config(config)?;
        let identity = ResourceIdentity::from_config(config);
        let sampler = SamplingPolicy::from_config(&config.sampling);

        let tracer_provider = configure_tracing(identity.resource(), &sampler, &exporters.traces)?;
        let meter_provider = configure_metrics(
            identity.resource(),
            &exporters.metrics,
            Duration::from_secs(config.metrics_interval_secs),
        )?;
        let logger_provider = configure_logging(identity.resource(), &exporters.logs)?;

        Ok(Self {
            identity,
            sampler,
            exporters,
            tracer_provider,
            meter_provider,
            logger_provider,
        })
    }

    /// Install the global `tracing` subscriber, meter provider and W3C trace
    /// context propagator.
    ///
    /// Only one pipeline per process may be installed.
    pub fn install(&self, log_level: &str) -> TelemetryResult<()> {
        install_subscriber(
            &self.tracer_provider,
            &self.logger_provider,
            self.identity.service_name(),
            log_level,
        )?;
        global::set_meter_provider(self.meter_provider.clone());
        global::set_text_map_propagator(TraceContextPropagator::new());

        tracing::info!(
            service_name = %self.identity.service_name(),
            service_version = ?self.identity.service_version(),
            sampler = ?self.sampler,
            traces_otlp = ?self.exporters.traces.otlp.as_ref().map(|e| e.as_str()),
            metrics_otlp = ?self.exporters.metrics.otlp.as_ref().map(|e| e.as_str()),
            logs_otlp = ?self.exporters.logs.otlp.as_ref().map(|e| e.as_str()),
            "Telemetry pipeline installed"
        );
        Ok(())
    }

    /// Handle injected into the HTTP layer.
    pub fn handle(&self, config: &ServiceConfig) -> TelemetryHandle {
        TelemetryHandle::new(
            HttpServerMetrics::from_provider(&self.meter_provider, self.identity.service_name()),
            CapturePolicy::from_config(config),
            config.telemetry.instrumentation.record_exceptions,
        )
    }

    pub fn identity(&self) -> &ResourceIdentity {
        &self.identity
    }

    pub fn exporters(&self) -> &PipelineExporters {
        &self.exporters
    }

    /// Flush then close every provider. All three are attempted even when one
    /// fails; the failures are reported together.
    pub fn shutdown(self) -> TelemetryResult<()> {
        let mut failures = Vec::new();

        if let Err(e) = self.tracer_provider.force_flush() {
            failures.push(format!("traces flush: {e}"));
        }
        if let Err(e) = self.tracer_provider.shutdown() {
            failures.push(format!("traces: {e}"));
        }
        if let Err(e) = self.meter_provider.force_flush() {
            failures.push(format!("metrics flush: {e}"));
        }
        if let Err(e) = self.meter_provider.shutdown() {
            failures.push(format!("metrics: {e}"));
        }
        if let Err(e) = self.logger_provider.force_flush() {
            failures.push(format!("logs flush: {e}"));
        }
        if let Err(e) = self.logger_provider.shutdown() {
            failures.push(format!("logs: {e}"));
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(TelemetryError::Shutdown(failures.join("; ")))
        }
    }
}

/// Read-only telemetry state shared by every request.
#[derive(Clone)]
pub struct TelemetryHandle {
    metrics: Arc<HttpServerMetrics>,
    capture: Arc<CapturePolicy>,
    record_exceptions: bool,
}

impl TelemetryHandle {
    pub fn new(metrics: HttpServerMetrics, capture: CapturePolicy, record_exceptions: bool) -> Self {
        Self {
            metrics: Arc::new(metrics),
            capture: Arc::new(capture),
            record_exceptions,
        }
    }

    /// Handle recording into whatever meter provider is installed globally
    /// (a no-op one unless a pipeline was installed).
    pub fn detached(config: &ServiceConfig) -> Self {
        Self::new(
            HttpServerMetrics::new(&global::meter("rolldice-otel")),
            CapturePolicy::from_config(config),
            config.telemetry.instrumentation.record_exceptions,
        )
    }

    pub fn metrics(&self) -> &HttpServerMetrics {
        &self.metrics
    }

    pub fn capture(&self) -> &CapturePolicy {
        &self.capture
    }

    pub fn record_exceptions(&self) -> bool {
        self.record_exceptions
    }
}
