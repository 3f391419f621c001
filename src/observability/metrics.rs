//! Metrics collection and export.
//!
//! # Responsibilities
//! - Build the meter provider with periodic readers per sink
//! - Define the HTTP server instruments recorded for every request
//!
//! # Metrics
//! - `http.server.request.duration` (histogram, seconds): latency by method, route, status
//! - `http.server.active_requests` (up-down counter): requests in flight
//! - `http.server.request.body.size` (histogram, bytes): request payload size
//!
//! # Design Decisions
//! - Readers export on their own interval thread; request tasks only record
//! - Instruments are created once and shared through `Arc`

use std::time::Duration;

use axum::http::{Method, StatusCode};
use opentelemetry::metrics::{Histogram, Meter, MeterProvider as _, UpDownCounter};
use opentelemetry::{InstrumentationScope, KeyValue};
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::metrics::{PeriodicReader, SdkMeterProvider};
use opentelemetry_sdk::Resource;

use crate::observability::error::TelemetryResult;
use crate::observability::exporters::SignalExporterSet;

/// Build the meter provider for this process.
pub fn configure_metrics(
    resource: Resource,
    exporters: &SignalExporterSet,
    interval: Duration,
) -> TelemetryResult<SdkMeterProvider> {
    let mut builder = SdkMeterProvider::builder().with_resource(resource);

    if exporters.console {
        let reader = PeriodicReader::builder(opentelemetry_stdout::MetricExporter::default())
            .with_interval(interval)
            .build();
        builder = builder.with_reader(reader);
    }

    if let Some(ref endpoint) = exporters.otlp {
        let exporter = opentelemetry_otlp::MetricExporter::builder()
            .with_tonic()
            .with_endpoint(endpoint.as_str())
            .with_timeout(exporters.export_timeout)
            .build()?;
        let reader = PeriodicReader::builder(exporter).with_interval(interval).build();
        builder = builder.with_reader(reader);
    }

    tracing::debug!(
        console = exporters.console,
        otlp = ?exporters.otlp.as_ref().map(|e| e.as_str()),
        interval_secs = interval.as_secs(),
        "Metric pipeline configured"
    );

    Ok(builder.build())
}

/// HTTP server instruments.
#[derive(Debug, Clone)]
pub struct HttpServerMetrics {
    request_duration: Histogram<f64>,
    active_requests: UpDownCounter<i64>,
    request_body_size: Histogram<u64>,
}

impl HttpServerMetrics {
    pub fn new(meter: &Meter) -> Self {
        let request_duration = meter
            .f64_histogram("http.server.request.duration")
            .with_description("Duration of HTTP server requests")
            .with_unit("s")
            .build();

        let active_requests = meter
            .i64_up_down_counter("http.server.active_requests")
            .with_description("Number of active HTTP server requests")
            .build();

        let request_body_size = meter
            .u64_histogram("http.server.request.body.size")
            .with_description("Size of HTTP server request bodies")
            .with_unit("By")
            .build();

        Self {
            request_duration,
            active_requests,
            request_body_size,
        }
    }

    /// Instruments on the named meter of `provider`.
    pub fn from_provider(provider: &SdkMeterProvider, meter_name: &str) -> Self {
        let scope = InstrumentationScope::builder(meter_name.to_string()).build();
        Self::new(&provider.meter_with_scope(scope))
    }

    pub fn request_started(&self, method: &Method) {
        self.active_requests.add(1, &[method_attribute(method)]);
    }

    pub fn request_finished(&self, method: &Method) {
        self.active_requests.add(-1, &[method_attribute(method)]);
    }

    pub fn record_request(&self, method: &Method, route: &str, status: StatusCode, elapsed: Duration) {
        let attributes = [
            method_attribute(method),
            KeyValue::new("http.route", route.to_string()),
            KeyValue::new("http.response.status_code", i64::from(status.as_u16())),
        ];
        self.request_duration.record(elapsed.as_secs_f64(), &attributes);
    }

    pub fn record_body_size(&self, method: &Method, route: &str, bytes: usize) {
        let attributes = [
            method_attribute(method),
            KeyValue::new("http.route", route.to_string()),
        ];
        self.request_body_size.record(bytes as u64, &attributes);
    }
}

fn method_attribute(method: &Method) -> KeyValue {
    KeyValue::new("http.request.method", method.as_str().to_string())
}
