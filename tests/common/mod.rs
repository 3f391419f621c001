//! Shared utilities for integration tests.

#![allow(dead_code)]

use opentelemetry::global;
use opentelemetry::trace::TracerProvider as _;
use opentelemetry_sdk::propagation::TraceContextPropagator;
use opentelemetry_sdk::trace::{InMemorySpanExporter, SdkTracerProvider, SpanData};
use tracing::subscriber::DefaultGuard;
use tracing_subscriber::layer::SubscriberExt;

use rolldice_otel::observability::TelemetryHandle;
use rolldice_otel::{HttpServer, ServiceConfig};

/// Collects finished spans in memory for the current thread.
///
/// The subscriber is installed with `set_default`, so tests must run on a
/// current-thread runtime (plain `#[tokio::test]`). The W3C propagator is
/// installed globally so inbound `traceparent` headers are honoured.
pub struct SpanCapture {
    exporter: InMemorySpanExporter,
    provider: SdkTracerProvider,
    _guard: DefaultGuard,
}

impl SpanCapture {
    pub fn install() -> Self {
        global::set_text_map_propagator(TraceContextPropagator::new());

        let exporter = InMemorySpanExporter::default();
        let provider = SdkTracerProvider::builder()
            .with_simple_exporter(exporter.clone())
            .build();
        let tracer = provider.tracer("rolldice-otel-tests");

        let subscriber = tracing_subscriber::registry()
            .with(tracing_opentelemetry::layer().with_tracer(tracer));
        let guard = tracing::subscriber::set_default(subscriber);

        Self {
            exporter,
            provider,
            _guard: guard,
        }
    }

    /// Every span finished so far.
    pub fn spans(&self) -> Vec<SpanData> {
        let _ = self.provider.force_flush();
        self.exporter.get_finished_spans().unwrap()
    }

    /// Finished server spans opened by the capture middleware.
    pub fn request_spans(&self) -> Vec<SpanData> {
        self.spans()
            .into_iter()
            .filter(|span| attribute(span, "http.request.method").is_some())
            .collect()
    }
}

/// String form of a span attribute.
pub fn attribute(span: &SpanData, key: &str) -> Option<String> {
    span.attributes
        .iter()
        .find(|kv| kv.key.as_str() == key)
        .map(|kv| kv.value.to_string())
}

/// Server with default config and telemetry recording into the global
/// (no-op unless installed) meter provider.
pub fn test_server() -> HttpServer {
    test_server_with(ServiceConfig::default())
}

pub fn test_server_with(config: ServiceConfig) -> HttpServer {
    let telemetry = TelemetryHandle::detached(&config);
    HttpServer::new(&config, telemetry)
}
