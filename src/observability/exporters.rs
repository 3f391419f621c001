//! Exporter selection shared by the three signal pipelines.

use std::time::Duration;

use crate::config::{SignalExporters, TelemetryConfig};
use crate::observability::error::TelemetryResult;
use crate::observability::resource::ExporterEndpoint;

/// Sinks one signal pipeline exports to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignalExporterSet {
    /// Write human-readable records to stdout.
    pub console: bool,

    /// Remote collector, if enabled for this signal.
    pub otlp: Option<ExporterEndpoint>,

    /// Per-export timeout for the remote sink.
    pub export_timeout: Duration,
}

impl SignalExporterSet {
    pub fn new(sinks: SignalExporters, endpoint: &ExporterEndpoint, export_timeout: Duration) -> Self {
        Self {
            console: sinks.console,
            otlp: sinks.otlp.then(|| endpoint.clone()),
            export_timeout,
        }
    }

    /// No sinks at all. Providers built from this still record, they just
    /// never export.
    pub fn disabled() -> Self {
        Self {
            console: false,
            otlp: None,
            export_timeout: Duration::from_secs(10),
        }
    }

    pub fn is_empty(&self) -> bool {
        !self.console && self.otlp.is_none()
    }
}

/// Exporter sets for traces, metrics and logs, resolved from one config.
///
/// Traces and metrics always share the same collector endpoint; logs use it
/// too unless `telemetry.otlp.logs_endpoint` is set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineExporters {
    pub traces: SignalExporterSet,
    pub metrics: SignalExporterSet,
    pub logs: SignalExporterSet,
}

impl PipelineExporters {
    pub fn from_config(config: &TelemetryConfig) -> TelemetryResult<Self> {
        let endpoint = ExporterEndpoint::parse(&config.otlp.endpoint)?;
        let logs_endpoint = ExporterEndpoint::parse(config.otlp.effective_logs_endpoint())?;
        let timeout = Duration::from_secs(config.otlp.export_timeout_secs);

        Ok(Self {
            traces: SignalExporterSet::new(config.traces, &endpoint, timeout),
            metrics: SignalExporterSet::new(config.metrics, &endpoint, timeout),
            logs: SignalExporterSet::new(config.logs, &logs_endpoint, timeout),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_traces_and_metrics_share_endpoint() {
        let mut config = TelemetryConfig::default();
        config.otlp.endpoint = "http://collector:4317".into();

        let exporters = PipelineExporters::from_config(&config).unwrap();
        assert_eq!(exporters.traces.otlp, exporters.metrics.otlp);
        assert_eq!(exporters.traces.otlp, exporters.logs.otlp);
        assert_eq!(
            exporters.traces.otlp.as_ref().map(ExporterEndpoint::as_str),
            Some("http://collector:4317")
        );
    }

    #[test]
    fn test_logs_may_diverge() {
        let mut config = TelemetryConfig::default();
        config.otlp.logs_endpoint = Some("https://logs.internal:4317".into());

        let exporters = PipelineExporters::from_config(&config).unwrap();
        assert_ne!(exporters.logs.otlp, exporters.traces.otlp);
        assert_eq!(
            exporters.logs.otlp.as_ref().map(ExporterEndpoint::as_str),
            Some(config.otlp.effective_logs_endpoint())
        );
    }

    #[test]
    fn test_invalid_endpoint_fails_before_anything_is_built() {
        let mut config = TelemetryConfig::default();
        config.otlp.endpoint = "::nope::".into();
        assert!(PipelineExporters::from_config(&config).is_err());
    }

    #[test]
    fn test_disabled_sink_has_no_endpoint() {
        let mut config = TelemetryConfig::default();
        config.metrics.otlp = false;

        let exporters = PipelineExporters::from_config(&config).unwrap();
        assert!(exporters.metrics.is_empty());
        assert!(!exporters.traces.is_empty());
    }
}
