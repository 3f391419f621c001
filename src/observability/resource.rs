//! Resource identity and exporter destinations.
//!
//! One [`ResourceIdentity`] is built at startup and its [`Resource`] is handed
//! to all three signal providers, so traces, metrics and logs always agree on
//! `service.name`.

use opentelemetry::KeyValue;
use opentelemetry_sdk::Resource;
use url::Url;

use crate::config::TelemetryConfig;
use crate::observability::error::{TelemetryError, TelemetryResult};

/// Immutable descriptor of this process attached to every exported record.
#[derive(Debug, Clone)]
pub struct ResourceIdentity {
    service_name: String,
    service_version: Option<String>,
    resource: Resource,
}

impl ResourceIdentity {
    pub fn new(service_name: impl Into<String>, service_version: Option<String>) -> Self {
        let service_name = service_name.into();

        let mut builder = Resource::builder().with_service_name(service_name.clone());
        if let Some(ref version) = service_version {
            builder = builder.with_attribute(KeyValue::new("service.version", version.clone()));
        }

        Self {
            service_name,
            service_version,
            resource: builder.build(),
        }
    }

    pub fn from_config(config: &TelemetryConfig) -> Self {
        Self::new(config.service_name.clone(), config.service_version.clone())
    }

    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    pub fn service_version(&self) -> Option<&str> {
        self.service_version.as_deref()
    }

    /// The shared SDK resource. Cloning is cheap (reference counted).
    pub fn resource(&self) -> Resource {
        self.resource.clone()
    }
}

/// A validated collector URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExporterEndpoint {
    raw: String,
}

impl ExporterEndpoint {
    /// Parse and validate a collector endpoint.
    ///
    /// Only absolute `http`/`https` URIs with a host are accepted.
    pub fn parse(raw: &str) -> TelemetryResult<Self> {
        let invalid = |reason: &str| TelemetryError::InvalidEndpoint {
            endpoint: raw.to_string(),
            reason: reason.to_string(),
        };

        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(invalid("endpoint is empty"));
        }

        let uri = Url::parse(trimmed).map_err(|e| invalid(&e.to_string()))?;
        if !matches!(uri.scheme(), "http" | "https") {
            return Err(invalid("scheme must be http or https"));
        }
        if uri.host_str().map_or(true, str::is_empty) {
            return Err(invalid("endpoint has no host"));
        }

        Ok(Self {
            raw: trimmed.to_string(),
        })
    }

    /// The endpoint as the operator wrote it, minus surrounding whitespace.
    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl std::fmt::Display for ExporterEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use opentelemetry::{Key, Value};

    #[test]
    fn test_resource_carries_service_identity() {
        let identity = ResourceIdentity::new("dice", Some("1.2.3".into()));
        let resource = identity.resource();

        assert_eq!(
            resource.get(&Key::new("service.name")),
            Some(Value::from("dice"))
        );
        assert_eq!(
            resource.get(&Key::new("service.version")),
            Some(Value::from("1.2.3"))
        );
        assert_eq!(identity.service_name(), "dice");
    }

    #[test]
    fn test_endpoint_accepts_default_collector() {
        let endpoint = ExporterEndpoint::parse("http://localhost:4317").unwrap();
        assert_eq!(endpoint.as_str(), "http://localhost:4317");
    }

    #[test]
    fn test_endpoint_rejects_garbage() {
        for raw in ["", "   ", "not a uri", "localhost:4317", "ftp://collector:21", "http://"] {
            assert!(
                ExporterEndpoint::parse(raw).is_err(),
                "'{raw}' should be rejected"
            );
        }
    }
}
