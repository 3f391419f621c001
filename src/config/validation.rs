//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate collector endpoints before any exporter is built
//! - Validate value ranges (timeouts > 0, ratio in [0, 1])
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServiceConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::{SamplerKind, ServiceConfig};
use crate::observability::resource::ExporterEndpoint;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Check every semantic rule and report all violations.
pub fn validate_config(config: &ServiceConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::new("timeouts.request_secs", "must be greater than 0"));
    }

    if config.limits.max_body_size == 0 {
        errors.push(ValidationError::new("limits.max_body_size", "must be greater than 0"));
    }

    let telemetry = &config.telemetry;
    if telemetry.service_name.trim().is_empty() {
        errors.push(ValidationError::new("telemetry.service_name", "cannot be empty"));
    }

    if let Err(e) = ExporterEndpoint::parse(&telemetry.otlp.endpoint) {
        errors.push(ValidationError::new("telemetry.otlp.endpoint", e.to_string()));
    }

    if let Some(ref logs_endpoint) = telemetry.otlp.logs_endpoint {
        if let Err(e) = ExporterEndpoint::parse(logs_endpoint) {
            errors.push(ValidationError::new("telemetry.otlp.logs_endpoint", e.to_string()));
        }
    }

    if telemetry.otlp.export_timeout_secs == 0 {
        errors.push(ValidationError::new(
            "telemetry.otlp.export_timeout_secs",
            "must be greater than 0",
        ));
    }

    if telemetry.metrics_interval_secs == 0 {
        errors.push(ValidationError::new(
            "telemetry.metrics_interval_secs",
            "must be greater than 0",
        ));
    }

    if telemetry.sampling.policy == SamplerKind::Ratio
        && !(0.0..=1.0).contains(&telemetry.sampling.ratio)
    {
        errors.push(ValidationError::new(
            "telemetry.sampling.ratio",
            "must be between 0.0 and 1.0",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
