//! Configuration loading from disk and environment.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::ServiceConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Standard OpenTelemetry variable naming the collector endpoint.
pub const OTLP_ENDPOINT_ENV: &str = "OTEL_EXPORTER_OTLP_ENDPOINT";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Parse configuration from a TOML string without validating it.
pub fn parse_config(content: &str) -> Result<ServiceConfig, ConfigError> {
    Ok(toml::from_str(content)?)
}

/// Load configuration from an optional TOML file.
///
/// A missing path means "use defaults"; the collector endpoint may still be
/// overridden from the environment. The result is validated.
pub fn load_config(path: Option<&Path>) -> Result<ServiceConfig, ConfigError> {
    let mut config = match path {
        Some(path) => parse_config(&fs::read_to_string(path)?)?,
        None => ServiceConfig::default(),
    };

    if let Ok(endpoint) = std::env::var(OTLP_ENDPOINT_ENV) {
        if !endpoint.is_empty() {
            config.telemetry.otlp.endpoint = endpoint;
        }
    }

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_surfaces() {
        let err = parse_config("listener = 5").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = load_config(Some(Path::new("/definitely/not/here.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn test_validation_message_lists_fields() {
        let err = ConfigError::Validation(vec![ValidationError {
            field: "telemetry.otlp.endpoint",
            message: "bad".into(),
        }]);
        assert_eq!(err.to_string(), "Validation failed: telemetry.otlp.endpoint: bad");
    }

    #[test]
    fn test_example_config_loads() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("rolldice.example.toml");
        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.capture.redact_fields, vec!["password", "token"]);
        assert_eq!(config.telemetry.service_name, "rolldice-otel");
    }
}
