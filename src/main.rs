//! rolldice-otel
//!
//! A dice-rolling HTTP service that exports traces, metrics and logs over
//! OpenTelemetry.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ request id → timeout → metrics → capture ──▶ handler
//!                                                │         │
//!                                                ▼         ▼
//!                                        ┌──────────────────────────┐
//!                                        │    TelemetryPipeline     │
//!                                        │ traces │ metrics │ logs  │
//!                                        └────┬──────────┬──────────┘
//!                                             ▼          ▼
//!                                          stdout   OTLP collector
//! ```
//!
//! # Startup order
//! config → telemetry (fails fast on a bad endpoint) → listener → serve

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;

use rolldice_otel::config::validation::validate_config;
use rolldice_otel::config::{load_config, ConfigError};
use rolldice_otel::lifecycle::{spawn_signal_listener, Shutdown};
use rolldice_otel::{HttpServer, TelemetryPipeline};

#[derive(Debug, Parser)]
#[command(name = "rolldice-otel", version, about = "Dice-rolling service with OpenTelemetry export")]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long, env = "ROLLDICE_CONFIG")]
    config: Option<PathBuf>,

    /// OTLP collector endpoint, e.g. http://localhost:4317.
    #[arg(long)]
    otlp_endpoint: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = load_config(cli.config.as_deref())?;
    if let Some(endpoint) = cli.otlp_endpoint {
        config.telemetry.otlp.endpoint = endpoint;
        validate_config(&config).map_err(ConfigError::Validation)?;
    }

    let pipeline = TelemetryPipeline::build(&config.telemetry)?;
    pipeline.install(&config.telemetry.log_level)?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        bind_address = %config.listener.bind_address,
        request_timeout_secs = config.timeouts.request_secs,
        max_body_size = config.limits.max_body_size,
        otlp_endpoint = %config.telemetry.otlp.endpoint,
        "Configuration loaded"
    );

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Arc::new(Shutdown::new());
    let stop = shutdown.subscribe();
    let signals = spawn_signal_listener(shutdown.clone());

    let telemetry = pipeline.handle(&config);
    let server = HttpServer::new(&config, telemetry);
    let served = server.run(listener, stop).await;
    signals.abort();

    if let Err(e) = &served {
        tracing::error!(error = %e, "HTTP server failed");
    }

    tracing::info!("Flushing telemetry");
    // Provider shutdown blocks on the export workers.
    match tokio::task::spawn_blocking(move || pipeline.shutdown()).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => tracing::error!(error = %e, "Telemetry shutdown incomplete"),
        Err(e) => tracing::error!(error = %e, "Telemetry shutdown task failed"),
    }

    served?;
    Ok(())
}
