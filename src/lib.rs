//! Dice-rolling HTTP service instrumented with OpenTelemetry.
//!
//! Every request runs inside a server span carrying its body and query
//! string; traces, metrics and logs share one resource identity and are
//! exported to the console and an OTLP collector.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;

pub use config::schema::ServiceConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use observability::{TelemetryHandle, TelemetryPipeline};
