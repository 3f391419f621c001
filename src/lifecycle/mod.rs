//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Shutdown::trigger
//!
//! Shutdown (shutdown.rs):
//!     Trigger → server stops accepting → in-flight requests drain
//!     → telemetry providers flush and close
//! ```
//!
//! # Design Decisions
//! - Ordered shutdown: stop accept, drain, flush telemetry
//! - Telemetry is closed last so the final requests are still exported

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
pub use signals::{spawn_signal_listener, wait_for_shutdown_signal};
