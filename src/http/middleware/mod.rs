//! Request middleware.
//!
//! # Order (outermost first)
//! ```text
//! request id → timeout → metrics.rs → capture.rs → handler
//! ```

pub mod capture;
pub mod metrics;

use axum::extract::MatchedPath;
use axum::http::Extensions;

/// Route label used when no route matched.
pub const UNMATCHED_ROUTE: &str = "unmatched";

/// The matched route template (e.g. `/rolldice/{player}`), if routing has
/// happened.
pub fn route_of(extensions: &Extensions) -> Option<&str> {
    extensions.get::<MatchedPath>().map(MatchedPath::as_str)
}
