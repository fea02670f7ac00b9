//! Request observability.
//!
//! The metric families themselves live in `tripmeter_core::metrics`; this
//! module feeds them from the HTTP request lifecycle.

pub mod instrument;

pub use instrument::{resolve_route, track_http, HttpLabels, RequestInstrumentation, RequestToken};
