//! tripmeter core: in-process metrics registry, series types, and the
//! Prometheus text exposition formatter.
//!
//! This crate carries no HTTP or runtime dependency. The server crate drives
//! it from its request middleware and `/metrics` handler; anything else that
//! can hand it a method, a route and a status can drive it the same way.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here. Poisoned locks are
//! recovered rather than propagated, since a metric update can never leave a
//! series in a state that is unsafe to read.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod metrics;

/// Shared result type.
pub use error::{ClientCode, Result, TripmeterError};
