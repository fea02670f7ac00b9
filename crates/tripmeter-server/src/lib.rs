//! tripmeter server library entry.
//!
//! Wires configuration, shared state, request instrumentation, the trip
//! routes and the operational endpoints into one axum router. Consumed by the
//! binary (`main.rs`) and by integration tests.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod app_state;
pub mod config;
pub mod error;
pub mod obs;
pub mod ops;
pub mod router;
pub mod trips;
