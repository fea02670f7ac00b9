//! Trip resource: create, list, and get-by-id over a pluggable store.

pub mod handlers;
pub mod store;

pub use store::{InMemoryTripStore, NewTrip, Trip, TripStore};
