use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use tripmeter_core::error::{Result, TripmeterError};

/// A stored trip record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trip {
    pub id: u64,
    pub name: String,
    pub destination: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Body of `POST /trip`.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewTrip {
    pub name: String,
    pub destination: String,
    #[serde(default)]
    pub notes: Option<String>,
}

impl NewTrip {
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(TripmeterError::BadRequest("name must not be empty".into()));
        }
        if self.destination.trim().is_empty() {
            return Err(TripmeterError::BadRequest("destination must not be empty".into()));
        }
        Ok(())
    }
}

/// Trip persistence. The server only talks to this trait.
#[async_trait]
pub trait TripStore: Send + Sync {
    async fn create(&self, trip: NewTrip) -> Result<Trip>;
    async fn list(&self) -> Result<Vec<Trip>>;
    async fn get(&self, id: u64) -> Result<Option<Trip>>;
}

/// Process-local store; ids start at 1.
pub struct InMemoryTripStore {
    trips: DashMap<u64, Trip>,
    next_id: AtomicU64,
}

impl InMemoryTripStore {
    pub fn new() -> Self {
        Self {
            trips: DashMap::new(),
            next_id: AtomicU64::new(1),
        }
    }
}

impl Default for InMemoryTripStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TripStore for InMemoryTripStore {
    async fn create(&self, trip: NewTrip) -> Result<Trip> {
        trip.validate()?;
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let trip = Trip {
            id,
            name: trip.name,
            destination: trip.destination,
            notes: trip.notes,
        };
        self.trips.insert(id, trip.clone());
        Ok(trip)
    }

    async fn list(&self) -> Result<Vec<Trip>> {
        let mut all: Vec<Trip> = self.trips.iter().map(|r| r.value().clone()).collect();
        all.sort_by_key(|t| t.id);
        Ok(all)
    }

    async fn get(&self, id: u64) -> Result<Option<Trip>> {
        Ok(self.trips.get(&id).map(|r| r.value().clone()))
    }
}
