//! Shared application state.
//!
//! One `MetricRegistry` is constructed here and shared by every request
//! handler; nothing reaches it through a global.

use std::sync::Arc;

use tripmeter_core::error::Result;
use tripmeter_core::metrics::MetricRegistry;

use crate::config::ServerConfig;
use crate::obs::RequestInstrumentation;
use crate::trips::{InMemoryTripStore, TripStore};

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    cfg: ServerConfig,
    registry: Arc<MetricRegistry>,
    instrumentation: Arc<RequestInstrumentation>,
    trips: Arc<dyn TripStore>,
}

impl AppState {
    /// Build state with a fresh registry and an in-memory trip store.
    pub fn new(cfg: ServerConfig) -> Result<Self> {
        Self::with_parts(cfg, Arc::new(MetricRegistry::new()), Arc::new(InMemoryTripStore::new()))
    }

    /// Build state around an existing registry and store.
    ///
    /// Fails if the HTTP metric names are already taken in `registry` by
    /// families with a different shape.
    pub fn with_parts(
        cfg: ServerConfig,
        registry: Arc<MetricRegistry>,
        trips: Arc<dyn TripStore>,
    ) -> Result<Self> {
        let instrumentation = Arc::new(RequestInstrumentation::register(
            Arc::clone(&registry),
            &cfg.metrics,
        )?);

        Ok(Self {
            inner: Arc::new(AppStateInner {
                cfg,
                registry,
                instrumentation,
                trips,
            }),
        })
    }

    pub fn cfg(&self) -> &ServerConfig {
        &self.inner.cfg
    }

    pub fn registry(&self) -> &Arc<MetricRegistry> {
        &self.inner.registry
    }

    pub fn instrumentation(&self) -> &Arc<RequestInstrumentation> {
        &self.inner.instrumentation
    }

    pub fn trips(&self) -> &Arc<dyn TripStore> {
        &self.inner.trips
    }
}
