//! Per-request HTTP instrumentation.
//!
//! Two-phase contract: [`RequestInstrumentation::begin`] captures a monotonic
//! start and returns a [`RequestToken`]; finishing the token records one
//! duration observation, one request count and, for `status >= 400`, one
//! error count, all labeled `{method, route, status}`.
//!
//! A token dropped without being finished (handler panic, cancelled request
//! future) records itself as a 500, so every begun request finishes once.
//! Recording failures are logged and never reach the response path.

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    extract::{MatchedPath, Request, State},
    middleware::Next,
    response::Response,
};
use tripmeter_core::error::Result;
use tripmeter_core::metrics::{FamilyHandle, LabelSet, MetricRegistry};

use crate::app_state::AppState;
use crate::config::MetricsSection;

const LABELS: [&str; 3] = ["method", "route", "status"];

/// Status recorded for requests whose token was dropped unfinished.
const ABANDONED_STATUS: u16 = 500;

/// Labels attached to every HTTP sample.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpLabels {
    pub method: String,
    /// Matched route template, or the raw path when nothing matched.
    pub route: String,
    pub status: u16,
}

impl HttpLabels {
    pub fn is_error(&self) -> bool {
        self.status >= 400
    }
}

impl From<&HttpLabels> for LabelSet {
    fn from(l: &HttpLabels) -> Self {
        LabelSet::new()
            .with("method", l.method.as_str())
            .with("route", l.route.as_str())
            .with("status", l.status.to_string())
    }
}

/// Pick the label used for `route`.
///
/// Unmatched requests keep their literal path, so probing arbitrary URLs grows
/// the series count without bound.
pub fn resolve_route(matched: Option<&str>, path: &str) -> String {
    matched.unwrap_or(path).to_string()
}

/// Metric families updated on every HTTP transaction.
pub struct RequestInstrumentation {
    registry: Arc<MetricRegistry>,
    requests: FamilyHandle,
    errors: FamilyHandle,
    duration: FamilyHandle,
}

impl RequestInstrumentation {
    /// Register (or re-acquire) the HTTP families in `registry`.
    pub fn register(registry: Arc<MetricRegistry>, cfg: &MetricsSection) -> Result<Self> {
        let requests = registry.register_counter(
            &cfg.requests_total,
            "Total number of HTTP requests",
            &LABELS,
        )?;
        let errors = registry.register_counter(
            &cfg.errors_total,
            "Total number of failed HTTP requests",
            &LABELS,
        )?;
        let duration = registry.register_histogram(
            &cfg.request_duration,
            "Duration of HTTP requests in seconds",
            cfg.buckets()?,
            &LABELS,
        )?;

        Ok(Self {
            registry,
            requests,
            errors,
            duration,
        })
    }

    pub fn registry(&self) -> &Arc<MetricRegistry> {
        &self.registry
    }

    pub fn requests(&self) -> &FamilyHandle {
        &self.requests
    }

    pub fn errors(&self) -> &FamilyHandle {
        &self.errors
    }

    pub fn duration(&self) -> &FamilyHandle {
        &self.duration
    }

    /// `Started`: capture the start instant for one request.
    pub fn begin(self: &Arc<Self>, method: &str, route: String) -> RequestToken {
        RequestToken {
            instr: Arc::clone(self),
            method: method.to_string(),
            route,
            start: Instant::now(),
            finished: false,
        }
    }

    /// `Finished`: record the outcome of a request begun with [`Self::begin`].
    pub fn end(&self, token: RequestToken, status: u16) {
        token.finish(status);
    }

    /// Record one completed transaction.
    pub fn record(&self, labels: &HttpLabels, elapsed: Duration) {
        if let Err(e) = self.try_record(labels, elapsed) {
            tracing::warn!(
                error = %e,
                method = %labels.method,
                route = %labels.route,
                status = labels.status,
                "failed to record http metrics"
            );
        }
    }

    fn try_record(&self, labels: &HttpLabels, elapsed: Duration) -> Result<()> {
        let set = LabelSet::from(labels);
        self.registry
            .observe(&self.duration, &set, elapsed.as_secs_f64())?;
        self.registry.inc(&self.requests, &set)?;
        if labels.is_error() {
            self.registry.inc(&self.errors, &set)?;
        }
        Ok(())
    }
}

/// In-flight request handle returned by [`RequestInstrumentation::begin`].
pub struct RequestToken {
    instr: Arc<RequestInstrumentation>,
    method: String,
    route: String,
    start: Instant,
    finished: bool,
}

impl RequestToken {
    pub fn route(&self) -> &str {
        &self.route
    }

    /// Record the request with its final status.
    pub fn finish(mut self, status: u16) {
        self.complete(status);
    }

    fn complete(&mut self, status: u16) {
        if self.finished {
            return;
        }
        self.finished = true;

        let labels = HttpLabels {
            method: std::mem::take(&mut self.method),
            route: std::mem::take(&mut self.route),
            status,
        };
        self.instr.record(&labels, self.start.elapsed());
    }
}

impl Drop for RequestToken {
    fn drop(&mut self) {
        if !self.finished {
            tracing::debug!(route = %self.route, "request dropped before completion");
            self.complete(ABANDONED_STATUS);
        }
    }
}

/// Axum middleware driving [`RequestInstrumentation`] for every request.
///
/// Must be installed with `Router::layer` so that `MatchedPath` is already
/// present in the request extensions.
pub async fn track_http(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let route = resolve_route(
        req.extensions().get::<MatchedPath>().map(MatchedPath::as_str),
        req.uri().path(),
    );
    let token = state.instrumentation().begin(req.method().as_str(), route);

    let response = next.run(req).await;

    token.finish(response.status().as_u16());
    response
}
