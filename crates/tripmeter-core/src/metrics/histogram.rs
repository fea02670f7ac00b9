//! Histogram bucket layout and per-series state.
//!
//! Bucket counts are stored cumulatively: an observation increments every
//! bucket whose upper bound is `>=` the value, so a snapshot never needs to
//! sum neighbours. The implicit `+Inf` bucket is the observation count.

use std::sync::{Mutex, PoisonError};

use crate::error::{Result, TripmeterError};

/// Default latency buckets, in seconds.
pub const DEFAULT_BUCKETS: [f64; 7] = [0.1, 0.3, 0.5, 0.7, 1.0, 3.0, 5.0];

/// Validated, strictly increasing finite upper bounds.
#[derive(Debug, Clone, PartialEq)]
pub struct Buckets(Vec<f64>);

impl Buckets {
    /// Validate bucket bounds. A trailing `+Inf` is accepted and dropped, as it
    /// is always implied.
    pub fn new(bounds: &[f64]) -> Result<Self> {
        let mut bounds = bounds.to_vec();
        if bounds.last() == Some(&f64::INFINITY) {
            bounds.pop();
        }
        if bounds.is_empty() {
            return Err(TripmeterError::InvalidBuckets(
                "at least one finite bucket is required".into(),
            ));
        }
        if let Some(b) = bounds.iter().find(|b| !b.is_finite()) {
            return Err(TripmeterError::InvalidBuckets(format!(
                "bucket bound {b} is not finite"
            )));
        }
        if let Some(w) = bounds.windows(2).find(|w| w[0] >= w[1]) {
            return Err(TripmeterError::InvalidBuckets(format!(
                "buckets must be strictly increasing ({} >= {})",
                w[0], w[1]
            )));
        }
        Ok(Self(bounds))
    }

    pub fn bounds(&self) -> &[f64] {
        &self.0
    }
}

impl Default for Buckets {
    fn default() -> Self {
        Self(DEFAULT_BUCKETS.to_vec())
    }
}

#[derive(Debug, Clone, PartialEq)]
struct HistogramState {
    cumulative: Vec<u64>,
    sum: f64,
    count: u64,
}

/// One histogram series. Bucket counts, sum and count for an observation are
/// updated together under one lock, so readers never see a torn triad.
#[derive(Debug)]
pub struct HistogramSeries {
    state: Mutex<HistogramState>,
}

/// Point-in-time copy of a histogram series.
#[derive(Debug, Clone, PartialEq)]
pub struct HistogramSnapshot {
    /// `(upper_bound, cumulative_count)` for each finite bucket, ascending.
    pub buckets: Vec<(f64, u64)>,
    pub sum: f64,
    /// Observation count; also the `+Inf` bucket.
    pub count: u64,
}

impl HistogramSeries {
    pub fn new(buckets: &Buckets) -> Self {
        Self {
            state: Mutex::new(HistogramState {
                cumulative: vec![0; buckets.bounds().len()],
                sum: 0.0,
                count: 0,
            }),
        }
    }

    /// Record `value`. Callers reject non-finite values before getting here.
    pub fn observe(&self, buckets: &Buckets, value: f64) {
        // Start at the first bound that admits the value (`le` is inclusive).
        let first = buckets.bounds().partition_point(|b| *b < value);

        let mut st = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        for c in &mut st.cumulative[first..] {
            *c += 1;
        }
        st.sum += value;
        st.count += 1;
    }

    pub fn snapshot(&self, buckets: &Buckets) -> HistogramSnapshot {
        let st = self
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        HistogramSnapshot {
            buckets: buckets.bounds().iter().copied().zip(st.cumulative).collect(),
            sum: st.sum,
            count: st.count,
        }
    }
}
