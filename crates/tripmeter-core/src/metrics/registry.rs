//! Metric registry: owns every metric family and routes updates to series.
//!
//! Families are kept in registration order behind a read-mostly lock; series
//! live in a per-family `DashMap`, so observations on different label sets only
//! share a shard lock briefly and never the family list.

use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use dashmap::DashMap;

use crate::error::{Result, TripmeterError};

use super::counter::CounterSeries;
use super::histogram::{Buckets, HistogramSeries, HistogramSnapshot};
use super::labels::LabelSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    Counter,
    Histogram,
}

impl MetricKind {
    pub fn as_str(self) -> &'static str {
        match self {
            MetricKind::Counter => "counter",
            MetricKind::Histogram => "histogram",
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind requested at registration; histograms carry their bucket layout.
#[derive(Debug, Clone, PartialEq)]
pub enum FamilyType {
    Counter,
    Histogram(Buckets),
}

impl FamilyType {
    pub fn kind(&self) -> MetricKind {
        match self {
            FamilyType::Counter => MetricKind::Counter,
            FamilyType::Histogram(_) => MetricKind::Histogram,
        }
    }
}

enum Series {
    Counter(DashMap<LabelSet, CounterSeries>),
    Histogram {
        buckets: Buckets,
        series: DashMap<LabelSet, HistogramSeries>,
    },
}

struct MetricFamily {
    name: String,
    help: String,
    /// Declared order, used for exposition.
    label_names: Vec<String>,
    /// Sorted, used to validate incoming label sets.
    sorted_names: Vec<String>,
    series: Series,
}

impl MetricFamily {
    fn family_type(&self) -> FamilyType {
        match &self.series {
            Series::Counter(_) => FamilyType::Counter,
            Series::Histogram { buckets, .. } => FamilyType::Histogram(buckets.clone()),
        }
    }

    fn kind(&self) -> MetricKind {
        match self.series {
            Series::Counter(_) => MetricKind::Counter,
            Series::Histogram { .. } => MetricKind::Histogram,
        }
    }

    fn check_labels(&self, labels: &LabelSet) -> Result<()> {
        if labels.matches(&self.sorted_names) {
            return Ok(());
        }
        Err(TripmeterError::LabelMismatch {
            metric: self.name.clone(),
            expected: self.sorted_names.clone(),
            got: labels.names().map(str::to_string).collect(),
        })
    }

    fn wrong_kind(&self, expected: MetricKind) -> TripmeterError {
        TripmeterError::WrongMetricKind {
            metric: self.name.clone(),
            expected,
            actual: self.kind(),
        }
    }

    fn snapshot(&self) -> FamilySnapshot {
        let mut series: Vec<SeriesSnapshot> = match &self.series {
            Series::Counter(map) => map
                .iter()
                .map(|r| SeriesSnapshot {
                    labels: r.key().clone(),
                    value: SeriesValue::Counter(r.value().get()),
                })
                .collect(),
            Series::Histogram { buckets, series } => series
                .iter()
                .map(|r| SeriesSnapshot {
                    labels: r.key().clone(),
                    value: SeriesValue::Histogram(r.value().snapshot(buckets)),
                })
                .collect(),
        };
        series.sort_by(|a, b| a.labels.cmp(&b.labels));

        FamilySnapshot {
            name: self.name.clone(),
            help: self.help.clone(),
            kind: self.kind(),
            label_names: self.label_names.clone(),
            series,
        }
    }
}

/// Cheap, cloneable reference to a registered family.
#[derive(Clone)]
pub struct FamilyHandle(Arc<MetricFamily>);

impl FamilyHandle {
    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn help(&self) -> &str {
        &self.0.help
    }

    pub fn kind(&self) -> MetricKind {
        self.0.kind()
    }

    pub fn label_names(&self) -> &[String] {
        &self.0.label_names
    }

    /// Whether both handles refer to the same registered family.
    pub fn same_family(&self, other: &FamilyHandle) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for FamilyHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FamilyHandle")
            .field("name", &self.0.name)
            .field("kind", &self.0.kind())
            .field("label_names", &self.0.label_names)
            .finish()
    }
}

/// Point-in-time copy of one family.
#[derive(Debug, Clone, PartialEq)]
pub struct FamilySnapshot {
    pub name: String,
    pub help: String,
    pub kind: MetricKind,
    pub label_names: Vec<String>,
    /// Sorted by label set so repeated renders diff cleanly.
    pub series: Vec<SeriesSnapshot>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SeriesSnapshot {
    pub labels: LabelSet,
    pub value: SeriesValue,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SeriesValue {
    Counter(u64),
    Histogram(HistogramSnapshot),
}

/// Registry of metric families.
///
/// Construct once at startup and share via `Arc`; there is no global instance.
/// Every distinct label set creates a series that lives until the registry is
/// dropped, so callers must keep label values to a bounded domain.
#[derive(Default)]
pub struct MetricRegistry {
    families: RwLock<Vec<FamilyHandle>>,
}

impl MetricRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a family, or return the existing handle when `name` is already
    /// registered with exactly the same help, type and label names.
    pub fn register(
        &self,
        name: &str,
        help: &str,
        ty: FamilyType,
        label_names: &[&str],
    ) -> Result<FamilyHandle> {
        validate_metric_name(name)?;
        validate_label_names(name, &ty, label_names)?;

        let mut families = self
            .families
            .write()
            .unwrap_or_else(PoisonError::into_inner);

        if let Some(existing) = families.iter().find(|f| f.name() == name) {
            let fam = &existing.0;
            let same = fam.help == help
                && fam.family_type() == ty
                && fam
                    .label_names
                    .iter()
                    .map(String::as_str)
                    .eq(label_names.iter().copied());
            if same {
                return Ok(existing.clone());
            }
            tracing::warn!(metric = %name, "conflicting metric registration");
            return Err(TripmeterError::DuplicateMetricName {
                name: name.to_string(),
            });
        }

        let label_names: Vec<String> = label_names.iter().map(|s| s.to_string()).collect();
        let mut sorted_names = label_names.clone();
        sorted_names.sort();

        let series = match ty {
            FamilyType::Counter => Series::Counter(DashMap::new()),
            FamilyType::Histogram(buckets) => Series::Histogram {
                buckets,
                series: DashMap::new(),
            },
        };

        let handle = FamilyHandle(Arc::new(MetricFamily {
            name: name.to_string(),
            help: help.to_string(),
            label_names,
            sorted_names,
            series,
        }));
        tracing::debug!(metric = %name, kind = %handle.kind(), "metric family registered");
        families.push(handle.clone());
        Ok(handle)
    }

    pub fn register_counter(
        &self,
        name: &str,
        help: &str,
        label_names: &[&str],
    ) -> Result<FamilyHandle> {
        self.register(name, help, FamilyType::Counter, label_names)
    }

    pub fn register_histogram(
        &self,
        name: &str,
        help: &str,
        buckets: Buckets,
        label_names: &[&str],
    ) -> Result<FamilyHandle> {
        self.register(name, help, FamilyType::Histogram(buckets), label_names)
    }

    /// Record one observation into a histogram series, creating it on first use.
    pub fn observe(&self, handle: &FamilyHandle, labels: &LabelSet, value: f64) -> Result<()> {
        let fam = &handle.0;
        let Series::Histogram { buckets, series } = &fam.series else {
            return Err(fam.wrong_kind(MetricKind::Histogram));
        };
        fam.check_labels(labels)?;
        if !value.is_finite() {
            return Err(TripmeterError::InvalidObservation {
                metric: fam.name.clone(),
                value,
            });
        }

        if let Some(s) = series.get(labels) {
            s.observe(buckets, value);
            return Ok(());
        }
        series
            .entry(labels.clone())
            .or_insert_with(|| HistogramSeries::new(buckets))
            .observe(buckets, value);
        Ok(())
    }

    /// Add `delta` to a counter series, creating it on first use.
    pub fn increment(&self, handle: &FamilyHandle, labels: &LabelSet, delta: u64) -> Result<()> {
        let fam = &handle.0;
        let Series::Counter(series) = &fam.series else {
            return Err(fam.wrong_kind(MetricKind::Counter));
        };
        fam.check_labels(labels)?;

        if let Some(s) = series.get(labels) {
            s.inc_by(delta);
            return Ok(());
        }
        series.entry(labels.clone()).or_default().inc_by(delta);
        Ok(())
    }

    /// Increment a counter series by one.
    pub fn inc(&self, handle: &FamilyHandle, labels: &LabelSet) -> Result<()> {
        self.increment(handle, labels, 1)
    }

    /// Current value of one counter series; `None` if it was never touched.
    pub fn counter_value(&self, handle: &FamilyHandle, labels: &LabelSet) -> Result<Option<u64>> {
        let fam = &handle.0;
        let Series::Counter(series) = &fam.series else {
            return Err(fam.wrong_kind(MetricKind::Counter));
        };
        fam.check_labels(labels)?;
        Ok(series.get(labels).map(|s| s.get()))
    }

    /// Current state of one histogram series; `None` if it was never touched.
    pub fn histogram_snapshot(
        &self,
        handle: &FamilyHandle,
        labels: &LabelSet,
    ) -> Result<Option<HistogramSnapshot>> {
        let fam = &handle.0;
        let Series::Histogram { buckets, series } = &fam.series else {
            return Err(fam.wrong_kind(MetricKind::Histogram));
        };
        fam.check_labels(labels)?;
        Ok(series.get(labels).map(|s| s.snapshot(buckets)))
    }

    /// Deep copy of every family in registration order.
    ///
    /// Each series is read under its own lock, so no bucket/sum/count triad is
    /// torn. Families are not frozen against each other.
    pub fn snapshot(&self) -> Vec<FamilySnapshot> {
        let families: Vec<FamilyHandle> = self
            .families
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        families.iter().map(|h| h.0.snapshot()).collect()
    }

    pub fn len(&self) -> usize {
        self.families
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn validate_metric_name(name: &str) -> Result<()> {
    let mut chars = name.chars();
    let head_ok = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_' || c == ':');
    if head_ok && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == ':') {
        return Ok(());
    }
    Err(TripmeterError::InvalidMetricName(name.to_string()))
}

fn validate_label_names(metric: &str, ty: &FamilyType, names: &[&str]) -> Result<()> {
    for (i, n) in names.iter().enumerate() {
        let mut chars = n.chars();
        let head_ok = chars
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
        if !head_ok
            || !chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
            || n.starts_with("__")
        {
            return Err(TripmeterError::InvalidMetricName(format!("{metric}: label {n}")));
        }
        if names[..i].contains(n) {
            return Err(TripmeterError::InvalidMetricName(format!(
                "{metric}: duplicate label {n}"
            )));
        }
        // `le` is reserved for histogram bucket bounds.
        if *n == "le" && matches!(ty, FamilyType::Histogram(_)) {
            return Err(TripmeterError::InvalidMetricName(format!(
                "{metric}: label le is reserved"
            )));
        }
    }
    Ok(())
}
