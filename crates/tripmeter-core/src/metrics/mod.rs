//! In-process metrics: labeled counters and histograms, a registry that owns
//! them, and a Prometheus text renderer.

pub mod counter;
pub mod exposition;
pub mod histogram;
pub mod labels;
pub mod registry;

pub use exposition::{render, CONTENT_TYPE};
pub use histogram::{Buckets, HistogramSnapshot, DEFAULT_BUCKETS};
pub use labels::LabelSet;
pub use registry::{
    FamilyHandle, FamilySnapshot, FamilyType, MetricKind, MetricRegistry, SeriesSnapshot,
    SeriesValue,
};
