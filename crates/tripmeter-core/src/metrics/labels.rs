//! Label sets identifying one time series within a metric family.
//!
//! Pairs are flattened into a vector sorted by label name, so insertion order
//! never affects equality, hashing, or lookup.

/// Ordered `(name, value)` pairs identifying one series.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LabelSet {
    pairs: Vec<(String, String)>,
}

impl LabelSet {
    /// Empty label set (for families declared without labels).
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a label, returning the updated set.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(name, value);
        self
    }

    /// Insert a label. A label name given twice is kept twice, which the
    /// owning family rejects as a mismatch.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let pair = (name.into(), value.into());
        let at = self.pairs.partition_point(|p| p.0 <= pair.0);
        self.pairs.insert(at, pair);
    }

    /// Value for `name`, if present.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.pairs
            .binary_search_by(|(k, _)| k.as_str().cmp(name))
            .ok()
            .map(|i| self.pairs[i].1.as_str())
    }

    /// Label names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.pairs.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// True when this set carries exactly `sorted_names`, no more, no fewer.
    pub(crate) fn matches(&self, sorted_names: &[String]) -> bool {
        self.pairs.len() == sorted_names.len()
            && self.pairs.iter().zip(sorted_names).all(|((k, _), n)| k == n)
    }
}

impl<K, V> FromIterator<(K, V)> for LabelSet
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut set = LabelSet::new();
        for (k, v) in iter {
            set.insert(k, v);
        }
        set
    }
}

impl<K, V, const N: usize> From<[(K, V); N]> for LabelSet
where
    K: Into<String>,
    V: Into<String>,
{
    fn from(pairs: [(K, V); N]) -> Self {
        pairs.into_iter().collect()
    }
}
