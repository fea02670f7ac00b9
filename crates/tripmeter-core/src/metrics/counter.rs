use std::sync::atomic::{AtomicU64, Ordering};

/// One counter series. Only ever incremented.
#[derive(Debug, Default)]
pub struct CounterSeries {
    value: AtomicU64,
}

impl CounterSeries {
    pub fn inc_by(&self, delta: u64) {
        self.value.fetch_add(delta, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.value.load(Ordering::Relaxed)
    }
}
