//! Store Metrics
//!
//! Operation counters shared by every handle of a store.

use std::sync::atomic::{AtomicU64, Ordering};

/// Metrics collector
#[derive(Debug, Default)]
pub struct StoreMetrics {
    sets: AtomicU64,
    hits: AtomicU64,
    misses: AtomicU64,

    /// Misses caused by an entry past its deadline
    expired_reads: AtomicU64,

    deletes: AtomicU64,
    swept: AtomicU64,
}

impl StoreMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub(crate) fn record_set(&self) {
        self.sets.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_miss(&self, expired: bool) {
        self.misses.fetch_add(1, Ordering::Relaxed);
        if expired {
            self.expired_reads.fetch_add(1, Ordering::Relaxed);
        }
    }

    #[inline]
    pub(crate) fn record_delete(&self) {
        self.deletes.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_swept(&self, removed: usize) {
        self.swept.fetch_add(removed as u64, Ordering::Relaxed);
    }

    /// Point-in-time copy of all counters
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            sets: self.sets.load(Ordering::Relaxed),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            expired_reads: self.expired_reads.load(Ordering::Relaxed),
            deletes: self.deletes.load(Ordering::Relaxed),
            swept: self.swept.load(Ordering::Relaxed),
        }
    }
}

/// Plain counter values read from `StoreMetrics`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub sets: u64,
    pub hits: u64,
    pub misses: u64,
    pub expired_reads: u64,
    pub deletes: u64,
    pub swept: u64,
}

impl MetricsSnapshot {
    /// Fraction of reads that found a live entry (0.0 with no reads)
    pub fn hit_ratio(&self) -> f64 {
        let reads = self.hits + self.misses;
        if reads == 0 {
            return 0.0;
        }
        self.hits as f64 / reads as f64
    }

    pub fn summary(&self) -> String {
        format!(
            "Sets: {} | Reads: hits={}, misses={} (expired={}), ratio={:.2} | Deletes: {} | Swept: {}",
            self.sets,
            self.hits,
            self.misses,
            self.expired_reads,
            self.hit_ratio(),
            self.deletes,
            self.swept
        )
    }
}
