//! Page store statistics tracking.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Counters maintained by the bundled page stores.
///
/// All fields are atomic so a store can update them through `&self`.
/// `Ordering::Relaxed` is enough: counters are independent and only need
/// atomicity.
///
/// # Example
/// ```
/// use cowbtree::StoreStats;
/// use std::sync::atomic::Ordering;
///
/// let stats = StoreStats::new();
/// stats.allocations.fetch_add(1, Ordering::Relaxed);
/// assert_eq!(stats.snapshot().allocations, 1);
/// ```
#[derive(Debug)]
pub struct StoreStats {
    /// Number of `get` calls served.
    pub gets: AtomicU64,

    /// Number of pages allocated.
    pub allocations: AtomicU64,

    /// Number of pages freed.
    pub frees: AtomicU64,

    /// Number of pages read from disk.
    pub pages_read: AtomicU64,

    /// Number of pages written to disk.
    pub pages_written: AtomicU64,
}

impl StoreStats {
    /// Create a new stats tracker with all counters at zero.
    pub fn new() -> Self {
        Self {
            gets: AtomicU64::new(0),
            allocations: AtomicU64::new(0),
            frees: AtomicU64::new(0),
            pages_read: AtomicU64::new(0),
            pages_written: AtomicU64::new(0),
        }
    }

    #[inline]
    pub(crate) fn record_get(&self) {
        self.gets.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_allocation(&self) {
        self.allocations.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_free(&self) {
        self.frees.fetch_add(1, Ordering::Relaxed);
    }

    /// Get a non-atomic copy of the current counters.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            gets: self.gets.load(Ordering::Relaxed),
            allocations: self.allocations.load(Ordering::Relaxed),
            frees: self.frees.load(Ordering::Relaxed),
            pages_read: self.pages_read.load(Ordering::Relaxed),
            pages_written: self.pages_written.load(Ordering::Relaxed),
        }
    }

    /// Reset all counters to zero.
    pub fn reset(&self) {
        self.gets.store(0, Ordering::Relaxed);
        self.allocations.store(0, Ordering::Relaxed);
        self.frees.store(0, Ordering::Relaxed);
        self.pages_read.store(0, Ordering::Relaxed);
        self.pages_written.store(0, Ordering::Relaxed);
    }
}

impl Default for StoreStats {
    fn default() -> Self {
        Self::new()
    }
}

/// A point-in-time snapshot of store statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatsSnapshot {
    pub gets: u64,
    pub allocations: u64,
    pub frees: u64,
    pub pages_read: u64,
    pub pages_written: u64,
}

impl StatsSnapshot {
    /// Pages allocated and not yet freed.
    pub fn live_pages(&self) -> u64 {
        self.allocations.saturating_sub(self.frees)
    }
}

impl fmt::Display for StatsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Stats {{ gets: {}, allocations: {}, frees: {}, live: {} }}",
            self.gets,
            self.allocations,
            self.frees,
            self.live_pages()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_and_reset() {
        let stats = StoreStats::new();
        stats.record_get();
        stats.record_allocation();
        stats.record_allocation();
        stats.record_free();

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.gets, 1);
        assert_eq!(snapshot.allocations, 2);
        assert_eq!(snapshot.frees, 1);
        assert_eq!(snapshot.live_pages(), 1);

        stats.reset();
        assert_eq!(stats.snapshot(), StatsSnapshot::default());
    }

    #[test]
    fn test_display() {
        let stats = StoreStats::new();
        stats.allocations.fetch_add(5, Ordering::Relaxed);
        stats.frees.fetch_add(2, Ordering::Relaxed);

        let display = format!("{}", stats.snapshot());
        assert!(display.contains("allocations: 5"));
        assert!(display.contains("live: 3"));
    }
}
