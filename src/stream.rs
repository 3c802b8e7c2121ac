//! Shared atomic helpers for parallel counter distribution and early-stop coordination.
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Atomically distributed monotonically increasing counters, optionally capped.
#[derive(Debug)]
pub struct CounterSource {
    next: AtomicU64,
    limit: Option<u64>,
}

impl CounterSource {
    /// Create a counter source starting from `start`, handing out values below `limit`.
    pub const fn new(start: u64, limit: Option<u64>) -> Self {
        Self {
            next: AtomicU64::new(start),
            limit,
        }
    }

    /// Reserve and return the next counter, or `None` once the space is exhausted.
    #[inline]
    pub fn fetch(&self) -> Option<u64> {
        let value = self.next.fetch_add(1, Ordering::Relaxed);
        if value == u64::MAX {
            return None;
        }
        match self.limit {
            Some(limit) if value >= limit => None,
            _ => Some(value),
        }
    }
}

/// Lowest satisfying counter seen so far, shared by all workers.
///
/// A worker may stop as soon as the counter it would test next is above the
/// best hit: every lower counter has already been handed to some worker.
#[derive(Debug)]
pub struct BestCounter {
    best: AtomicU64,
    stop: AtomicBool,
}

impl BestCounter {
    pub const fn new() -> Self {
        Self {
            best: AtomicU64::new(u64::MAX),
            stop: AtomicBool::new(false),
        }
    }

    /// Record a hit at `counter`.
    pub fn record(&self, counter: u64) {
        self.best.fetch_min(counter, Ordering::SeqCst);
    }

    /// Whether testing `counter` can still improve on the best hit.
    #[inline]
    pub fn should_stop(&self, counter: u64) -> bool {
        self.stop.load(Ordering::Relaxed) || counter > self.best.load(Ordering::Relaxed)
    }

    /// Force stop (e.g., on fatal error).
    pub fn force_stop(&self) {
        self.stop.store(true, Ordering::SeqCst);
    }
}

impl Default for BestCounter {
    fn default() -> Self {
        Self::new()
    }
}
