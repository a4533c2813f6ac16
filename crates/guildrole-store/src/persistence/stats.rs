//! Flush counters

use std::sync::atomic::{AtomicU64, Ordering};

/// Per-store counters of flush outcomes
///
/// Each flush attempts one snapshot write and, when a mirror is attached,
/// one mirror write; each attempt increments exactly one of the pair.
#[derive(Debug, Default)]
pub struct FlushStats {
    snapshot_writes: AtomicU64,
    snapshot_failures: AtomicU64,
    mirror_writes: AtomicU64,
    mirror_failures: AtomicU64,
}

impl FlushStats {
    pub fn snapshot_writes(&self) -> u64 {
        self.snapshot_writes.load(Ordering::Acquire)
    }

    pub fn snapshot_failures(&self) -> u64 {
        self.snapshot_failures.load(Ordering::Acquire)
    }

    pub fn mirror_writes(&self) -> u64 {
        self.mirror_writes.load(Ordering::Acquire)
    }

    pub fn mirror_failures(&self) -> u64 {
        self.mirror_failures.load(Ordering::Acquire)
    }

    /// Number of flush cycles that ran, successful or not
    pub fn flushes(&self) -> u64 {
        self.snapshot_writes() + self.snapshot_failures()
    }

    pub(crate) fn record_snapshot(&self, ok: bool) {
        let counter = if ok {
            &self.snapshot_writes
        } else {
            &self.snapshot_failures
        };
        counter.fetch_add(1, Ordering::AcqRel);
    }

    pub(crate) fn record_mirror(&self, ok: bool) {
        let counter = if ok {
            &self.mirror_writes
        } else {
            &self.mirror_failures
        };
        counter.fetch_add(1, Ordering::AcqRel);
    }
}
