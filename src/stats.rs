//! Run statistics
//!
//! Workers count locally in [`WorkerCounters`] and flush once at the end
//! barrier, so the hot loop never touches a shared cache line.

use std::sync::atomic::{AtomicU64, Ordering};

/// Per-worker counters, owned by the worker thread
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerCounters {
    pub iterations: u64,
    pub frames_produced: u64,
    pub bytes_produced: u64,
    /// `acquire()` found no space
    pub acquire_misses: u64,
    pub frames_consumed: u64,
    pub bytes_consumed: u64,
    /// `consume()` found nothing ready
    pub empty_polls: u64,
}

/// Totals across all workers
#[derive(Debug, Default)]
pub struct StressStats {
    pub iterations: AtomicU64,
    pub frames_produced: AtomicU64,
    pub bytes_produced: AtomicU64,
    pub acquire_misses: AtomicU64,
    pub frames_consumed: AtomicU64,
    pub bytes_consumed: AtomicU64,
    pub empty_polls: AtomicU64,
}

impl StressStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn absorb(&self, c: &WorkerCounters) {
        self.iterations.fetch_add(c.iterations, Ordering::Relaxed);
        self.frames_produced
            .fetch_add(c.frames_produced, Ordering::Relaxed);
        self.bytes_produced
            .fetch_add(c.bytes_produced, Ordering::Relaxed);
        self.acquire_misses
            .fetch_add(c.acquire_misses, Ordering::Relaxed);
        self.frames_consumed
            .fetch_add(c.frames_consumed, Ordering::Relaxed);
        self.bytes_consumed
            .fetch_add(c.bytes_consumed, Ordering::Relaxed);
        self.empty_polls.fetch_add(c.empty_polls, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            iterations: self.iterations.load(Ordering::Relaxed),
            frames_produced: self.frames_produced.load(Ordering::Relaxed),
            bytes_produced: self.bytes_produced.load(Ordering::Relaxed),
            acquire_misses: self.acquire_misses.load(Ordering::Relaxed),
            frames_consumed: self.frames_consumed.load(Ordering::Relaxed),
            bytes_consumed: self.bytes_consumed.load(Ordering::Relaxed),
            empty_polls: self.empty_polls.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`StressStats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub iterations: u64,
    pub frames_produced: u64,
    pub bytes_produced: u64,
    pub acquire_misses: u64,
    pub frames_consumed: u64,
    pub bytes_consumed: u64,
    pub empty_polls: u64,
}

impl StatsSnapshot {
    /// Bytes published but not consumed when the run stopped
    pub fn bytes_in_flight(&self) -> u64 {
        self.bytes_produced.saturating_sub(self.bytes_consumed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absorb_accumulates() {
        let stats = StressStats::new();
        let producer = WorkerCounters {
            iterations: 10,
            frames_produced: 4,
            bytes_produced: 40,
            acquire_misses: 6,
            ..Default::default()
        };
        let consumer = WorkerCounters {
            iterations: 7,
            frames_consumed: 3,
            bytes_consumed: 30,
            empty_polls: 4,
            ..Default::default()
        };
        stats.absorb(&producer);
        stats.absorb(&producer);
        stats.absorb(&consumer);

        let snap = stats.snapshot();
        assert_eq!(snap.iterations, 27);
        assert_eq!(snap.frames_produced, 8);
        assert_eq!(snap.bytes_produced, 80);
        assert_eq!(snap.acquire_misses, 12);
        assert_eq!(snap.frames_consumed, 3);
        assert_eq!(snap.empty_polls, 4);
        assert_eq!(snap.bytes_in_flight(), 50);
    }
}
