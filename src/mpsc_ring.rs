//! MpscRing - lock-free multi-producer/single-consumer byte ring
//!
//! Reference implementation of [`RingBuffer`] so the harness has something
//! to run against. Producers race on a single `next` offset with CAS; the
//! consumer owns `written`.
//!
//! # Offsets
//!
//! ```text
//!  63       62 ............ 32 31 ............. 0
//! ┌─────────┬─────────────────┬─────────────────┐
//! │ WRAP    │ wrap counter    │ byte offset     │   next
//! │ LOCK    │ (ABA guard)     │                 │
//! └─────────┴─────────────────┴─────────────────┘
//! ```
//!
//! # Protocol
//!
//! - A producer publishes the `next` it observed in its slot (`seen`) with the
//!   lock bit set while it computes the target, then clears the bit once its
//!   CAS lands. `produce()` resets `seen` to `OFF_MAX`.
//! - The consumer reads up to the smallest `seen` that is not behind
//!   `written`, so in-flight reservations are never handed out.
//! - A producer that would run past the end takes the wrap lock, records the
//!   cut-off in `end`, and restarts at offset 0.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use crossbeam_utils::{Backoff, CachePadded};

use crate::error::RingError;
use crate::ringbuf::{Footprint, RingBuffer, Span};

const OFF_MASK: u64 = 0x0000_0000_ffff_ffff;
const WRAP_LOCK_BIT: u64 = 0x8000_0000_0000_0000;
const OFF_MAX: u64 = u64::MAX & !WRAP_LOCK_BIT;
const WRAP_COUNTER: u64 = 0x7fff_ffff_0000_0000;

#[inline]
fn wrap_incr(x: u64) -> u64 {
    (x + 0x1_0000_0000) & WRAP_COUNTER
}

struct WorkerSlot {
    seen_off: AtomicU64,
    registered: AtomicBool,
}

impl WorkerSlot {
    fn new() -> Self {
        Self {
            seen_off: AtomicU64::new(OFF_MAX),
            registered: AtomicBool::new(false),
        }
    }

    /// `seen` once its lock bit is clear
    fn stable_seen(&self) -> u64 {
        let backoff = Backoff::new();
        loop {
            let seen = self.seen_off.load(Ordering::Acquire);
            if seen & WRAP_LOCK_BIT == 0 {
                return seen;
            }
            backoff.snooze();
        }
    }
}

/// Registration record: index of the claimed worker slot
#[derive(Debug)]
pub struct RingWorker {
    slot: usize,
}

pub struct MpscRing {
    space: u64,
    next: CachePadded<AtomicU64>,
    /// Cut-off left by the producer that wrapped; `OFF_MAX` when unset
    end: AtomicU64,
    /// Consumer position; only the consumer stores
    written: CachePadded<AtomicU64>,
    slots: Box<[CachePadded<WorkerSlot>]>,
}

impl MpscRing {
    /// `next` once no producer holds the wrap lock
    fn stable_next(&self) -> u64 {
        let backoff = Backoff::new();
        loop {
            let next = self.next.load(Ordering::Acquire);
            if next & WRAP_LOCK_BIT == 0 {
                return next;
            }
            backoff.snooze();
        }
    }
}

impl RingBuffer for MpscRing {
    type Worker = RingWorker;

    fn footprint(_capacity: usize, workers: usize) -> Footprint {
        Footprint {
            control_bytes: std::mem::size_of::<Self>()
                + workers * std::mem::size_of::<CachePadded<WorkerSlot>>(),
            worker_bytes: std::mem::size_of::<RingWorker>(),
        }
    }

    fn setup(capacity: usize, max_workers: usize) -> Result<Self, RingError> {
        if capacity == 0 || capacity as u64 > OFF_MASK {
            return Err(RingError::InvalidCapacity(capacity));
        }
        Ok(Self {
            space: capacity as u64,
            next: CachePadded::new(AtomicU64::new(0)),
            end: AtomicU64::new(OFF_MAX),
            written: CachePadded::new(AtomicU64::new(0)),
            slots: (0..max_workers)
                .map(|_| CachePadded::new(WorkerSlot::new()))
                .collect(),
        })
    }

    fn register(&self) -> Result<RingWorker, RingError> {
        self.slots
            .iter()
            .position(|slot| {
                slot.registered
                    .compare_exchange(false, true, Ordering::AcqRel, Ordering::Relaxed)
                    .is_ok()
            })
            .map(|slot| RingWorker { slot })
            .ok_or(RingError::WorkersExhausted(self.slots.len()))
    }

    fn acquire(&self, worker: &mut RingWorker, len: usize) -> Option<usize> {
        let slot = &self.slots[worker.slot];
        let len = len as u64;
        debug_assert!(len > 0 && len <= self.space);

        let (next, target) = loop {
            let seen = self.stable_next();
            let next = seen & OFF_MASK;
            slot.seen_off.store(next | WRAP_LOCK_BIT, Ordering::Relaxed);

            // Never reach or pass the consumer's position.
            let mut target = next + len;
            let written = self.written.load(Ordering::Acquire);
            if next < written && target >= written {
                slot.seen_off.store(OFF_MAX, Ordering::Release);
                return None;
            }

            if target >= self.space {
                // Restart at 0; take the wrap lock if the tail is cut off.
                let exceed = target > self.space;
                target = if exceed { WRAP_LOCK_BIT | len } else { 0 };
                if target & OFF_MASK >= written {
                    slot.seen_off.store(OFF_MAX, Ordering::Release);
                    return None;
                }
                target |= wrap_incr(seen & WRAP_COUNTER);
            } else {
                target |= seen & WRAP_COUNTER;
            }

            if self
                .next
                .compare_exchange_weak(seen, target, Ordering::AcqRel, Ordering::Relaxed)
                .is_ok()
            {
                break (next, target);
            }
        };

        slot.seen_off.store(next, Ordering::Release);

        if target & WRAP_LOCK_BIT != 0 {
            self.end.store(next, Ordering::Relaxed);
            // Unlock; publishes `end` together with the new `next`.
            self.next.store(target & !WRAP_LOCK_BIT, Ordering::Release);
            return Some(0);
        }
        Some(next as usize)
    }

    fn produce(&self, worker: &mut RingWorker) {
        self.slots[worker.slot]
            .seen_off
            .store(OFF_MAX, Ordering::Release);
    }

    fn consume(&self) -> Option<Span> {
        let mut written = self.written.load(Ordering::Relaxed);
        loop {
            let next = self.stable_next() & OFF_MASK;
            if written == next {
                return None;
            }

            // Smallest in-flight reservation that is not behind `written`.
            let ready = self
                .slots
                .iter()
                .filter(|slot| slot.registered.load(Ordering::Acquire))
                .map(|slot| slot.stable_seen())
                .filter(|&seen| seen >= written)
                .min()
                .unwrap_or(OFF_MAX);

            let ready = if next < written {
                let end = self.space.min(self.end.load(Ordering::Acquire));
                if ready == OFF_MAX && written == end {
                    // Tail fully drained: follow the producers to offset 0.
                    self.end.store(OFF_MAX, Ordering::Relaxed);
                    written = 0;
                    self.written.store(written, Ordering::Release);
                    continue;
                }
                ready.min(end)
            } else {
                ready.min(next)
            };

            debug_assert!(ready >= written);
            let len = ready - written;
            return (len > 0).then_some(Span {
                offset: written as usize,
                len: len as usize,
            });
        }
    }

    fn release(&self, len: usize) {
        let written = self.written.load(Ordering::Relaxed) + len as u64;
        debug_assert!(written <= self.space);
        let written = if written == self.space { 0 } else { written };
        self.written.store(written, Ordering::Release);
    }

    fn unregister(&self, worker: RingWorker) {
        let slot = &self.slots[worker.slot];
        slot.seen_off.store(OFF_MAX, Ordering::Release);
        slot.registered.store(false, Ordering::Release);
    }
}

// ============================================================
// TESTS
// ============================================================
