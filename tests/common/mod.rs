//! Deliberately broken ring buffers shared by the integration tests
#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};

use ringbuf_stress::{Footprint, MpscRing, RingBuffer, RingError, Span};

/// Acquires that succeed before [`PanickyRing`] panics
pub const PANIC_AFTER_ACQUIRES: usize = 100;

/// Ring whose producers never get space and whose consumer always claims
/// the span computed from the region capacity.
macro_rules! claim_ring {
    ($(#[$meta:meta])* $name:ident, |$capacity:ident| $span:expr) => {
        $(#[$meta])*
        pub struct $name {
            capacity: usize,
        }

        impl RingBuffer for $name {
            type Worker = ();

            fn footprint(_capacity: usize, _workers: usize) -> Footprint {
                Footprint {
                    control_bytes: std::mem::size_of::<Self>(),
                    worker_bytes: 0,
                }
            }

            fn setup(capacity: usize, _max_workers: usize) -> Result<Self, RingError> {
                Ok(Self { capacity })
            }

            fn register(&self) -> Result<(), RingError> {
                Ok(())
            }

            fn acquire(&self, _worker: &mut (), _len: usize) -> Option<usize> {
                None
            }

            fn produce(&self, _worker: &mut ()) {}

            fn consume(&self) -> Option<Span> {
                let $capacity = self.capacity;
                Some($span)
            }

            fn release(&self, _len: usize) {}
        }
    };
}

claim_ring!(
    /// Claims a span starting one past the region.
    ClaimPastRegionRing,
    |capacity| Span {
        offset: capacity,
        len: 8,
    }
);

claim_ring!(
    /// Claims a span that starts inside the region and runs past its end.
    ClaimOverrunRing,
    |capacity| Span {
        offset: capacity - 4,
        len: 8,
    }
);

claim_ring!(
    /// Reports 92 ready bytes at offset 0 that no producer wrote. The
    /// untouched region is all guard sentinels (0x5a), which decodes as a
    /// 90-byte payload whose XOR (0x00) does not match its last byte (0x5a).
    UnwrittenSpanRing,
    |_capacity| Span { offset: 0, len: 92 }
);

/// Hands out an offset one past the region.
pub struct OffsetOverflowRing {
    capacity: usize,
}

impl RingBuffer for OffsetOverflowRing {
    type Worker = ();

    fn footprint(_capacity: usize, _workers: usize) -> Footprint {
        Footprint {
            control_bytes: std::mem::size_of::<Self>(),
            worker_bytes: 0,
        }
    }

    fn setup(capacity: usize, _max_workers: usize) -> Result<Self, RingError> {
        Ok(Self { capacity })
    }

    fn register(&self) -> Result<(), RingError> {
        Ok(())
    }

    fn acquire(&self, _worker: &mut (), _len: usize) -> Option<usize> {
        Some(self.capacity)
    }

    fn produce(&self, _worker: &mut ()) {}

    fn consume(&self) -> Option<Span> {
        None
    }

    fn release(&self, _len: usize) {}
}

/// Always reserves the last byte, so frames run into the guard.
pub struct TailOverrunRing {
    capacity: usize,
}

impl RingBuffer for TailOverrunRing {
    type Worker = ();

    fn footprint(_capacity: usize, _workers: usize) -> Footprint {
        Footprint {
            control_bytes: std::mem::size_of::<Self>(),
            worker_bytes: 0,
        }
    }

    fn setup(capacity: usize, _max_workers: usize) -> Result<Self, RingError> {
        Ok(Self { capacity })
    }

    fn register(&self) -> Result<(), RingError> {
        Ok(())
    }

    fn acquire(&self, _worker: &mut (), _len: usize) -> Option<usize> {
        Some(self.capacity - 1)
    }

    fn produce(&self, _worker: &mut ()) {}

    fn consume(&self) -> Option<Span> {
        None
    }

    fn release(&self, _len: usize) {}
}

/// Correct ring whose consumer claims one byte less than is ready.
pub struct ShortClaimRing(MpscRing);

impl RingBuffer for ShortClaimRing {
    type Worker = <MpscRing as RingBuffer>::Worker;

    fn footprint(capacity: usize, workers: usize) -> Footprint {
        MpscRing::footprint(capacity, workers)
    }

    fn setup(capacity: usize, max_workers: usize) -> Result<Self, RingError> {
        MpscRing::setup(capacity, max_workers).map(Self)
    }

    fn register(&self) -> Result<Self::Worker, RingError> {
        self.0.register()
    }

    fn acquire(&self, worker: &mut Self::Worker, len: usize) -> Option<usize> {
        self.0.acquire(worker, len)
    }

    fn produce(&self, worker: &mut Self::Worker) {
        self.0.produce(worker)
    }

    fn consume(&self) -> Option<Span> {
        self.0.consume().map(|span| Span {
            offset: span.offset,
            len: span.len - 1,
        })
    }

    fn release(&self, len: usize) {
        self.0.release(len)
    }

    fn unregister(&self, worker: Self::Worker) {
        self.0.unregister(worker)
    }
}

/// Correct ring that panics on one acquire after [`PANIC_AFTER_ACQUIRES`].
pub struct PanickyRing {
    inner: MpscRing,
    acquires: AtomicUsize,
}

impl RingBuffer for PanickyRing {
    type Worker = <MpscRing as RingBuffer>::Worker;

    fn footprint(capacity: usize, workers: usize) -> Footprint {
        MpscRing::footprint(capacity, workers)
    }

    fn setup(capacity: usize, max_workers: usize) -> Result<Self, RingError> {
        Ok(Self {
            inner: MpscRing::setup(capacity, max_workers)?,
            acquires: AtomicUsize::new(0),
        })
    }

    fn register(&self) -> Result<Self::Worker, RingError> {
        self.inner.register()
    }

    fn acquire(&self, worker: &mut Self::Worker, len: usize) -> Option<usize> {
        let n = self.acquires.fetch_add(1, Ordering::Relaxed);
        if n == PANIC_AFTER_ACQUIRES {
            panic!("acquire #{} hit a poisoned slot", n + 1);
        }
        self.inner.acquire(worker, len)
    }

    fn produce(&self, worker: &mut Self::Worker) {
        self.inner.produce(worker)
    }

    fn consume(&self) -> Option<Span> {
        self.inner.consume()
    }

    fn release(&self, len: usize) {
        self.inner.release(len)
    }

    fn unregister(&self, worker: Self::Worker) {
        self.inner.unregister(worker)
    }
}

/// Panics as soon as a worker tries to register.
pub struct PanicOnRegisterRing;

impl RingBuffer for PanicOnRegisterRing {
    type Worker = ();

    fn footprint(_capacity: usize, _workers: usize) -> Footprint {
        Footprint {
            control_bytes: 0,
            worker_bytes: 0,
        }
    }

    fn setup(_capacity: usize, _max_workers: usize) -> Result<Self, RingError> {
        Ok(Self)
    }

    fn register(&self) -> Result<(), RingError> {
        panic!("record table not initialised")
    }

    fn acquire(&self, _worker: &mut (), _len: usize) -> Option<usize> {
        None
    }

    fn produce(&self, _worker: &mut ()) {}

    fn consume(&self) -> Option<Span> {
        None
    }

    fn release(&self, _len: usize) {}
}

/// Refuses every registration.
pub struct NoSlotsRing;

impl RingBuffer for NoSlotsRing {
    type Worker = ();

    fn footprint(_capacity: usize, _workers: usize) -> Footprint {
        Footprint {
            control_bytes: 0,
            worker_bytes: 0,
        }
    }

    fn setup(_capacity: usize, _max_workers: usize) -> Result<Self, RingError> {
        Ok(Self)
    }

    fn register(&self) -> Result<(), RingError> {
        Err(RingError::WorkersExhausted(0))
    }

    fn acquire(&self, _worker: &mut (), _len: usize) -> Option<usize> {
        None
    }

    fn produce(&self, _worker: &mut ()) {}

    fn consume(&self) -> Option<Span> {
        None
    }

    fn release(&self, _len: usize) {}
}
