//! Ring Buffer Contract - the system under test
//!
//! The harness never looks inside the buffer. Everything it knows is the
//! procedural contract below; any conforming multi-producer/single-consumer
//! byte ring can be plugged in.
//!
//! ```text
//!  Producer (N)                        Consumer (1)
//!  ───────────                         ────────────
//!  register() ─▶ record                consume() ─▶ Span { offset, len }
//!  acquire(record, len) ─▶ offset       ... read span ...
//!  ... copy frame to offset ...        release(len)
//!  produce(record)
//! ```

use crate::error::RingError;

/// Contiguous readable span claimed by the consumer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub offset: usize,
    pub len: usize,
}

impl Span {
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// Memory required by an implementation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Footprint {
    /// Control structure bytes
    pub control_bytes: usize,
    /// Bytes per registered worker record
    pub worker_bytes: usize,
}

/// Multi-producer/single-consumer byte ring
///
/// Offsets index a byte region of `capacity` bytes owned by the caller.
/// Implementations own their synchronization; the harness calls every
/// operation concurrently without any external locking.
pub trait RingBuffer: Send + Sync + Sized {
    /// Per-worker registration record. Owned and touched only by the worker
    /// that registered it.
    type Worker: Send;

    /// Memory the implementation needs for `capacity` bytes and `workers` records.
    fn footprint(capacity: usize, workers: usize) -> Footprint;

    /// Initialize a buffer over `capacity` payload bytes for at most
    /// `max_workers` registered workers.
    fn setup(capacity: usize, max_workers: usize) -> Result<Self, RingError>;

    /// Bind a new worker record to the buffer.
    fn register(&self) -> Result<Self::Worker, RingError>;

    /// Reserve `len` contiguous bytes.
    ///
    /// Returns the offset of the reservation, or `None` when the buffer is
    /// full or the reservation would have to wrap. `None` is not an error.
    fn acquire(&self, worker: &mut Self::Worker, len: usize) -> Option<usize>;

    /// Make the worker's latest reservation visible to the consumer.
    fn produce(&self, worker: &mut Self::Worker);

    /// Claim the next contiguous readable span. `None` means nothing is ready.
    ///
    /// Only one thread may consume.
    fn consume(&self) -> Option<Span>;

    /// Return `len` bytes of the last claimed span for reuse.
    fn release(&self, len: usize);

    /// Detach a worker record. The worker must have no reservation in flight.
    fn unregister(&self, worker: Self::Worker) {
        drop(worker);
    }
}
