//! Stress Worker - producer/consumer state machine
//!
//! ```text
//! Registering ──▶ WaitStart ──▶ Running ──▶ WaitEnd ──▶ Terminated
//!                 (barrier)     (loop)      (barrier)
//! ```
//!
//! # Running
//!
//! ```text
//! Producer                               Consumer (exactly one)
//! ┌──────────────────────────────┐       ┌──────────────────────────────┐
//! │ encode frame (private buf)   │       │ consume() ─▶ span            │
//! │ acquire(len) ─▶ offset       │       │   empty ─▶ Idle              │
//! │   none ─▶ Idle               │       │ decode frames back-to-back   │
//! │ copy frame to region[offset] │       │ release(span.len)            │
//! │ produce()                    │       │                              │
//! └──────────────────────────────┘       └──────────────────────────────┘
//! ```
//!
//! The stop flag is polled once at the top of each iteration, so a
//! reservation or claim is never left half-finished. Both roles do the end
//! rendezvous before releasing their record, which keeps the orchestrator
//! from tearing anything down while a worker is mid-operation.

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Barrier};

use tracing::{debug, warn};

use crate::codec::{self, CodecError, MAX_GENERATION_CAPACITY};
use crate::control::StopFlag;
use crate::error::{HarnessError, Violation};
use crate::region::SharedRegion;
use crate::ringbuf::RingBuffer;
use crate::rng::XorShift32;
use crate::stats::{StressStats, WorkerCounters};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Producer,
    Consumer,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Producer => f.write_str("producer"),
            Role::Consumer => f.write_str("consumer"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Registering,
    WaitStart,
    Running,
    WaitEnd,
    Terminated,
}

/// Outcome of one loop iteration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// A frame was published or a span was verified and released
    Progress,
    /// Buffer full (producer) or empty (consumer); retry next iteration
    Idle,
}

/// Producer reservation that has been written but not yet produced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reservation {
    pub offset: usize,
    pub len: usize,
}

/// Everything the workers share for one run
pub struct RunContext<R> {
    pub ring: R,
    pub region: SharedRegion,
    pub barrier: Barrier,
    pub stop: Arc<StopFlag>,
    pub stats: StressStats,
}

impl<R: RingBuffer> RunContext<R> {
    pub fn new(ring: R, region: SharedRegion, workers: usize) -> Self {
        Self {
            ring,
            region,
            barrier: Barrier::new(workers),
            stop: Arc::new(StopFlag::new()),
            stats: StressStats::new(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct WorkerSettings {
    /// Generation buffer size; never larger than the region
    pub generation_capacity: usize,
    pub seed: u32,
    /// Abort the process on the first violation
    pub fail_fast: bool,
}

pub struct Worker<R: RingBuffer> {
    id: usize,
    role: Role,
    state: WorkerState,
    ctx: Arc<RunContext<R>>,
    record: Option<R::Worker>,
    rng: XorShift32,
    settings: WorkerSettings,
    /// Producer's private frame buffer
    frame: [u8; MAX_GENERATION_CAPACITY],
    /// Consumer's copy of the claimed span
    claimed: Vec<u8>,
    counters: WorkerCounters,
}

impl<R: RingBuffer> Worker<R> {
    pub fn new(id: usize, role: Role, ctx: Arc<RunContext<R>>, settings: WorkerSettings) -> Self {
        debug_assert!(settings.generation_capacity <= ctx.region.capacity());
        debug_assert!(settings.generation_capacity <= MAX_GENERATION_CAPACITY);
        let claimed = match role {
            Role::Consumer => Vec::with_capacity(ctx.region.capacity()),
            Role::Producer => Vec::new(),
        };
        Self {
            id,
            role,
            state: WorkerState::Registering,
            ctx,
            record: None,
            rng: XorShift32::new(settings.seed),
            settings,
            frame: [0; MAX_GENERATION_CAPACITY],
            claimed,
            counters: WorkerCounters::default(),
        }
    }

    pub fn counters(&self) -> &WorkerCounters {
        &self.counters
    }

    /// Drive the full state machine. Runs on the worker's own thread.
    ///
    /// A panic raised by the buffer under test is caught so the worker still
    /// meets the end barrier and the run terminates.
    pub fn run(mut self) -> Result<WorkerCounters, HarnessError> {
        let id = self.id;
        let registered = panic::catch_unwind(AssertUnwindSafe(|| self.register()))
            .unwrap_or_else(|payload| {
                warn!(worker = id, "register panicked: {}", panic_message(payload.as_ref()));
                Err(HarnessError::WorkerPanicked(id))
            });
        if registered.is_err() {
            // Let the others start and leave right away.
            self.ctx.stop.raise();
        }

        self.transition(WorkerState::WaitStart);
        self.ctx.barrier.wait();

        let outcome = registered.and_then(|()| {
            self.transition(WorkerState::Running);
            self.run_loop()
        });

        self.transition(WorkerState::WaitEnd);
        self.ctx.barrier.wait();

        self.ctx.stats.absorb(&self.counters);
        if let Some(record) = self.record.take() {
            self.ctx.ring.unregister(record);
        }
        self.transition(WorkerState::Terminated);

        outcome.map(|()| self.counters)
    }

    /// Bind this worker's record to the ring.
    pub fn register(&mut self) -> Result<(), HarnessError> {
        let record = self.ctx.ring.register()?;
        self.record = Some(record);
        Ok(())
    }

    fn run_loop(&mut self) -> Result<(), HarnessError> {
        while !self.ctx.stop.is_raised() {
            self.counters.iterations += 1;
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.step()))
                .unwrap_or_else(|payload| {
                    Err(Violation::Panicked {
                        message: panic_message(payload.as_ref()),
                    })
                });
            if let Err(violation) = outcome {
                return Err(self.on_violation(violation));
            }
        }
        Ok(())
    }

    fn on_violation(&self, violation: Violation) -> HarnessError {
        if self.settings.fail_fast {
            crate::harness::abort_on_violation(Some(self.id), &violation);
        }
        self.ctx.stop.raise();
        HarnessError::Violation {
            worker: self.id,
            violation,
        }
    }

    fn transition(&mut self, next: WorkerState) {
        debug!(
            worker = self.id,
            role = %self.role,
            from = ?self.state,
            to = ?next,
            "worker state"
        );
        self.state = next;
    }

    /// One Running-state iteration for this worker's role.
    pub fn step(&mut self) -> Result<Step, Violation> {
        self.ctx.region.check_guard()?;
        match self.role {
            Role::Producer => self.produce_step(),
            Role::Consumer => self.consume_step(),
        }
    }

    fn produce_step(&mut self) -> Result<Step, Violation> {
        match self.stage()? {
            Some(reservation) => {
                self.publish(reservation);
                Ok(Step::Progress)
            }
            None => Ok(Step::Idle),
        }
    }

    /// Encode a frame, reserve space for it and copy it into the region.
    ///
    /// The reservation stays invisible to the consumer until [`Self::publish`].
    /// Returns `None` when the ring has no room.
    pub fn stage(&mut self) -> Result<Option<Reservation>, Violation> {
        let Some(record) = self.record.as_mut() else {
            return Ok(None);
        };

        let len = codec::encode(
            &mut self.frame[..self.settings.generation_capacity],
            &mut self.rng,
        );

        let Some(offset) = self.ctx.ring.acquire(record, len) else {
            self.counters.acquire_misses += 1;
            return Ok(None);
        };

        let capacity = self.ctx.region.capacity();
        if offset >= capacity {
            return Err(Violation::OffsetOutOfBounds { offset, capacity });
        }
        self.ctx.region.write(offset, &self.frame[..len])?;
        Ok(Some(Reservation { offset, len }))
    }

    /// Make a staged reservation visible to the consumer.
    pub fn publish(&mut self, reservation: Reservation) {
        if let Some(record) = self.record.as_mut() {
            self.ctx.ring.produce(record);
            self.counters.frames_produced += 1;
            self.counters.bytes_produced += reservation.len as u64;
        }
    }

    fn consume_step(&mut self) -> Result<Step, Violation> {
        let Some(span) = self.ctx.ring.consume().filter(|span| !span.is_empty()) else {
            self.counters.empty_polls += 1;
            return Ok(Step::Idle);
        };

        let capacity = self.ctx.region.capacity();
        if span.offset >= capacity {
            return Err(Violation::OffsetOutOfBounds {
                offset: span.offset,
                capacity,
            });
        }
        self.ctx
            .region
            .read_into(span.offset, span.len, &mut self.claimed)?;

        let mut pos = 0;
        while pos < self.claimed.len() {
            let offset = span.offset + pos;
            let size = codec::decode(&self.claimed[pos..]).map_err(|source| match source {
                CodecError::Truncated { needed, available } => Violation::FrameOverrun {
                    offset,
                    frame: needed,
                    remaining: available,
                },
                source => Violation::Corruption { offset, source },
            })?;
            pos += size;
            self.counters.frames_consumed += 1;
        }

        self.ctx.ring.release(span.len);
        self.counters.bytes_consumed += span.len as u64;
        Ok(Step::Progress)
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

// ============================================================
// TESTS
// ============================================================
