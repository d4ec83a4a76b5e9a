//! Stress Orchestrator
//!
//! ```text
//!            ┌──────────────┐
//!            │ Orchestrator │ setup region + ring, arm deadline
//!            └──────┬───────┘
//!     spawn ┌───────┼───────────────┬───────────────┐
//!           ▼       ▼               ▼               ▼
//!      consumer  producer 1  ...  producer N    deadline
//!       (id 0)                                  (raises stop)
//!           │       │               │
//!           └───────┴── barrier ────┘  start
//!                 ... stress loop ...
//!           ┌───────┬── barrier ────┐  end
//!           ▼       ▼               ▼
//!            join, final guard check, report
//! ```

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use tracing::{error, info, warn};

use crate::config::StressConfig;
use crate::control::Deadline;
use crate::error::{HarnessError, Violation};
use crate::region::SharedRegion;
use crate::ringbuf::RingBuffer;
use crate::stats::StatsSnapshot;
use crate::worker::{Role, RunContext, Worker, WorkerSettings};

/// Result of a clean run
#[derive(Debug, Clone)]
pub struct StressReport {
    pub workers: usize,
    pub capacity: usize,
    pub elapsed: Duration,
    pub stats: StatsSnapshot,
}

/// Log the violation and abort the process.
///
/// Continuing after a broken invariant only produces meaningless results.
/// `worker` is `None` for the orchestrator's own post-run check.
pub fn abort_on_violation(worker: Option<usize>, violation: &Violation) -> ! {
    error!(worker = ?worker, code = violation.code(), "invariant violated: {}", violation);
    crate::logging::flush_logs();
    match worker {
        Some(id) => eprintln!("FATAL [{}] worker {}: {}", violation.code(), id, violation),
        None => eprintln!("FATAL [{}] after run: {}", violation.code(), violation),
    }
    std::process::abort();
}

/// Run the stress test against ring buffer implementation `R`.
///
/// Worker 0 is the consumer, all others are producers. Returns once every
/// worker has passed the end barrier and been joined.
///
/// A thread-spawn failure is returned as [`HarnessError::Spawn`]; workers
/// spawned before it stay parked on the start barrier, so callers are
/// expected to exit the process.
pub fn run_stress<R: RingBuffer + 'static>(
    config: &StressConfig,
) -> Result<StressReport, HarnessError> {
    config.validate()?;

    let workers = config.worker_count();
    let capacity = config.capacity;
    let footprint = R::footprint(capacity, workers);
    info!(
        workers,
        capacity,
        generation_capacity = config.generation_capacity,
        duration_secs = config.duration_secs,
        control_bytes = footprint.control_bytes,
        worker_bytes = footprint.worker_bytes,
        "Starting ring buffer stress run"
    );

    let ring = R::setup(capacity, workers)?;
    let ctx = Arc::new(RunContext::new(ring, SharedRegion::new(capacity), workers));
    let settings = WorkerSettings {
        generation_capacity: config.generation_capacity,
        seed: config.seed,
        fail_fast: config.fail_fast,
    };

    let started = Instant::now();
    let deadline = Deadline::arm(config.duration(), ctx.stop.clone())?;

    let mut handles = Vec::with_capacity(workers);
    for id in 0..workers {
        let role = if id == 0 {
            Role::Consumer
        } else {
            Role::Producer
        };
        let worker = Worker::new(id, role, ctx.clone(), settings);
        let handle = thread::Builder::new()
            .name(format!("{}-{}", role, id))
            .spawn(move || worker.run())
            .map_err(|source| {
                ctx.stop.raise();
                HarnessError::Spawn { id, source }
            })?;
        handles.push(handle);
    }

    let mut first_error: Option<HarnessError> = None;
    for (id, handle) in handles.into_iter().enumerate() {
        let result = handle
            .join()
            .map_err(|_| HarnessError::WorkerPanicked(id))
            .and_then(|outcome| outcome);
        if let Err(e) = result {
            warn!(worker = id, "worker failed: {}", e);
            first_error.get_or_insert(e);
        }
    }
    deadline.disarm();
    let elapsed = started.elapsed();

    if let Err(violation) = ctx.region.check_guard() {
        if config.fail_fast {
            abort_on_violation(None, &violation);
        }
        first_error.get_or_insert(HarnessError::PostRunViolation(violation));
    }

    if let Some(e) = first_error {
        return Err(e);
    }

    let report = StressReport {
        workers,
        capacity,
        elapsed,
        stats: ctx.stats.snapshot(),
    };
    info!(
        elapsed_ms = report.elapsed.as_millis() as u64,
        frames_produced = report.stats.frames_produced,
        frames_consumed = report.stats.frames_consumed,
        bytes_consumed = report.stats.bytes_consumed,
        acquire_misses = report.stats.acquire_misses,
        empty_polls = report.stats.empty_polls,
        "Stress run completed"
    );
    Ok(report)
}
