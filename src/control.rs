//! Run control: stop flag and one-shot deadline
//!
//! The stop flag has exactly one writer (the deadline, or a worker that hit
//! a violation in report mode) and is polled by every worker once per loop
//! iteration. Only eventual visibility is needed, so it is `Relaxed`.

use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

#[derive(Debug, Default)]
pub struct StopFlag {
    raised: AtomicBool,
}

impl StopFlag {
    pub fn new() -> Self {
        Self {
            raised: AtomicBool::new(false),
        }
    }

    /// Request every worker to stop after its current iteration
    #[inline]
    pub fn raise(&self) {
        self.raised.store(true, Ordering::Relaxed);
    }

    #[inline]
    pub fn is_raised(&self) -> bool {
        self.raised.load(Ordering::Relaxed)
    }
}

/// One-shot timer that raises a [`StopFlag`] on expiry
///
/// The timer thread does nothing on expiry except the single store in
/// [`StopFlag::raise`]: no allocation, no locking, no I/O.
pub struct Deadline {
    disarmed: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl Deadline {
    /// Start the timer. `after == 0` raises the flag immediately.
    pub fn arm(after: Duration, stop: Arc<StopFlag>) -> io::Result<Self> {
        let disarmed = Arc::new(AtomicBool::new(false));
        let timer_disarmed = disarmed.clone();
        let fire_at = Instant::now() + after;

        let handle = thread::Builder::new()
            .name("deadline".to_string())
            .spawn(move || {
                loop {
                    if timer_disarmed.load(Ordering::Acquire) {
                        return;
                    }
                    let now = Instant::now();
                    if now >= fire_at {
                        stop.raise();
                        return;
                    }
                    // Spurious wakeups just loop.
                    thread::park_timeout(fire_at - now);
                }
            })?;

        Ok(Self {
            disarmed,
            handle: Some(handle),
        })
    }

    /// Cancel the timer if it has not fired yet and join its thread.
    pub fn disarm(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.disarmed.store(true, Ordering::Release);
            handle.thread().unpark();
            let _ = handle.join();
        }
    }
}

impl Drop for Deadline {
    fn drop(&mut self) {
        self.shutdown();
    }
}
