//! ringbuf_stress - stress oracle for lock-free MPSC byte ring buffers
//!
//! Hammers a ring buffer with N producers and one consumer for a fixed
//! wall-clock duration and aborts the moment it sees a corrupted frame or a
//! boundary overrun.
//!
//! # Modules
//!
//! - [`rng`] - Per-thread xorshift-32 generator
//! - [`codec`] - Self-checksummed frame encode/decode
//! - [`region`] - Shared byte region with trailing guard byte
//! - [`ringbuf`] - `RingBuffer` contract for the system under test
//! - [`mpsc_ring`] - Reference lock-free MPSC ring
//! - [`worker`] - Producer/consumer state machine
//! - [`control`] - Stop flag and one-shot deadline
//! - [`stats`] - Run counters
//! - [`harness`] - Orchestrator
//! - [`config`] / [`logging`] - Ambient configuration and tracing setup

pub mod codec;
pub mod config;
pub mod control;
pub mod error;
pub mod harness;
pub mod logging;
pub mod mpsc_ring;
pub mod region;
pub mod ringbuf;
pub mod rng;
pub mod stats;
pub mod worker;

// Convenient re-exports at crate root
pub use config::StressConfig;
pub use error::{HarnessError, RingError, Violation};
pub use harness::{StressReport, run_stress};
pub use mpsc_ring::MpscRing;
pub use ringbuf::{Footprint, RingBuffer, Span};
pub use worker::{Role, Step, WorkerState};
