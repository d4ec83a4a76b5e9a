//! Harness Error Types
//!
//! Two classes of failure:
//! - [`HarnessError`]: setup/resource problems reported before (or instead of)
//!   the stress loop.
//! - [`Violation`]: an invariant broken during the run. Always a bug in the
//!   buffer under test.

use thiserror::Error;

use crate::codec::CodecError;

/// Invariant violated while the stress loop was running
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    #[error("guard byte overwritten: expected {expected:#04x}, found {found:#04x}")]
    GuardOverwritten { expected: u8, found: u8 },

    #[error("offset {offset} outside region of {capacity} bytes")]
    OffsetOutOfBounds { offset: usize, capacity: usize },

    #[error("span {offset}+{len} extends past region of {capacity} bytes")]
    SpanOutOfBounds {
        offset: usize,
        len: usize,
        capacity: usize,
    },

    #[error("corrupted frame at offset {offset}: {source}")]
    Corruption {
        offset: usize,
        #[source]
        source: CodecError,
    },

    #[error("frame of {frame} bytes at offset {offset} overruns the {remaining} bytes left in the claim")]
    FrameOverrun {
        offset: usize,
        frame: usize,
        remaining: usize,
    },

    #[error("buffer under test panicked: {message}")]
    Panicked { message: String },
}

impl Violation {
    /// Stable code for diagnostics
    pub fn code(&self) -> &'static str {
        match self {
            Violation::GuardOverwritten { .. } => "GUARD_OVERWRITTEN",
            Violation::OffsetOutOfBounds { .. } => "OFFSET_OUT_OF_BOUNDS",
            Violation::SpanOutOfBounds { .. } => "SPAN_OUT_OF_BOUNDS",
            Violation::Corruption { .. } => "CORRUPTION",
            Violation::FrameOverrun { .. } => "FRAME_OVERRUN",
            Violation::Panicked { .. } => "PANICKED",
        }
    }
}

/// Failure reported by a ring buffer implementation during setup/registration
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RingError {
    #[error("invalid capacity {0}")]
    InvalidCapacity(usize),

    #[error("all {0} worker slots are registered")]
    WorkersExhausted(usize),
}

#[derive(Error, Debug)]
pub enum HarnessError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Ring buffer error: {0}")]
    Ring(#[from] RingError),

    #[error("Failed to spawn worker {id}: {source}")]
    Spawn {
        id: usize,
        #[source]
        source: std::io::Error,
    },

    #[error("Worker {0} panicked")]
    WorkerPanicked(usize),

    #[error("Invariant violated by worker {worker}: {violation}")]
    Violation { worker: usize, violation: Violation },

    #[error("Invariant violated after all workers stopped: {0}")]
    PostRunViolation(Violation),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_violation_codes() {
        let v = Violation::GuardOverwritten {
            expected: 0x5a,
            found: 0x00,
        };
        assert_eq!(v.code(), "GUARD_OVERWRITTEN");
        assert_eq!(
            v.to_string(),
            "guard byte overwritten: expected 0x5a, found 0x00"
        );

        let v = Violation::Corruption {
            offset: 12,
            source: CodecError::Truncated {
                needed: 9,
                available: 4,
            },
        };
        assert_eq!(v.code(), "CORRUPTION");
        assert!(v.to_string().starts_with("corrupted frame at offset 12"));

        let v = Violation::Panicked {
            message: "index out of bounds".to_string(),
        };
        assert_eq!(v.code(), "PANICKED");
        assert_eq!(
            v.to_string(),
            "buffer under test panicked: index out of bounds"
        );
    }

    #[test]
    fn test_harness_error_from_ring() {
        let err: HarnessError = RingError::WorkersExhausted(4).into();
        assert!(matches!(err, HarnessError::Ring(_)));
        assert_eq!(
            err.to_string(),
            "Ring buffer error: all 4 worker slots are registered"
        );
    }
}
