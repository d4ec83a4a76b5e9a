//! Per-thread xorshift-32 PRNG
//!
//! Every worker owns its own generator. A shared, lock-protected generator
//! would add cross-thread contention and distort the interleavings the
//! harness is trying to provoke.
//!
//! # Algorithm
//!
//! ```text
//! x ^= x << 13
//! x ^= x >> 17
//! x ^= x << 5
//! ```

/// Seed every worker starts from unless configured otherwise.
pub const DEFAULT_SEED: u32 = 5381;

/// Xorshift-32 generator
///
/// `next()` is a pure function of the previous state.
#[derive(Debug, Clone)]
pub struct XorShift32 {
    state: u32,
}

impl XorShift32 {
    /// Create a generator from `seed`.
    ///
    /// Zero is a fixed point of xorshift, so it is replaced by [`DEFAULT_SEED`].
    pub fn new(seed: u32) -> Self {
        Self {
            state: if seed == 0 { DEFAULT_SEED } else { seed },
        }
    }

    #[inline]
    pub fn next(&mut self) -> u32 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.state = x;
        x
    }

    /// Random value in `[0, bound)`. Modulo bias is irrelevant here.
    #[inline]
    pub fn next_below(&mut self, bound: u32) -> u32 {
        debug_assert!(bound > 0, "bound must be positive");
        self.next() % bound
    }
}

impl Default for XorShift32 {
    fn default() -> Self {
        Self::new(DEFAULT_SEED)
    }
}
