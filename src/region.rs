//! Shared byte region written by producers and verified by the consumer
//!
//! ```text
//! ┌──────────────────────── capacity ────────────────────────┐┌───────┐
//! │ frames at offsets handed out by the ring buffer          ││ guard │
//! └──────────────────────────────────────────────────────────┘└───────┘
//! ```
//!
//! Bytes are `AtomicU8` accessed with `Relaxed` ordering. Publication order
//! comes entirely from the ring buffer's own release/acquire protocol, so a
//! broken buffer shows up as a checksum mismatch instead of undefined
//! behaviour.

use std::sync::atomic::{AtomicU8, Ordering};

use crate::error::Violation;

/// Sentinel stored in the guard byte for the whole run
pub const GUARD_SENTINEL: u8 = 0x5a;

pub struct SharedRegion {
    /// `capacity` payload bytes followed by the guard byte
    bytes: Box<[AtomicU8]>,
}

impl SharedRegion {
    /// Allocate `capacity` bytes plus the guard, all filled with the sentinel.
    pub fn new(capacity: usize) -> Self {
        let bytes = (0..=capacity)
            .map(|_| AtomicU8::new(GUARD_SENTINEL))
            .collect::<Vec<_>>()
            .into_boxed_slice();
        Self { bytes }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.bytes.len() - 1
    }

    /// Check the guard byte still holds the sentinel.
    #[inline]
    pub fn check_guard(&self) -> Result<(), Violation> {
        let found = self.bytes[self.capacity()].load(Ordering::Relaxed);
        if found == GUARD_SENTINEL {
            Ok(())
        } else {
            Err(Violation::GuardOverwritten {
                expected: GUARD_SENTINEL,
                found,
            })
        }
    }

    /// Copy `src` into the region at `offset`.
    ///
    /// The write may reach the guard byte (that is what the guard is for) but
    /// never past it.
    pub fn write(&self, offset: usize, src: &[u8]) -> Result<(), Violation> {
        let dst = offset
            .checked_add(src.len())
            .and_then(|end| self.bytes.get(offset..end))
            .ok_or(Violation::SpanOutOfBounds {
                offset,
                len: src.len(),
                capacity: self.capacity(),
            })?;
        for (cell, &byte) in dst.iter().zip(src) {
            cell.store(byte, Ordering::Relaxed);
        }
        Ok(())
    }

    /// Copy `len` bytes starting at `offset` into `dst`, replacing its contents.
    pub fn read_into(&self, offset: usize, len: usize, dst: &mut Vec<u8>) -> Result<(), Violation> {
        let src = offset
            .checked_add(len)
            .filter(|&end| end <= self.capacity())
            .and_then(|end| self.bytes.get(offset..end))
            .ok_or(Violation::SpanOutOfBounds {
                offset,
                len,
                capacity: self.capacity(),
            })?;
        dst.clear();
        dst.extend(src.iter().map(|cell| cell.load(Ordering::Relaxed)));
        Ok(())
    }

    /// Overwrite a single byte. Used to inject faults in tests.
    pub fn poke(&self, offset: usize, byte: u8) {
        self.bytes[offset].store(byte, Ordering::Relaxed);
    }

    pub fn peek(&self, offset: usize) -> u8 {
        self.bytes[offset].load(Ordering::Relaxed)
    }
}

impl std::fmt::Debug for SharedRegion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedRegion")
            .field("capacity", &self.capacity())
            .finish()
    }
}
