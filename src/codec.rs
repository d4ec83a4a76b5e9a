//! Frame Codec - self-checksummed variable-length messages
//!
//! # Layout
//!
//! ```text
//! ┌────────┬──────────────────────┬──────────┐
//! │ len u8 │ payload (len bytes)  │ xor u8   │
//! └────────┴──────────────────────┴──────────┘
//!   0        1 ..= len              len + 1
//! ```
//!
//! The checksum is the running XOR of the payload bytes, so verification is
//! a single pass and cannot hide a torn or overlapping write behind any
//! state of its own.

use thiserror::Error;

use crate::rng::XorShift32;

/// Length byte + checksum byte
pub const FRAME_OVERHEAD: usize = 2;

/// Largest generation buffer a one-byte length prefix can describe.
///
/// Payload lengths are drawn from `[0, cap - 2)`, so `cap - 3 <= u8::MAX`.
pub const MAX_GENERATION_CAPACITY: usize = u8::MAX as usize + 2;

/// First printable payload character
const PAYLOAD_LOW: u8 = b'!';
/// Payload characters are `'!' + r % ('~' - '!')`
const PAYLOAD_SPAN: u32 = (b'~' - b'!') as u32;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("checksum mismatch for {declared}-byte payload: expected {expected:#04x}, found {actual:#04x}")]
    Corrupted {
        declared: usize,
        expected: u8,
        actual: u8,
    },

    #[error("frame needs {needed} bytes but only {available} are available")]
    Truncated { needed: usize, available: usize },
}

/// Encode a frame with a random payload length into `buf`.
///
/// The length is drawn from `[0, buf.len() - 2)`. Returns the encoded size.
///
/// # Panics
///
/// If `buf` is shorter than 3 bytes or longer than [`MAX_GENERATION_CAPACITY`].
pub fn encode(buf: &mut [u8], rng: &mut XorShift32) -> usize {
    assert!(
        (FRAME_OVERHEAD + 1..=MAX_GENERATION_CAPACITY).contains(&buf.len()),
        "generation buffer must be 3..={} bytes, got {}",
        MAX_GENERATION_CAPACITY,
        buf.len()
    );
    let len = rng.next_below((buf.len() - FRAME_OVERHEAD) as u32) as usize;
    encode_with_len(buf, len, rng)
}

/// Encode a frame with exactly `len` random printable payload bytes.
pub fn encode_with_len(buf: &mut [u8], len: usize, rng: &mut XorShift32) -> usize {
    assert!(len <= u8::MAX as usize, "payload length {} exceeds u8", len);
    assert!(buf.len() >= len + FRAME_OVERHEAD, "buffer too small for frame");

    let mut cksum = 0u8;
    for byte in &mut buf[1..=len] {
        *byte = PAYLOAD_LOW + rng.next_below(PAYLOAD_SPAN) as u8;
        cksum ^= *byte;
    }
    buf[len + 1] = cksum;
    buf[0] = len as u8;
    len + FRAME_OVERHEAD
}

/// Encode a frame around a caller-supplied payload.
pub fn encode_payload(buf: &mut [u8], payload: &[u8]) -> usize {
    let len = payload.len();
    assert!(len <= u8::MAX as usize, "payload length {} exceeds u8", len);
    assert!(buf.len() >= len + FRAME_OVERHEAD, "buffer too small for frame");

    buf[1..=len].copy_from_slice(payload);
    buf[len + 1] = checksum(payload);
    buf[0] = len as u8;
    len + FRAME_OVERHEAD
}

/// Verify the frame at the start of `buf` and return its encoded size.
pub fn decode(buf: &[u8]) -> Result<usize, CodecError> {
    let Some(&declared) = buf.first() else {
        return Err(CodecError::Truncated {
            needed: FRAME_OVERHEAD,
            available: 0,
        });
    };
    let declared = declared as usize;
    let size = declared + FRAME_OVERHEAD;
    if buf.len() < size {
        return Err(CodecError::Truncated {
            needed: size,
            available: buf.len(),
        });
    }

    let expected = checksum(&buf[1..=declared]);
    let actual = buf[declared + 1];
    if expected != actual {
        return Err(CodecError::Corrupted {
            declared,
            expected,
            actual,
        });
    }
    Ok(size)
}

#[inline]
fn checksum(payload: &[u8]) -> u8 {
    payload.iter().fold(0u8, |acc, b| acc ^ b)
}

// ============================================================
// TESTS
// ============================================================
