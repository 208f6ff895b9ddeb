//! The byte-source and decode-routine traits.
//!
//! These form the seam between the replay engine, which only understands
//! entry framing, and the externally supplied format decoders, which only
//! understand their own payloads.

use crate::error::DecodeError;
use crate::id::FormatId;

/// Sequential, forward-only access to a byte stream.
///
/// There is no way to move backwards: a byte that has been consumed is
/// gone. [`peek`](ByteSource::peek) is the only look-ahead.
pub trait ByteSource {
    /// Inspect the next byte without consuming it.
    ///
    /// Returns `Ok(None)` at end of stream.
    fn peek(&mut self) -> Result<Option<u8>, DecodeError>;

    /// Fill `buf` completely from the stream.
    ///
    /// Fails with [`DecodeError::TruncatedStream`] if the stream ends first;
    /// the bytes read before the failure are lost.
    fn consume_exact(&mut self, buf: &mut [u8]) -> Result<(), DecodeError>;

    /// Number of bytes consumed so far.
    fn offset(&self) -> u64;

    /// Whether the stream is exhausted.
    fn at_end(&mut self) -> Result<bool, DecodeError> {
        Ok(self.peek()?.is_none())
    }

    /// Consume a single byte.
    fn consume_u8(&mut self) -> Result<u8, DecodeError> {
        let mut buf = [0u8; 1];
        self.consume_exact(&mut buf)?;
        Ok(buf[0])
    }

    /// Consume `width` bytes (at most 8) as a little-endian unsigned integer.
    ///
    /// A zero width yields `0` without touching the stream.
    fn consume_uint_le(&mut self, width: usize) -> Result<u64, DecodeError> {
        debug_assert!(width <= 8);
        let mut buf = [0u8; 8];
        self.consume_exact(&mut buf[..width])?;
        Ok(u64::from_le_bytes(buf))
    }
}

/// A format-specific decode-and-render routine.
///
/// Called with the source positioned immediately after the shared message
/// header. The routine must consume exactly its own payload and return the
/// rendered text. The engine never inspects payload bytes itself, so a
/// routine that consumes too much or too little desynchronizes the stream.
pub trait DecodeRoutine {
    /// Decode one payload and render it.
    fn decode(&self, format_id: FormatId, src: &mut dyn ByteSource) -> Result<String, DecodeError>;
}

impl<F> DecodeRoutine for F
where
    F: Fn(FormatId, &mut dyn ByteSource) -> Result<String, DecodeError>,
{
    fn decode(&self, format_id: FormatId, src: &mut dyn ByteSource) -> Result<String, DecodeError> {
        self(format_id, src)
    }
}
