//! Test utilities and fixtures for cyclog development.
//!
//! Provides a [`StreamBuilder`] for assembling log streams (including
//! deliberately corrupt ones) and mock decode routines to register under
//! arbitrary format ids.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod decoders;

pub use decoders::{fixed_text, FixedLenDecoder, LengthPrefixedText};

use cyclog_core::FormatId;
use cyclog_replay::codec::{encode_checkpoint, encode_metadata};
use cyclog_replay::Checkpoint;

/// Builds a log stream in memory.
///
/// Tracks the delta chain like a real producer for [`message`](Self::message),
/// while [`raw_message`](Self::raw_message) and [`raw`](Self::raw) allow
/// crafting streams no well-behaved producer would write.
#[derive(Default)]
pub struct StreamBuilder {
    buf: Vec<u8>,
    last_format_id: FormatId,
    last_timestamp: u64,
}

impl StreamBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message at absolute `(format_id, timestamp)`.
    ///
    /// Panics if `timestamp` precedes the previous message; use
    /// [`raw_message`](Self::raw_message) to build a regression.
    pub fn message(self, format_id: u32, timestamp: u64, payload: &[u8]) -> Self {
        assert!(
            timestamp >= self.last_timestamp,
            "use raw_message to write a backwards timestamp"
        );
        let fmt_delta = self.last_format_id.delta_to(FormatId(format_id));
        let ts_delta = timestamp - self.last_timestamp;
        self.raw_message(fmt_delta, ts_delta, payload)
    }

    /// Append a message with explicit wire deltas.
    pub fn raw_message(mut self, fmt_delta: u32, ts_delta: u64, payload: &[u8]) -> Self {
        encode_metadata(&mut self.buf, fmt_delta, ts_delta).expect("Vec writes are infallible");
        self.buf.extend_from_slice(payload);
        self.last_format_id = self.last_format_id.apply_delta(fmt_delta);
        self.last_timestamp = self.last_timestamp.wrapping_add(ts_delta);
        self
    }

    /// Append a checkpoint with the given rate.
    pub fn checkpoint(mut self, cycles_per_second: f64) -> Self {
        let cp = Checkpoint {
            cycle_counter: self.last_timestamp,
            unix_time: 1_700_000_000,
            cycles_per_second,
        };
        encode_checkpoint(&mut self.buf, &cp).expect("Vec writes are infallible");
        self
    }

    /// Append `len` zero pad bytes.
    pub fn padding(mut self, len: usize) -> Self {
        self.buf.resize(self.buf.len() + len, 0);
        self
    }

    /// Append arbitrary bytes.
    pub fn raw(mut self, bytes: &[u8]) -> Self {
        self.buf.extend_from_slice(bytes);
        self
    }

    /// Current length of the stream in bytes.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn build(self) -> Vec<u8> {
        self.buf
    }
}

/// Encode `text` as a one-byte length followed by its bytes, the payload
/// [`LengthPrefixedText`] reads.
pub fn text_payload(text: &str) -> Vec<u8> {
    assert!(text.len() <= u8::MAX as usize);
    let mut out = Vec::with_capacity(text.len() + 1);
    out.push(text.len() as u8);
    out.extend_from_slice(text.as_bytes());
    out
}
