//! Error kinds raised while framing and decoding a log stream.
//!
//! Every kind is fatal to a replay: the stream carries no resynchronization
//! marker, so once a read goes wrong the position of the next entry is
//! unknown.

use std::io;

use thiserror::Error;

use crate::id::FormatId;

/// A failure to decode the entry at the cursor.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// Fewer bytes remained than a framing step required.
    #[error("truncated stream at byte {offset}: needed {needed} bytes, {available} available")]
    TruncatedStream {
        /// Byte offset at which the short read started.
        offset: u64,
        /// Bytes the step asked for.
        needed: usize,
        /// Bytes that were actually left.
        available: usize,
    },
    /// The reconstructed format id has no registered decode routine.
    #[error("no decoder registered for format id {format_id}")]
    UnknownFormat {
        /// The id that failed lookup.
        format_id: FormatId,
    },
    /// The reconstructed timestamp is earlier than its predecessor.
    #[error("timestamp went backwards: previous={previous}, delta={delta:#x}")]
    NonMonotonicTimestamp {
        /// The last good absolute timestamp.
        previous: u64,
        /// The raw delta read from the wire.
        delta: u64,
    },
    /// The leading byte is neither a message, a checkpoint, nor pad.
    #[error("unrecognized entry tag {tag:#04x}")]
    UnrecognizedTag {
        /// The offending header byte.
        tag: u8,
    },
    /// The entry header is recognized but its fields are out of range.
    #[error("malformed entry header: {detail}")]
    MalformedHeader {
        /// Human-readable description of what went wrong.
        detail: String,
    },
    /// A format decoder rejected its payload.
    #[error("malformed payload for format id {format_id}: {detail}")]
    MalformedPayload {
        /// Format whose decoder failed.
        format_id: FormatId,
        /// Human-readable description of what went wrong.
        detail: String,
    },
    /// The underlying reader failed.
    #[error("failed to read stream")]
    Io(#[from] io::Error),
}

impl DecodeError {
    /// Short stable name of the error kind, for logs and summaries.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::TruncatedStream { .. } => "truncated_stream",
            Self::UnknownFormat { .. } => "unknown_format",
            Self::NonMonotonicTimestamp { .. } => "non_monotonic_timestamp",
            Self::UnrecognizedTag { .. } => "unrecognized_tag",
            Self::MalformedHeader { .. } => "malformed_header",
            Self::MalformedPayload { .. } => "malformed_payload",
            Self::Io(_) => "io",
        }
    }
}
