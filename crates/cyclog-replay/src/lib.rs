//! Stream framing and replay engine for cyclog binary logs.
//!
//! A cyclog stream is a dense, non-self-synchronizing sequence of entries
//! written by a low-overhead logger: log messages whose header fields are
//! delta-encoded against the previous message, periodic checkpoints carrying
//! timing calibration, and zero-byte padding. This crate walks such a stream
//! front to back and hands each message payload to a caller-supplied,
//! format-specific decoder.
//!
//! # Architecture
//!
//! - [`ByteCursor`] wraps any `BufRead` as a forward-only [`ByteSource`]
//! - [`classify`] peeks the next entry header without consuming it
//! - [`codec`] frames message headers and checkpoint payloads
//! - [`DecoderRegistry`] maps a [`FormatId`] to its decode routine
//! - [`Replayer`] owns the running delta state and drives the scan
//! - [`StreamWriter`] produces streams in the same format
//!
//! # Format
//!
//! ```text
//! [Entry] [Entry] ... [Entry]
//!
//! Entry = 0x00                                  (pad)
//!       | header fmt_delta ts_delta payload     (message)
//!       | header cycles unix_time cycles_per_s  (checkpoint)
//! ```
//!
//! See [`codec`] for the bit layout of the header byte.
//!
//! [`ByteSource`]: cyclog_core::ByteSource
//! [`FormatId`]: cyclog_core::FormatId

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod codec;
pub mod config;
pub mod cursor;
pub mod entry;
pub mod error;
pub mod registry;
pub mod render;
pub mod replay;
pub mod types;
pub mod writer;

pub use config::{ConfigError, ReplayConfig, TimeConversion, DEFAULT_CYCLES_PER_SECOND};
pub use cursor::ByteCursor;
pub use entry::{classify, EntryKind};
pub use error::{ReplayError, WriteError};
pub use registry::DecoderRegistry;
pub use render::{render_checkpoint, render_line};
pub use replay::{Events, Replayer};
pub use types::{
    Checkpoint, DecodedMetadata, RenderedMessage, ReplayEvent, ReplayPhase, ReplayState,
    ReplaySummary,
};
pub use writer::StreamWriter;

pub use cyclog_core::{ByteSource, DecodeError, DecodeRoutine, FormatId};
