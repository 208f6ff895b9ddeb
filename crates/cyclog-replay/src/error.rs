//! Error types for replay and stream writing.

use std::io;

use thiserror::Error;

use cyclog_core::{DecodeError, FormatId};

/// A fatal replay failure with the context needed to diagnose it.
///
/// Wraps the underlying [`DecodeError`] together with where the failing
/// entry started and the last values of the delta chain.
#[derive(Debug, Error)]
#[error(
    "entry at byte {entry_offset}, after {messages_emitted} messages, \
     last format id {last_format_id}, last timestamp {last_timestamp}"
)]
pub struct ReplayError {
    /// What went wrong.
    #[source]
    pub source: DecodeError,
    /// Offset of the first byte of the failing entry.
    pub entry_offset: u64,
    /// Format id of the last good message.
    pub last_format_id: FormatId,
    /// Timestamp of the last good message.
    pub last_timestamp: u64,
    /// Messages emitted before the failure.
    pub messages_emitted: u64,
}

impl ReplayError {
    /// The underlying decode error.
    pub fn kind(&self) -> &DecodeError {
        &self.source
    }
}

/// Errors from [`StreamWriter`](crate::StreamWriter).
#[derive(Debug, Error)]
pub enum WriteError {
    /// The sink failed.
    #[error("failed to write stream")]
    Io(#[from] io::Error),
    /// The message would move time backwards.
    #[error("timestamp {timestamp} precedes previous timestamp {previous}")]
    TimestampRegression {
        /// Timestamp of the previous message.
        previous: u64,
        /// The rejected timestamp.
        timestamp: u64,
    },
}
