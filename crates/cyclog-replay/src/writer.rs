//! Stream writer.
//!
//! [`StreamWriter`] produces entries in the format [`Replayer`](crate::Replayer)
//! consumes, tracking the delta chain itself. Used to build fixtures and
//! to re-emit filtered streams.

use std::io::Write;

use cyclog_core::FormatId;

use crate::codec::{encode_checkpoint, encode_metadata};
use crate::error::WriteError;
use crate::types::Checkpoint;

/// Writes log entries to a byte sink.
///
/// Generic over `W: Write` so tests can use `Vec<u8>` and production
/// code can use `BufWriter<File>`.
///
/// # Examples
///
/// ```
/// use cyclog_replay::{Checkpoint, FormatId, StreamWriter};
///
/// let mut writer = StreamWriter::new(Vec::new());
/// writer
///     .write_checkpoint(&Checkpoint { cycle_counter: 0, unix_time: 0, cycles_per_second: 1e9 })
///     .unwrap();
/// writer.write_message(FormatId(3), 100, &[]).unwrap();
/// writer.write_message(FormatId(3), 150, &[]).unwrap();
/// assert_eq!(writer.messages_written(), 2);
///
/// let bytes = writer.into_inner();
/// // 25-byte checkpoint, then 1 + 1 + 1 and 1 + 1 header bytes.
/// assert_eq!(bytes.len(), 25 + 3 + 2);
/// ```
pub struct StreamWriter<W: Write> {
    writer: W,
    last_format_id: FormatId,
    last_timestamp: u64,
    messages_written: u64,
    bytes_written: u64,
}

impl<W: Write> StreamWriter<W> {
    /// Create a writer at the start of a stream.
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            last_format_id: FormatId(0),
            last_timestamp: 0,
            messages_written: 0,
            bytes_written: 0,
        }
    }

    /// Write a message header followed by an already-encoded payload.
    ///
    /// `timestamp` must not precede the previous message's timestamp.
    pub fn write_message(
        &mut self,
        format_id: FormatId,
        timestamp: u64,
        payload: &[u8],
    ) -> Result<(), WriteError> {
        if timestamp < self.last_timestamp {
            return Err(WriteError::TimestampRegression {
                previous: self.last_timestamp,
                timestamp,
            });
        }
        let n = encode_metadata(
            &mut self.writer,
            self.last_format_id.delta_to(format_id),
            timestamp - self.last_timestamp,
        )?;
        self.writer.write_all(payload)?;

        self.last_format_id = format_id;
        self.last_timestamp = timestamp;
        self.messages_written += 1;
        self.bytes_written += (n + payload.len()) as u64;
        Ok(())
    }

    /// Write a checkpoint. Does not touch the message delta chain.
    pub fn write_checkpoint(&mut self, cp: &Checkpoint) -> Result<(), WriteError> {
        let n = encode_checkpoint(&mut self.writer, cp)?;
        self.bytes_written += n as u64;
        Ok(())
    }

    /// Write `len` zero pad bytes.
    pub fn write_padding(&mut self, len: usize) -> Result<(), WriteError> {
        self.writer.write_all(&vec![0u8; len])?;
        self.bytes_written += len as u64;
        Ok(())
    }

    /// Flush the underlying writer.
    pub fn flush(&mut self) -> Result<(), WriteError> {
        self.writer.flush()?;
        Ok(())
    }

    /// Number of messages written so far.
    pub fn messages_written(&self) -> u64 {
        self.messages_written
    }

    /// Number of bytes written so far.
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    /// Consume the writer and return the underlying `Write` sink.
    pub fn into_inner(self) -> W {
        self.writer
    }
}
