//! Entry classification.
//!
//! The two low bits of an entry's first byte name its kind. Classification
//! only peeks: the header byte stays in the stream until the caller commits
//! to a decoder for that kind.

use cyclog_core::{ByteSource, DecodeError};

/// Mask selecting the entry type bits of a header byte.
pub const ENTRY_TYPE_MASK: u8 = 0b0000_0011;
/// Entry type of pad bytes (a pad byte is exactly `0x00`).
pub const ENTRY_TYPE_PAD: u8 = 0;
/// Entry type of a log message.
pub const ENTRY_TYPE_MESSAGE: u8 = 1;
/// Entry type of a checkpoint.
pub const ENTRY_TYPE_CHECKPOINT: u8 = 2;

/// The kind of the entry at the cursor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntryKind {
    /// A delta-encoded log message.
    Message,
    /// A timing calibration record.
    Checkpoint,
    /// Anything else. `byte == 0` is padding; any other value is an
    /// unrecognized tag.
    Invalid {
        /// The header byte as read.
        byte: u8,
    },
}

impl EntryKind {
    /// Classify a header byte.
    pub fn from_header(byte: u8) -> Self {
        match byte & ENTRY_TYPE_MASK {
            ENTRY_TYPE_MESSAGE => Self::Message,
            ENTRY_TYPE_CHECKPOINT => Self::Checkpoint,
            _ => Self::Invalid { byte },
        }
    }

    /// Whether this is a zero pad byte.
    pub fn is_pad(&self) -> bool {
        matches!(self, Self::Invalid { byte: 0 })
    }
}

/// Peek the next entry's kind without consuming anything.
///
/// Returns `Ok(None)` when the stream ends at an entry boundary.
pub fn classify(src: &mut dyn ByteSource) -> Result<Option<EntryKind>, DecodeError> {
    Ok(src.peek()?.map(EntryKind::from_header))
}
