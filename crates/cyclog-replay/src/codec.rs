//! Binary framing for message headers and checkpoints.
//!
//! All integers are little-endian. Every entry starts with a header byte:
//!
//! ```text
//!  7      4 3    2 1    0
//! +--------+------+------+
//! | ts_len | fmt  | type |
//! +--------+------+------+
//! ```
//!
//! For a message, `fmt` selects a format id delta of 0, 1, 2 or 4 bytes and
//! `ts_len` is the timestamp delta width in bytes (0..=8). A zero-width delta
//! is a zero delta, so a repeat of the previous format at the same tick costs
//! a single byte. A checkpoint header is followed by a fixed 24-byte body.

use std::io::Write;

use cyclog_core::{ByteSource, DecodeError, FormatId};

use crate::entry::{ENTRY_TYPE_CHECKPOINT, ENTRY_TYPE_MASK, ENTRY_TYPE_MESSAGE};
use crate::types::{Checkpoint, DecodedMetadata};

const FMT_CODE_SHIFT: u8 = 2;
const FMT_CODE_MASK: u8 = 0b11;
const TS_WIDTH_SHIFT: u8 = 4;

/// Byte width of the format id delta for each 2-bit code.
const FMT_WIDTHS: [usize; 4] = [0, 1, 2, 4];

/// Widest permitted timestamp delta.
pub const MAX_TIMESTAMP_WIDTH: usize = 8;

/// Encoded size of a checkpoint entry including its header byte.
pub const CHECKPOINT_LEN: usize = 1 + 8 + 8 + 8;

// ── Width selection ─────────────────────────────────────────────

/// Smallest 2-bit code whose width holds `delta`.
pub fn format_delta_code(delta: u32) -> u8 {
    match delta {
        0 => 0,
        1..=0xFF => 1,
        0x100..=0xFFFF => 2,
        _ => 3,
    }
}

/// Smallest byte count that holds `delta` (0 for zero).
pub fn timestamp_delta_width(delta: u64) -> usize {
    (64 - delta.leading_zeros() as usize).div_ceil(8)
}

// ── Message header ──────────────────────────────────────────────

/// Consume a message header and rebuild its absolute values.
///
/// `last_format_id` and `last_timestamp` are the previous message's
/// absolute values (zero before the first message). A reconstructed
/// timestamp earlier than `last_timestamp` is rejected as corruption.
pub fn decode_metadata(
    src: &mut dyn ByteSource,
    last_format_id: FormatId,
    last_timestamp: u64,
) -> Result<DecodedMetadata, DecodeError> {
    let header = src.consume_u8()?;
    if header & ENTRY_TYPE_MASK != ENTRY_TYPE_MESSAGE {
        return Err(DecodeError::MalformedHeader {
            detail: format!("expected a message header, found {header:#04x}"),
        });
    }

    let fmt_width = FMT_WIDTHS[((header >> FMT_CODE_SHIFT) & FMT_CODE_MASK) as usize];
    let ts_width = (header >> TS_WIDTH_SHIFT) as usize;
    if ts_width > MAX_TIMESTAMP_WIDTH {
        return Err(DecodeError::MalformedHeader {
            detail: format!("timestamp delta width {ts_width} exceeds {MAX_TIMESTAMP_WIDTH}"),
        });
    }

    // Format delta first, then timestamp delta.
    let fmt_delta = src.consume_uint_le(fmt_width)? as u32;
    let ts_delta = src.consume_uint_le(ts_width)?;

    let timestamp = last_timestamp.wrapping_add(ts_delta);
    if timestamp < last_timestamp {
        return Err(DecodeError::NonMonotonicTimestamp {
            previous: last_timestamp,
            delta: ts_delta,
        });
    }

    Ok(DecodedMetadata {
        format_id: last_format_id.apply_delta(fmt_delta),
        timestamp,
        encoded_len: 1 + fmt_width + ts_width,
    })
}

/// Write a message header carrying the given deltas, using the narrowest
/// widths. Returns the number of bytes written.
pub fn encode_metadata(
    w: &mut dyn Write,
    fmt_delta: u32,
    ts_delta: u64,
) -> std::io::Result<usize> {
    let fmt_code = format_delta_code(fmt_delta);
    let fmt_width = FMT_WIDTHS[fmt_code as usize];
    let ts_width = timestamp_delta_width(ts_delta);

    let header =
        ENTRY_TYPE_MESSAGE | (fmt_code << FMT_CODE_SHIFT) | ((ts_width as u8) << TS_WIDTH_SHIFT);
    w.write_all(&[header])?;
    w.write_all(&u64::from(fmt_delta).to_le_bytes()[..fmt_width])?;
    w.write_all(&ts_delta.to_le_bytes()[..ts_width])?;
    Ok(1 + fmt_width + ts_width)
}

// ── Checkpoint ──────────────────────────────────────────────────

/// Consume a checkpoint entry, header byte included.
pub fn decode_checkpoint(src: &mut dyn ByteSource) -> Result<Checkpoint, DecodeError> {
    let header = src.consume_u8()?;
    if header & ENTRY_TYPE_MASK != ENTRY_TYPE_CHECKPOINT {
        return Err(DecodeError::MalformedHeader {
            detail: format!("expected a checkpoint header, found {header:#04x}"),
        });
    }

    let mut body = [0u8; CHECKPOINT_LEN - 1];
    src.consume_exact(&mut body)?;
    let field = |i: usize| {
        let mut word = [0u8; 8];
        word.copy_from_slice(&body[i * 8..(i + 1) * 8]);
        word
    };

    Ok(Checkpoint {
        cycle_counter: u64::from_le_bytes(field(0)),
        unix_time: u64::from_le_bytes(field(1)),
        cycles_per_second: f64::from_le_bytes(field(2)),
    })
}

/// Write a checkpoint entry.
pub fn encode_checkpoint(w: &mut dyn Write, cp: &Checkpoint) -> std::io::Result<usize> {
    w.write_all(&[ENTRY_TYPE_CHECKPOINT])?;
    w.write_all(&cp.cycle_counter.to_le_bytes())?;
    w.write_all(&cp.unix_time.to_le_bytes())?;
    w.write_all(&cp.cycles_per_second.to_le_bytes())?;
    Ok(CHECKPOINT_LEN)
}
