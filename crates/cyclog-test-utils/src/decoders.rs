//! Mock decode routines.
//!
//! - [`fixed_text`]: consumes nothing, always renders the same text.
//! - [`FixedLenDecoder`]: consumes a fixed number of bytes, renders them as hex.
//! - [`LengthPrefixedText`]: reads a `u8` length and that many UTF-8 bytes.

use cyclog_core::{ByteSource, DecodeError, DecodeRoutine, FormatId};

/// A routine with an empty payload that renders `text`.
pub fn fixed_text(
    text: &'static str,
) -> impl Fn(FormatId, &mut dyn ByteSource) -> Result<String, DecodeError> {
    move |_, _| Ok(text.to_string())
}

/// Consumes exactly `len` payload bytes and renders `label` plus their hex.
pub struct FixedLenDecoder {
    pub label: String,
    pub len: usize,
}

impl FixedLenDecoder {
    pub fn new(label: impl Into<String>, len: usize) -> Self {
        Self {
            label: label.into(),
            len,
        }
    }
}

impl DecodeRoutine for FixedLenDecoder {
    fn decode(&self, _format_id: FormatId, src: &mut dyn ByteSource) -> Result<String, DecodeError> {
        let mut buf = vec![0u8; self.len];
        src.consume_exact(&mut buf)?;
        let hex: String = buf.iter().map(|b| format!("{b:02x}")).collect();
        Ok(format!("{} {}", self.label, hex))
    }
}

/// Reads a one-byte length then that many bytes of UTF-8 text.
pub struct LengthPrefixedText;

impl DecodeRoutine for LengthPrefixedText {
    fn decode(&self, format_id: FormatId, src: &mut dyn ByteSource) -> Result<String, DecodeError> {
        let len = src.consume_u8()? as usize;
        let mut buf = vec![0u8; len];
        src.consume_exact(&mut buf)?;
        String::from_utf8(buf).map_err(|e| DecodeError::MalformedPayload {
            format_id,
            detail: format!("invalid UTF-8: {e}"),
        })
    }
}
