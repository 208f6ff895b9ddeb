//! A decode routine driven by a parsed format string.

use cyclog_core::{ByteSource, DecodeError, DecodeRoutine, FormatId};

use crate::format_string::FormatString;
use crate::pack::unpack_args;
use crate::printf;

/// Unpacks a payload laid out for `format` and renders it printf-style.
///
/// # Examples
///
/// ```
/// use cyclog_core::{DecodeRoutine, FormatId};
/// use cyclog_format::{pack_args, ArgValue, CatalogDecoder, FormatString};
/// use cyclog_replay::ByteCursor;
///
/// let fmt = FormatString::parse("retry %d of %d").unwrap();
/// let payload = pack_args(&fmt, &[ArgValue::Int(2), ArgValue::Int(5)]).unwrap();
///
/// let decoder = CatalogDecoder::new(fmt);
/// let mut src = ByteCursor::new(payload.as_slice());
/// assert_eq!(decoder.decode(FormatId(0), &mut src).unwrap(), "retry 2 of 5");
/// ```
#[derive(Clone, Debug)]
pub struct CatalogDecoder {
    format: FormatString,
    prefix: String,
}

impl CatalogDecoder {
    /// A decoder for `format` with no prefix.
    pub fn new(format: FormatString) -> Self {
        Self {
            format,
            prefix: String::new(),
        }
    }

    /// Prepend `prefix` to every rendered message.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// The format this decoder renders.
    pub fn format(&self) -> &FormatString {
        &self.format
    }
}

impl DecodeRoutine for CatalogDecoder {
    fn decode(&self, format_id: FormatId, src: &mut dyn ByteSource) -> Result<String, DecodeError> {
        let args = unpack_args(src, format_id, &self.format)?;
        let body = printf::render(&self.format, &args).map_err(|e| {
            DecodeError::MalformedPayload {
                format_id,
                detail: e.to_string(),
            }
        })?;
        if self.prefix.is_empty() {
            Ok(body)
        } else {
            Ok(format!("{}{body}", self.prefix))
        }
    }
}
