//! Parsing printf-like format strings.
//!
//! A [`FormatString`] is a list of literal and conversion [`Piece`]s plus
//! the argument kinds the conversions consume, in order. Only the subset of
//! printf whose arguments can be recovered from a packed payload is
//! accepted: `*` widths, `%n` and `%a` are rejected at parse time.

use smallvec::SmallVec;

use crate::error::FormatParseError;

/// How an argument is stored in the payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArgKind {
    /// Signed integer (`%d`, `%i`).
    Signed,
    /// Unsigned integer (`%u`, `%o`, `%x`, `%X`).
    Unsigned,
    /// Character (`%c`), packed as an unsigned integer.
    Char,
    /// Pointer (`%p`), packed as an unsigned integer.
    Pointer,
    /// Floating point (`%f`, `%e`, `%g` and upper-case forms), 8 raw bytes.
    Float,
    /// NUL-terminated string (`%s`), stored after all other arguments.
    Str,
}

impl ArgKind {
    /// Whether the argument lives in the trailing string section.
    pub fn is_string(&self) -> bool {
        matches!(self, Self::Str)
    }
}

/// C length modifier. Only affects how integers are truncated on display.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Length {
    /// `hh`
    Char,
    /// `h`
    Short,
    /// No modifier.
    #[default]
    Int,
    /// `l`
    Long,
    /// `ll`
    LongLong,
    /// `j`
    IntMax,
    /// `z`
    Size,
    /// `t`
    PtrDiff,
    /// `L`
    LongDouble,
}

impl Length {
    /// Bit width of the integer type this modifier selects.
    pub fn int_bits(&self) -> u32 {
        match self {
            Self::Char => 8,
            Self::Short => 16,
            Self::Int => 32,
            _ => 64,
        }
    }
}

/// One `%` conversion.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Conversion {
    /// `-` flag.
    pub left_align: bool,
    /// `+` flag.
    pub force_sign: bool,
    /// Space flag.
    pub space_sign: bool,
    /// `#` flag.
    pub alternate: bool,
    /// `0` flag.
    pub zero_pad: bool,
    /// Minimum field width.
    pub width: Option<usize>,
    /// Precision.
    pub precision: Option<usize>,
    /// Length modifier.
    pub length: Length,
    /// Conversion character.
    pub conv: char,
}

impl Conversion {
    /// Argument kind this conversion consumes.
    pub fn arg_kind(&self) -> ArgKind {
        match self.conv {
            'd' | 'i' => ArgKind::Signed,
            'c' => ArgKind::Char,
            'p' => ArgKind::Pointer,
            'f' | 'F' | 'e' | 'E' | 'g' | 'G' => ArgKind::Float,
            's' => ArgKind::Str,
            _ => ArgKind::Unsigned,
        }
    }
}

/// A segment of a parsed format string.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Piece {
    /// Text copied verbatim (with `%%` already collapsed).
    Literal(String),
    /// A conversion consuming one argument.
    Conversion(Conversion),
}

/// A parsed format string.
///
/// # Examples
///
/// ```
/// use cyclog_format::{ArgKind, FormatString};
///
/// let fmt = FormatString::parse("%s took %5.2f ms (%d%%)").unwrap();
/// assert_eq!(fmt.arg_kinds(), &[ArgKind::Str, ArgKind::Float, ArgKind::Signed]);
/// assert_eq!(fmt.non_string_count(), 2);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FormatString {
    source: String,
    pieces: Vec<Piece>,
    args: SmallVec<[ArgKind; 8]>,
}

const CONVERSIONS: &str = "diuoxXcpfFeEgGs";

impl FormatString {
    /// Parse `source`.
    pub fn parse(source: &str) -> Result<Self, FormatParseError> {
        let mut pieces = Vec::new();
        let mut args = SmallVec::new();
        let mut literal = String::new();

        let bytes = source.as_bytes();
        let mut chars = source.char_indices().peekable();
        while let Some((pos, c)) = chars.next() {
            if c != '%' {
                literal.push(c);
                continue;
            }
            if let Some(&(_, '%')) = chars.peek() {
                chars.next();
                literal.push('%');
                continue;
            }

            // Everything up to the conversion character is ASCII, so walk
            // bytes directly and resync the char iterator afterwards.
            let mut i = pos + 1;
            let mut conv = Conversion::default();
            while let Some(&b) = bytes.get(i) {
                match b {
                    b'-' => conv.left_align = true,
                    b'+' => conv.force_sign = true,
                    b' ' => conv.space_sign = true,
                    b'#' => conv.alternate = true,
                    b'0' => conv.zero_pad = true,
                    _ => break,
                }
                i += 1;
            }

            if bytes.get(i) == Some(&b'*') {
                return Err(FormatParseError::DynamicWidth(i));
            }
            conv.width = parse_number(bytes, &mut i);

            if bytes.get(i) == Some(&b'.') {
                i += 1;
                if bytes.get(i) == Some(&b'*') {
                    return Err(FormatParseError::DynamicWidth(i));
                }
                conv.precision = Some(parse_number(bytes, &mut i).unwrap_or(0));
            }

            conv.length = parse_length(bytes, &mut i);

            let ch = match source.get(i..).and_then(|rest| rest.chars().next()) {
                Some(ch) => ch,
                None => return Err(FormatParseError::Incomplete(pos)),
            };
            if !CONVERSIONS.contains(ch) {
                return Err(FormatParseError::Unsupported { conv: ch, pos });
            }
            conv.conv = ch;
            i += ch.len_utf8();

            while chars.peek().is_some_and(|&(p, _)| p < i) {
                chars.next();
            }

            if !literal.is_empty() {
                pieces.push(Piece::Literal(std::mem::take(&mut literal)));
            }
            args.push(conv.arg_kind());
            pieces.push(Piece::Conversion(conv));
        }
        if !literal.is_empty() {
            pieces.push(Piece::Literal(literal));
        }

        Ok(Self {
            source: source.to_string(),
            pieces,
            args,
        })
    }

    /// The original format string.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Parsed segments in order.
    pub fn pieces(&self) -> &[Piece] {
        &self.pieces
    }

    /// Argument kinds in the order the conversions consume them.
    pub fn arg_kinds(&self) -> &[ArgKind] {
        &self.args
    }

    /// Number of arguments stored in the packed (non-string) section.
    pub fn non_string_count(&self) -> usize {
        self.args.iter().filter(|k| !k.is_string()).count()
    }

    /// Iterate over conversions only.
    pub fn conversions(&self) -> impl Iterator<Item = &Conversion> {
        self.pieces.iter().filter_map(|p| match p {
            Piece::Conversion(c) => Some(c),
            Piece::Literal(_) => None,
        })
    }
}

fn parse_number(bytes: &[u8], i: &mut usize) -> Option<usize> {
    let start = *i;
    let mut value = 0usize;
    while let Some(&b) = bytes.get(*i) {
        if !b.is_ascii_digit() {
            break;
        }
        value = value.saturating_mul(10).saturating_add((b - b'0') as usize);
        *i += 1;
    }
    (*i > start).then_some(value)
}

fn parse_length(bytes: &[u8], i: &mut usize) -> Length {
    let (length, len) = match (bytes.get(*i), bytes.get(*i + 1)) {
        (Some(b'h'), Some(b'h')) => (Length::Char, 2),
        (Some(b'h'), _) => (Length::Short, 1),
        (Some(b'l'), Some(b'l')) => (Length::LongLong, 2),
        (Some(b'l'), _) => (Length::Long, 1),
        (Some(b'j'), _) => (Length::IntMax, 1),
        (Some(b'z'), _) => (Length::Size, 1),
        (Some(b't'), _) => (Length::PtrDiff, 1),
        (Some(b'L'), _) => (Length::LongDouble, 1),
        _ => (Length::Int, 0),
    };
    *i += len;
    length
}
