//! Argument packing.
//!
//! Non-string arguments are stored in the smallest number of little-endian
//! bytes that holds them, with one 4-bit width code per argument:
//!
//! | nibble  | meaning                                                   |
//! |---------|-----------------------------------------------------------|
//! | `0..=8` | that many bytes, zero-extended to 64 bits                 |
//! | `9..=15`| a negative value whose magnitude fills `nibble - 8` bytes |
//!
//! Floats always use nibble 8 and their raw `f64` bits. Strings follow the
//! packed section in argument order, each terminated by a NUL byte.

use cyclog_core::{ByteSource, DecodeError, FormatId};

use crate::error::PackError;
use crate::format_string::{ArgKind, FormatString};

/// Nibble value that marks a negative magnitude. `NEGATIVE + n` means `n` bytes.
const NEGATIVE: u8 = 8;

/// A decoded (or to-be-packed) argument.
#[derive(Clone, Debug, PartialEq)]
pub enum ArgValue {
    /// Signed integer.
    Int(i64),
    /// Unsigned integer, character code, or pointer.
    Uint(u64),
    /// Floating point.
    Float(f64),
    /// String.
    Str(String),
}

impl ArgValue {
    /// Whether this value may be supplied for an argument of `kind`.
    ///
    /// Integer kinds accept either signedness, matching C's varargs.
    pub fn fits(&self, kind: ArgKind) -> bool {
        match kind {
            ArgKind::Signed | ArgKind::Unsigned | ArgKind::Char | ArgKind::Pointer => {
                matches!(self, Self::Int(_) | Self::Uint(_))
            }
            ArgKind::Float => matches!(self, Self::Float(_)),
            ArgKind::Str => matches!(self, Self::Str(_)),
        }
    }

    /// The value's 64-bit two's-complement pattern.
    pub fn bits(&self) -> u64 {
        match self {
            Self::Int(v) => *v as u64,
            Self::Uint(v) => *v,
            Self::Float(v) => v.to_bits(),
            Self::Str(_) => 0,
        }
    }

    /// The value as a float.
    pub fn as_f64(&self) -> f64 {
        match self {
            Self::Int(v) => *v as f64,
            Self::Uint(v) => *v as f64,
            Self::Float(v) => *v,
            Self::Str(_) => 0.0,
        }
    }
}

/// Check that `args` match the conversions of `fmt` in count and type.
pub(crate) fn check_args(fmt: &FormatString, args: &[ArgValue]) -> Result<(), PackError> {
    let kinds = fmt.arg_kinds();
    if kinds.len() != args.len() {
        return Err(PackError::ArgCount {
            expected: kinds.len(),
            got: args.len(),
        });
    }
    for (index, (conv, arg)) in fmt.conversions().zip(args).enumerate() {
        if !arg.fits(conv.arg_kind()) {
            return Err(PackError::ArgType {
                index,
                conv: conv.conv,
            });
        }
    }
    Ok(())
}

/// Bytes needed to hold `v` without leading zero bytes.
fn byte_width(v: u64) -> usize {
    (u64::BITS - v.leading_zeros()).div_ceil(8) as usize
}

/// Width nibble and value bytes for one packed argument.
fn encode_one(arg: &ArgValue) -> (u8, u64, usize) {
    match arg {
        ArgValue::Float(v) => (8, v.to_bits(), 8),
        ArgValue::Int(v) if *v < 0 => {
            let magnitude = v.unsigned_abs();
            let width = byte_width(magnitude);
            if width < 8 {
                (NEGATIVE + width as u8, magnitude, width)
            } else {
                (8, *v as u64, 8)
            }
        }
        other => {
            let bits = other.bits();
            let width = byte_width(bits);
            (width as u8, bits, width)
        }
    }
}

/// Pack `args` for `fmt` into a message payload.
///
/// # Examples
///
/// ```
/// use cyclog_format::{pack_args, ArgValue, FormatString};
///
/// let fmt = FormatString::parse("%d %s").unwrap();
/// let bytes = pack_args(&fmt, &[ArgValue::Int(-2), ArgValue::Str("ok".into())]).unwrap();
/// assert_eq!(bytes, [0x09, 0x02, b'o', b'k', 0]);
/// ```
pub fn pack_args(fmt: &FormatString, args: &[ArgValue]) -> Result<Vec<u8>, PackError> {
    check_args(fmt, args)?;

    let packed: Vec<&ArgValue> = args.iter().filter(|a| !matches!(a, ArgValue::Str(_))).collect();
    let mut out = vec![0u8; packed.len().div_ceil(2)];
    let mut values = Vec::with_capacity(packed.len() * 2);
    for (i, arg) in packed.into_iter().enumerate() {
        let (nibble, bits, width) = encode_one(arg);
        out[i / 2] |= nibble << (4 * (i % 2));
        values.extend_from_slice(&bits.to_le_bytes()[..width]);
    }
    out.extend_from_slice(&values);

    for (index, arg) in args.iter().enumerate() {
        if let ArgValue::Str(s) = arg {
            if s.as_bytes().contains(&0) {
                return Err(PackError::InteriorNul { index });
            }
            out.extend_from_slice(s.as_bytes());
            out.push(0);
        }
    }
    Ok(out)
}

/// Read the arguments of `fmt` from a message payload.
pub fn unpack_args(
    src: &mut dyn ByteSource,
    format_id: FormatId,
    fmt: &FormatString,
) -> Result<Vec<ArgValue>, DecodeError> {
    let kinds = fmt.arg_kinds();
    let count = fmt.non_string_count();

    let mut nibble_bytes = vec![0u8; count.div_ceil(2)];
    src.consume_exact(&mut nibble_bytes)?;

    let mut args = Vec::with_capacity(kinds.len());
    let mut packed = 0;
    for &kind in kinds {
        if kind.is_string() {
            // Placeholder until the string section is read.
            args.push(ArgValue::Str(String::new()));
            continue;
        }
        let nibble = (nibble_bytes[packed / 2] >> (4 * (packed % 2))) & 0x0F;
        packed += 1;
        args.push(read_packed(src, format_id, kind, nibble)?);
    }

    for (arg, kind) in args.iter_mut().zip(kinds) {
        if kind.is_string() {
            *arg = ArgValue::Str(read_c_string(src)?);
        }
    }
    Ok(args)
}

fn read_packed(
    src: &mut dyn ByteSource,
    format_id: FormatId,
    kind: ArgKind,
    nibble: u8,
) -> Result<ArgValue, DecodeError> {
    if kind == ArgKind::Float {
        if nibble != 8 {
            return Err(DecodeError::MalformedPayload {
                format_id,
                detail: format!("float argument packed with width code {nibble}"),
            });
        }
        return Ok(ArgValue::Float(f64::from_bits(src.consume_uint_le(8)?)));
    }

    let bits = if nibble > NEGATIVE {
        let magnitude = src.consume_uint_le((nibble - NEGATIVE) as usize)?;
        (magnitude as i64).wrapping_neg() as u64
    } else {
        src.consume_uint_le(nibble as usize)?
    };
    Ok(match kind {
        ArgKind::Signed => ArgValue::Int(bits as i64),
        _ => ArgValue::Uint(bits),
    })
}

fn read_c_string(src: &mut dyn ByteSource) -> Result<String, DecodeError> {
    let mut bytes = Vec::new();
    loop {
        match src.consume_u8()? {
            0 => break,
            b => bytes.push(b),
        }
    }
    Ok(String::from_utf8(bytes).unwrap_or_else(|e| String::from_utf8_lossy(e.as_bytes()).into_owned()))
}
