//! C `printf` rendering of unpacked arguments.
//!
//! Output matches glibc for the supported conversions, including integer
//! truncation by length modifier, `(nil)` pointers, two-digit exponents and
//! `%g` trailing-zero removal.

use crate::error::PackError;
use crate::format_string::{ArgKind, Conversion, FormatString, Piece};
use crate::pack::{check_args, ArgValue};

/// Render `fmt` with `args`.
///
/// # Examples
///
/// ```
/// use cyclog_format::{printf, ArgValue, FormatString};
///
/// let fmt = FormatString::parse("%s: %5.1f%% (%#x)").unwrap();
/// let args = [ArgValue::Str("load".into()), ArgValue::Float(42.26), ArgValue::Uint(255)];
/// assert_eq!(printf::render(&fmt, &args).unwrap(), "load:  42.3% (0xff)");
/// ```
pub fn render(fmt: &FormatString, args: &[ArgValue]) -> Result<String, PackError> {
    check_args(fmt, args)?;
    let mut out = String::with_capacity(fmt.as_str().len() + 8 * args.len());
    let mut args = args.iter();
    for piece in fmt.pieces() {
        match piece {
            Piece::Literal(text) => out.push_str(text),
            Piece::Conversion(conv) => {
                if let Some(arg) = args.next() {
                    write_arg(&mut out, conv, arg);
                }
            }
        }
    }
    Ok(out)
}

/// Append one converted argument to `out`.
pub fn write_arg(out: &mut String, conv: &Conversion, arg: &ArgValue) {
    match conv.arg_kind() {
        ArgKind::Signed => write_signed(out, conv, arg.bits() as i64),
        ArgKind::Unsigned => write_unsigned(out, conv, arg.bits()),
        ArgKind::Char => {
            let byte = [arg.bits() as u8];
            pad(out, conv, "", &String::from_utf8_lossy(&byte), false);
        }
        ArgKind::Pointer => write_pointer(out, conv, arg.bits()),
        ArgKind::Float => write_float(out, conv, arg.as_f64()),
        ArgKind::Str => {
            let s = match arg {
                ArgValue::Str(s) => s.as_str(),
                _ => "",
            };
            // Precision counts bytes; never split a character.
            let s = match conv.precision {
                Some(p) if p < s.len() => {
                    let mut end = p;
                    while !s.is_char_boundary(end) {
                        end -= 1;
                    }
                    &s[..end]
                }
                _ => s,
            };
            pad(out, conv, "", s, false);
        }
    }
}

fn sign_prefix(conv: &Conversion, negative: bool) -> &'static str {
    if negative {
        "-"
    } else if conv.force_sign {
        "+"
    } else if conv.space_sign {
        " "
    } else {
        ""
    }
}

/// Apply integer precision: minimum digit count, and `%.0d` of zero is empty.
fn with_precision(digits: String, precision: Option<usize>) -> String {
    match precision {
        Some(0) if digits == "0" => String::new(),
        Some(p) if digits.len() < p => format!("{}{digits}", "0".repeat(p - digits.len())),
        _ => digits,
    }
}

fn write_signed(out: &mut String, conv: &Conversion, raw: i64) {
    let v = match conv.length.int_bits() {
        8 => raw as i8 as i64,
        16 => raw as i16 as i64,
        32 => raw as i32 as i64,
        _ => raw,
    };
    let digits = with_precision(v.unsigned_abs().to_string(), conv.precision);
    pad(out, conv, sign_prefix(conv, v < 0), &digits, conv.precision.is_none());
}

fn write_unsigned(out: &mut String, conv: &Conversion, raw: u64) {
    let bits = conv.length.int_bits();
    let v = if bits >= 64 { raw } else { raw & ((1u64 << bits) - 1) };
    let p = conv.precision;
    let (prefix, digits) = match conv.conv {
        'o' => {
            let mut d = with_precision(format!("{v:o}"), p);
            if conv.alternate && !d.starts_with('0') {
                d.insert(0, '0');
            }
            ("", d)
        }
        'x' => (
            if conv.alternate && v != 0 { "0x" } else { "" },
            with_precision(format!("{v:x}"), p),
        ),
        'X' => (
            if conv.alternate && v != 0 { "0X" } else { "" },
            with_precision(format!("{v:X}"), p),
        ),
        _ => ("", with_precision(v.to_string(), p)),
    };
    pad(out, conv, prefix, &digits, p.is_none());
}

fn write_pointer(out: &mut String, conv: &Conversion, v: u64) {
    if v == 0 {
        pad(out, conv, "", "(nil)", false);
    } else {
        let digits = with_precision(format!("{v:x}"), conv.precision);
        pad(out, conv, "0x", &digits, conv.precision.is_none());
    }
}

fn write_float(out: &mut String, conv: &Conversion, v: f64) {
    let upper = conv.conv.is_ascii_uppercase();
    let sign = sign_prefix(conv, v.is_sign_negative());
    let a = v.abs();

    if !a.is_finite() {
        let body = match (a.is_nan(), upper) {
            (true, false) => "nan",
            (true, true) => "NAN",
            (false, false) => "inf",
            (false, true) => "INF",
        };
        pad(out, conv, sign, body, false);
        return;
    }

    let precision = conv.precision.unwrap_or(6);
    let body = match conv.conv {
        'e' | 'E' => exponential(a, precision, conv.alternate),
        'g' | 'G' => general(a, precision, conv.alternate),
        _ => fixed(a, precision, conv.alternate),
    };
    let body = if upper { body.to_ascii_uppercase() } else { body };
    pad(out, conv, sign, &body, true);
}

fn fixed(a: f64, precision: usize, alternate: bool) -> String {
    let mut s = format!("{a:.precision$}");
    if alternate && precision == 0 {
        s.push('.');
    }
    s
}

/// `d.ddde±XX`. Rust prints `1.5e2`; C wants a signed, two-digit exponent.
fn exponential(a: f64, precision: usize, alternate: bool) -> String {
    let s = format!("{a:.precision$e}");
    let (mantissa, exp) = s.split_once('e').unwrap_or((s.as_str(), "0"));
    let exp: i32 = exp.parse().unwrap_or(0);
    let dot = if alternate && precision == 0 { "." } else { "" };
    let exp_sign = if exp < 0 { '-' } else { '+' };
    format!("{mantissa}{dot}e{exp_sign}{:02}", exp.unsigned_abs())
}

/// Decimal exponent of `a` once rounded to `precision` fractional digits
/// in exponential form.
fn decimal_exponent(a: f64, precision: usize) -> i32 {
    let s = format!("{a:.precision$e}");
    s.split_once('e')
        .and_then(|(_, exp)| exp.parse().ok())
        .unwrap_or(0)
}

fn general(a: f64, precision: usize, alternate: bool) -> String {
    let p = precision.max(1);
    let x = decimal_exponent(a, p - 1);
    let s = if x >= -4 && x < p as i32 {
        fixed(a, (p as i32 - 1 - x) as usize, alternate)
    } else {
        exponential(a, p - 1, alternate)
    };
    if alternate {
        s
    } else {
        strip_trailing_zeros(&s)
    }
}

fn strip_trailing_zeros(s: &str) -> String {
    let (mantissa, exp) = match s.find('e') {
        Some(i) => s.split_at(i),
        None => (s, ""),
    };
    let mantissa = if mantissa.contains('.') {
        mantissa.trim_end_matches('0').trim_end_matches('.')
    } else {
        mantissa
    };
    format!("{mantissa}{exp}")
}

/// Write `prefix` and `body` padded to the field width.
///
/// Zero fill goes between prefix and body, and only when `zero_ok`.
fn pad(out: &mut String, conv: &Conversion, prefix: &str, body: &str, zero_ok: bool) {
    let len = prefix.chars().count() + body.chars().count();
    let fill = conv.width.unwrap_or(0).saturating_sub(len);
    if conv.left_align {
        out.push_str(prefix);
        out.push_str(body);
        out.extend(std::iter::repeat_n(' ', fill));
    } else if conv.zero_pad && zero_ok {
        out.push_str(prefix);
        out.extend(std::iter::repeat_n('0', fill));
        out.push_str(body);
    } else {
        out.extend(std::iter::repeat_n(' ', fill));
        out.push_str(prefix);
        out.push_str(body);
    }
}
