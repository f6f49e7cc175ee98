//! Numeric interpretation of byte strings.
//!
//! Strings take part in arithmetic and comparison by their numeric prefix:
//! `"12abc"` reads as 12, `" 1.5e3"` as 1500.0, `"abc"` as 0. Whether the
//! *whole* string is numeric is a separate question answered by
//! [`numeric_kind`], which decides between numeric and byte-wise comparison.

use std::fmt;

/// Whether a string is a complete numeric literal, and of which kind.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum NumericKind {
    NotNumeric,
    Long,
    Double,
}

impl NumericKind {
    #[inline]
    pub fn is_numeric(self) -> bool {
        !matches!(self, NumericKind::NotNumeric)
    }
}

/// A number read from a string prefix.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Number {
    Long(i64),
    Double(f64),
}

impl Number {
    #[expect(
        clippy::cast_precision_loss,
        reason = "integer to double promotion follows the language's arithmetic"
    )]
    pub fn to_double(self) -> f64 {
        match self {
            Number::Long(n) => n as f64,
            Number::Double(d) => d,
        }
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Long(n) => write!(f, "{n}"),
            Number::Double(d) => f.write_str(&format_double(*d)),
        }
    }
}

#[inline]
fn is_space(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\r' | 0x0B | 0x0C)
}

fn skip_space(bytes: &[u8], mut i: usize) -> usize {
    while i < bytes.len() && is_space(bytes[i]) {
        i += 1;
    }
    i
}

fn hex_prefix(bytes: &[u8], i: usize) -> bool {
    bytes.len() > i + 1 && bytes[i] == b'0' && matches!(bytes[i + 1], b'x' | b'X')
}

/// Hex digits after a `0x` prefix, saturating on overflow.
fn parse_hex(bytes: &[u8]) -> i64 {
    let mut acc: i64 = 0;
    for &b in bytes {
        let Some(digit) = char::from(b).to_digit(16) else {
            break;
        };
        acc = match acc.checked_mul(16).and_then(|v| v.checked_add(i64::from(digit))) {
            Some(v) => v,
            None => return i64::MAX,
        };
    }
    acc
}

/// Integer value of the numeric prefix of `bytes`.
///
/// Leading whitespace is skipped, then either a `0x` hex literal or an
/// optionally signed run of decimal digits is read. Parsing stops at the
/// first byte that does not fit. Overflow saturates at `i64::MAX` /
/// `i64::MIN`. No digits at all gives 0.
pub fn parse_long(bytes: &[u8]) -> i64 {
    let mut i = skip_space(bytes, 0);
    if hex_prefix(bytes, i) {
        return parse_hex(&bytes[i + 2..]);
    }

    let negative = match bytes.get(i) {
        Some(b'-') => {
            i += 1;
            true
        }
        Some(b'+') => {
            i += 1;
            false
        }
        _ => false,
    };

    // Accumulate toward the sign so i64::MIN is representable.
    let mut acc: i64 = 0;
    while let Some(&b) = bytes.get(i) {
        if !b.is_ascii_digit() {
            break;
        }
        let digit = i64::from(b - b'0');
        let next = acc.checked_mul(10).and_then(|v| {
            if negative {
                v.checked_sub(digit)
            } else {
                v.checked_add(digit)
            }
        });
        match next {
            Some(v) => acc = v,
            None => return if negative { i64::MIN } else { i64::MAX },
        }
        i += 1;
    }
    acc
}

/// Span of the longest decimal float literal starting at `start`.
///
/// Returns the end offset and whether a fraction or exponent was consumed.
/// The end equals `start` when no digit was found.
fn scan_decimal(bytes: &[u8], start: usize) -> (usize, bool) {
    let mut i = start;
    if matches!(bytes.get(i), Some(b'-' | b'+')) {
        i += 1;
    }

    let int_start = i;
    while bytes.get(i).is_some_and(u8::is_ascii_digit) {
        i += 1;
    }
    let mut digits = i - int_start;
    let mut is_double = false;

    if bytes.get(i) == Some(&b'.') {
        let frac_start = i + 1;
        let mut j = frac_start;
        while bytes.get(j).is_some_and(u8::is_ascii_digit) {
            j += 1;
        }
        if digits > 0 || j > frac_start {
            digits += j - frac_start;
            is_double = true;
            i = j;
        }
    }

    if digits == 0 {
        return (start, false);
    }

    if matches!(bytes.get(i), Some(b'e' | b'E')) {
        let mut j = i + 1;
        if matches!(bytes.get(j), Some(b'-' | b'+')) {
            j += 1;
        }
        let exp_start = j;
        while bytes.get(j).is_some_and(u8::is_ascii_digit) {
            j += 1;
        }
        if j > exp_start {
            is_double = true;
            i = j;
        }
    }

    (i, is_double)
}

fn parse_float_span(bytes: &[u8]) -> f64 {
    // The span is ASCII by construction.
    std::str::from_utf8(bytes)
        .ok()
        .and_then(|s| s.parse::<f64>().ok())
        .unwrap_or(0.0)
}

/// Floating value of the numeric prefix of `bytes`.
///
/// Accepts the same hex form as [`parse_long`] and otherwise the longest
/// decimal prefix `[+-]digits[.digits][e[+-]digits]`. No digits gives 0.0.
pub fn parse_double(bytes: &[u8]) -> f64 {
    let start = skip_space(bytes, 0);
    if hex_prefix(bytes, start) {
        return Number::Long(parse_hex(&bytes[start + 2..])).to_double();
    }
    let (end, _) = scan_decimal(bytes, start);
    if end == start {
        return 0.0;
    }
    parse_float_span(&bytes[start..end])
}

/// Number read from the prefix of `bytes`, integer when the prefix has no
/// fraction or exponent.
pub fn parse_number(bytes: &[u8]) -> Number {
    let start = skip_space(bytes, 0);
    if hex_prefix(bytes, start) {
        return Number::Long(parse_hex(&bytes[start + 2..]));
    }
    match scan_decimal(bytes, start) {
        (end, _) if end == start => Number::Long(0),
        (end, true) => Number::Double(parse_float_span(&bytes[start..end])),
        (end, false) => {
            let literal = &bytes[start..end];
            if overflows_long(literal) {
                Number::Double(parse_float_span(literal))
            } else {
                Number::Long(parse_long(literal))
            }
        }
    }
}

/// True if an integer literal does not fit `i64`.
fn overflows_long(literal: &[u8]) -> bool {
    let parsed = parse_long(literal);
    if parsed != i64::MAX && parsed != i64::MIN {
        return false;
    }
    // Saturation is ambiguous with an exact bound; recheck via text.
    String::from_utf8_lossy(literal)
        .trim_start_matches('+')
        .parse::<i64>()
        .is_err()
}

/// Classify `bytes` as a complete numeric string.
///
/// Leading and trailing whitespace is allowed; anything else besides the
/// literal makes the string non-numeric. Integer literals that overflow
/// `i64` classify as `Double`. Hex is never numeric here.
pub fn numeric_kind(bytes: &[u8]) -> NumericKind {
    let start = skip_space(bytes, 0);
    let (end, is_double) = scan_decimal(bytes, start);
    if end == start || skip_space(bytes, end) != bytes.len() {
        return NumericKind::NotNumeric;
    }
    if is_double {
        return NumericKind::Double;
    }
    if overflows_long(&bytes[start..end]) {
        NumericKind::Double
    } else {
        NumericKind::Long
    }
}

/// The canonical integer spelling of `bytes`, if it is one.
///
/// Canonical means `0` or `-?[1-9][0-9]*` within `i64` range: no whitespace,
/// no `+`, no leading zeros and no `-0`. Only these strings key arrays as
/// integers.
pub fn canonical_int(bytes: &[u8]) -> Option<i64> {
    let digits = bytes.strip_prefix(b"-").unwrap_or(bytes);
    match digits {
        [] => return None,
        [b'0'] => return (digits.len() == bytes.len()).then_some(0),
        [b'0', ..] => return None,
        _ => {}
    }
    if !digits.iter().all(u8::is_ascii_digit) || digits.len() > 20 {
        return None;
    }
    std::str::from_utf8(bytes).ok()?.parse::<i64>().ok()
}

/// Render a double the way the language prints it: 14 significant digits,
/// trailing zeros dropped, exponent form below `1e-4` and from `1e14` up.
pub fn format_double(value: f64) -> String {
    if value.is_nan() {
        return "NAN".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "INF" } else { "-INF" }.to_string();
    }
    if value == 0.0 {
        return if value.is_sign_negative() { "-0" } else { "0" }.to_string();
    }

    let sci = format!("{value:.13e}");
    let Some((mantissa, exp)) = sci.split_once('e') else {
        return sci;
    };
    let exp: i32 = exp.parse().unwrap_or(0);

    if !(-4..14).contains(&exp) {
        let mantissa = trim_fraction(mantissa);
        let mantissa = if mantissa.contains('.') {
            mantissa.to_string()
        } else {
            format!("{mantissa}.0")
        };
        let sign = if exp < 0 { '-' } else { '+' };
        return format!("{mantissa}E{sign}{}", exp.unsigned_abs());
    }

    let decimals = usize::try_from(13 - exp).unwrap_or(0);
    trim_fraction(&format!("{value:.decimals$}")).to_string()
}

fn trim_fraction(s: &str) -> &str {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.')
    } else {
        s
    }
}
