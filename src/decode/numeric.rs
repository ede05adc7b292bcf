//! Exact numeric conversions.
//!
//! Integers go through `i128`, wide enough for every `i64` and `u64`, so a
//! single range check per target covers all source representations.

use std::fmt::Display;
use std::str::FromStr;

use crate::types::Value;

/// 2^53, the largest magnitude below which every integer is an exact `f64`.
const F64_EXACT: u64 = 1 << 53;
/// 2^24, the same bound for `f32`.
const F32_EXACT: u64 = 1 << 24;

/// Why a value could not become an integer.
#[derive(Debug, PartialEq)]
pub(crate) enum IntegerError {
    /// Representation has no integer reading, e.g. a date.
    Unsupported,
    /// Text that is not a number.
    Malformed,
    /// A number with a non-zero fractional part.
    Fractional,
    /// Too large for any supported integer width.
    Overflow,
}

pub(crate) fn to_i128(value: &Value) -> Result<i128, IntegerError> {
    match value {
        Value::Int(i) => Ok(*i as i128),
        Value::UInt(u) => Ok(*u as i128),
        Value::Boolean(b) => Ok(*b as i128),
        Value::Float(x) => float_to_i128(*x),
        Value::Decimal(s) | Value::Text(s) => parse_integer(s),
        _ => Err(IntegerError::Unsupported),
    }
}

fn float_to_i128(x: f64) -> Result<i128, IntegerError> {
    if !x.is_finite() {
        return Err(IntegerError::Malformed);
    }
    if x.fract() != 0.0 {
        return Err(IntegerError::Fractional);
    }
    if x.abs() >= 2f64.powi(127) {
        return Err(IntegerError::Overflow);
    }
    Ok(x as i128)
}

/// Sign, digits and decimal point position of decimal text, with optional
/// exponent. The value is `0.d1d2...dn * 10^point`.
fn split_decimal(text: &str) -> Result<(bool, Vec<u8>, i64), IntegerError> {
    let text = text.trim();
    let (negative, unsigned) = match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    };
    let (mantissa, exponent) = match unsigned.find(['e', 'E']) {
        Some(at) => {
            let exponent = unsigned[at + 1..]
                .parse::<i32>()
                .map_err(|_| IntegerError::Malformed)?;
            (&unsigned[..at], exponent)
        }
        None => (unsigned, 0),
    };
    let (int_part, frac_part) = mantissa.split_once('.').unwrap_or((mantissa, ""));
    if int_part.is_empty() && frac_part.is_empty() {
        return Err(IntegerError::Malformed);
    }
    if !int_part.bytes().chain(frac_part.bytes()).all(|b| b.is_ascii_digit()) {
        return Err(IntegerError::Malformed);
    }
    let digits = int_part
        .bytes()
        .chain(frac_part.bytes())
        .map(|b| b - b'0')
        .collect();
    Ok((negative, digits, int_part.len() as i64 + exponent as i64))
}

/// Parse decimal text, with optional exponent, as an exact integer.
///
/// `"12.000"` and `"1.5E3"` are integers; `"12.5"` is not.
pub(crate) fn parse_integer(text: &str) -> Result<i128, IntegerError> {
    let (negative, digits, point) = split_decimal(text)?;
    let split = point.clamp(0, digits.len() as i64) as usize;
    let (whole, fraction) = digits.split_at(split);
    if fraction.iter().any(|&d| d != 0) {
        return Err(IntegerError::Fractional);
    }

    let trailing_zeros = (point - digits.len() as i64).max(0);
    let significant = whole.iter().skip_while(|&&d| d == 0).count() as i64;
    if significant > 0 && significant + trailing_zeros > 39 {
        return Err(IntegerError::Overflow);
    }

    let mut n: i128 = 0;
    for &d in whole {
        n = n
            .checked_mul(10)
            .and_then(|n| n.checked_add(d as i128))
            .ok_or(IntegerError::Overflow)?;
    }
    if n != 0 {
        for _ in 0..trailing_zeros {
            n = n.checked_mul(10).ok_or(IntegerError::Overflow)?;
        }
    }
    Ok(if negative { -n } else { n })
}

/// Decimal text reduced to its significant digits, so that equal numbers
/// compare equal whatever their notation.
fn normalized(text: &str) -> Option<(bool, Vec<u8>, i64)> {
    let (negative, digits, point) = split_decimal(text).ok()?;
    let leading = digits.iter().take_while(|&&d| d == 0).count();
    let trailing = digits[leading..].iter().rev().take_while(|&&d| d == 0).count();
    let significant = digits[leading..digits.len() - trailing].to_vec();
    if significant.is_empty() {
        return Some((false, significant, 0));
    }
    Some((negative, significant, point - leading as i64))
}

/// Decimal text as a float. Integers must lie within `exact`; other numbers
/// must read back as the same decimal from the float's shortest form.
fn parse_float<F>(text: &str, exact: u64, from_int: fn(i128) -> F) -> Option<F>
where
    F: FromStr + Display,
{
    match parse_integer(text) {
        Ok(n) => (n.unsigned_abs() <= exact as u128).then(|| from_int(n)),
        Err(IntegerError::Fractional) => {
            let x = text.trim().parse::<F>().ok()?;
            let same = normalized(&x.to_string()) == normalized(text);
            same.then_some(x)
        }
        Err(_) => None,
    }
}

/// Read a value as `f64`, failing when precision would be lost.
pub(crate) fn to_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Int(i) if i.unsigned_abs() <= F64_EXACT => Some(*i as f64),
        Value::UInt(u) if *u <= F64_EXACT => Some(*u as f64),
        Value::Float(x) => Some(*x),
        Value::Boolean(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::Decimal(s) | Value::Text(s) => parse_float(s, F64_EXACT, |n| n as f64),
        _ => None,
    }
    .filter(|x| x.is_finite())
}

pub(crate) fn to_f32(value: &Value) -> Option<f32> {
    match value {
        Value::Int(i) if i.unsigned_abs() <= F32_EXACT => Some(*i as f32),
        Value::UInt(u) if *u <= F32_EXACT => Some(*u as f32),
        Value::Float(x) => Some(*x as f32).filter(|y| *y as f64 == *x),
        Value::Boolean(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::Decimal(s) | Value::Text(s) => parse_float(s, F32_EXACT, |n| n as f32),
        _ => None,
    }
    .filter(|x| x.is_finite())
}

pub(crate) fn to_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Boolean(b) => Some(*b),
        Value::Int(0) | Value::UInt(0) => Some(false),
        Value::Int(1) | Value::UInt(1) => Some(true),
        Value::Float(x) if *x == 0.0 => Some(false),
        Value::Float(x) if *x == 1.0 => Some(true),
        Value::Decimal(s) | Value::Text(s) => match s.trim() {
            t if t.eq_ignore_ascii_case("true") => Some(true),
            t if t.eq_ignore_ascii_case("false") => Some(false),
            t => match parse_integer(t) {
                Ok(0) => Some(false),
                Ok(1) => Some(true),
                _ => None,
            },
        },
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_integer() {
        assert_eq!(parse_integer("42"), Ok(42));
        assert_eq!(parse_integer("-17"), Ok(-17));
        assert_eq!(parse_integer("+8"), Ok(8));
        assert_eq!(parse_integer("12.000"), Ok(12));
        assert_eq!(parse_integer("1.5E3"), Ok(1500));
        assert_eq!(parse_integer("1500e-2"), Ok(15));
        assert_eq!(parse_integer("0.0"), Ok(0));
        assert_eq!(parse_integer(".5e1"), Ok(5));
        assert_eq!(parse_integer("12.5"), Err(IntegerError::Fractional));
        assert_eq!(parse_integer("15e-1"), Err(IntegerError::Fractional));
        assert_eq!(parse_integer("abc"), Err(IntegerError::Malformed));
        assert_eq!(parse_integer(""), Err(IntegerError::Malformed));
        assert_eq!(parse_integer("1e100"), Err(IntegerError::Overflow));
        assert_eq!(parse_integer("0e100000"), Ok(0));
    }

    #[test]
    fn test_float_to_integer() {
        assert_eq!(to_i128(&Value::Float(3.0)), Ok(3));
        assert_eq!(to_i128(&Value::Float(3.5)), Err(IntegerError::Fractional));
        assert_eq!(to_i128(&Value::Float(f64::NAN)), Err(IntegerError::Malformed));
    }

    #[test]
    fn test_f64_precision() {
        assert_eq!(to_f64(&Value::Int(1 << 53)), Some(9_007_199_254_740_992.0));
        assert_eq!(to_f64(&Value::Int((1 << 53) + 1)), None);
        assert_eq!(to_f64(&Value::Decimal("123.45".into())), Some(123.45));
        assert_eq!(to_f64(&Value::Text("inf".into())), None);
        assert_eq!(to_f64(&Value::Decimal("1.25E-3".into())), Some(0.00125));
    }

    #[test]
    fn test_f64_rejects_inexact_decimal() {
        assert_eq!(to_f64(&Value::Decimal("9007199254740992".into())), Some(9_007_199_254_740_992.0));
        assert_eq!(to_f64(&Value::Decimal("9007199254740993".into())), None);
        assert_eq!(to_f64(&Value::Text("0.10000000000000000001".into())), None);
        assert_eq!(to_f64(&Value::Decimal("1e300".into())), None);
    }

    #[test]
    fn test_f32_range() {
        assert_eq!(to_f32(&Value::Int(16_777_216)), Some(16_777_216.0));
        assert_eq!(to_f32(&Value::Int(16_777_217)), None);
        assert_eq!(to_f32(&Value::Float(1e300)), None);
        assert_eq!(to_f32(&Value::Float(0.5)), Some(0.5));
        assert_eq!(to_f32(&Value::Float(0.1)), None);
        assert_eq!(to_f32(&Value::Float(f64::NAN)), None);
        assert_eq!(to_f32(&Value::Decimal("0.1".into())), Some(0.1));
        assert_eq!(to_f32(&Value::Decimal("16777217".into())), None);
        assert_eq!(to_f32(&Value::Decimal("123.456789".into())), None);
    }

    #[test]
    fn test_normalized() {
        assert_eq!(normalized("1.50"), normalized("15e-1"));
        assert_eq!(normalized("0.00125"), normalized("1.25E-3"));
        assert_eq!(normalized("-0.0"), normalized("0"));
        assert_ne!(normalized("1.5"), normalized("-1.5"));
    }

    #[test]
    fn test_bool() {
        assert_eq!(to_bool(&Value::Int(1)), Some(true));
        assert_eq!(to_bool(&Value::Int(2)), None);
        assert_eq!(to_bool(&Value::Text("FALSE".into())), Some(false));
        assert_eq!(to_bool(&Value::Decimal("1.0".into())), Some(true));
    }
}
