//! Oracle NUMBER decoder.
//!
//! NUMBER is variable length:
//! - byte 0 is the base-100 exponent, biased by 65, with the sign in the
//!   high bit; negative numbers store it bit-inverted
//! - the remaining bytes are base-100 mantissa digits, stored as `digit + 1`
//!   for positive numbers and `101 - digit` for negative ones
//! - negative numbers shorter than 21 bytes end with a `102` terminator
//!
//! Zero is the single byte `0x80`.

use crate::error::{Error, Result};

const NEGATIVE_TERMINATOR: u8 = 102;

/// Decode a NUMBER to its exact decimal text.
///
/// The result never has leading zeros in the integer part, trailing zeros in
/// the fraction, or a dangling decimal point.
pub(crate) fn decode_number(bytes: &[u8]) -> Result<String> {
    let (&exp_byte, mantissa) = bytes
        .split_first()
        .ok_or_else(|| Error::protocol("NUMBER value is empty"))?;
    let positive = exp_byte & 0x80 != 0;
    if positive && mantissa.is_empty() {
        if exp_byte == 0x80 {
            return Ok("0".to_string());
        }
        return Err(Error::protocol(format!(
            "NUMBER exponent byte {:#04x} without mantissa",
            exp_byte
        )));
    }
    let mantissa = match mantissa.split_last() {
        Some((&NEGATIVE_TERMINATOR, rest)) if !positive => rest,
        _ => mantissa,
    };
    if mantissa.is_empty() {
        return Err(Error::protocol("NUMBER infinity cannot be represented"));
    }

    let biased = (if positive { exp_byte } else { !exp_byte }) & 0x7f;
    let exponent = biased as i32 - 65;

    let mut digits = String::with_capacity(mantissa.len() * 2);
    for &b in mantissa {
        let pair = if positive { b.checked_sub(1) } else { 101u8.checked_sub(b) };
        let pair = pair
            .filter(|pair| *pair < 100)
            .ok_or_else(|| Error::protocol(format!("invalid NUMBER mantissa byte {}", b)))?;
        digits.push((b'0' + pair / 10) as char);
        digits.push((b'0' + pair % 10) as char);
    }

    // Decimal digits before the point.
    let point = 2 * (exponent + 1);
    let mut text = if point <= 0 {
        format!("0.{}{}", "0".repeat((-point) as usize), digits)
    } else if point as usize >= digits.len() {
        format!("{}{}", digits, "0".repeat(point as usize - digits.len()))
    } else {
        let (int_part, frac_part) = digits.split_at(point as usize);
        format!("{}.{}", int_part, frac_part)
    };

    if text.contains('.') {
        let trimmed = text.trim_end_matches('0').trim_end_matches('.').len();
        text.truncate(trimmed);
    }
    let leading = text
        .bytes()
        .take_while(|&b| b == b'0')
        .count()
        .min(text.len().saturating_sub(1));
    let mut text = text.split_off(leading);
    if text.starts_with('.') {
        text.insert(0, '0');
    }

    if !positive && text != "0" {
        text.insert(0, '-');
    }
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_zero() {
        assert_eq!(decode_number(&[0x80]).unwrap(), "0");
    }

    #[test]
    fn test_decode_positive_integers() {
        assert_eq!(decode_number(&[0xc1, 0x02]).unwrap(), "1");
        assert_eq!(decode_number(&[0xc1, 0x2b]).unwrap(), "42");
        assert_eq!(decode_number(&[0xc2, 0x02]).unwrap(), "100");
        assert_eq!(decode_number(&[0xc2, 0x02, 0x18]).unwrap(), "123");
        assert_eq!(decode_number(&[0xc3, 0x02, 0x01, 0x01]).unwrap(), "10000");
    }

    #[test]
    fn test_decode_fractions() {
        assert_eq!(decode_number(&[0xc2, 0x02, 0x18, 0x2e]).unwrap(), "123.45");
        assert_eq!(decode_number(&[0xc0, 0x33]).unwrap(), "0.5");
        assert_eq!(decode_number(&[0xc0, 0x02]).unwrap(), "0.01");
        assert_eq!(decode_number(&[0xbf, 0x0d]).unwrap(), "0.0012");
    }

    #[test]
    fn test_decode_negative() {
        assert_eq!(decode_number(&[0x3e, 0x64, 0x66]).unwrap(), "-1");
        assert_eq!(decode_number(&[0x3d, 0x64, 0x4e, 0x38, 0x66]).unwrap(), "-123.45");
    }

    #[test]
    fn test_decode_invalid() {
        assert!(decode_number(&[]).is_err());
        assert!(decode_number(&[0xc1, 0x00]).is_err());
        assert!(decode_number(&[0xc1, 0x66]).is_err());
        assert!(decode_number(&[0x00]).is_err());
    }
}
