//! Canonical numeric encoders.
//!
//! The write-side mirror of [`decode`](crate::cobol::decode): zoned, packed,
//! and binary encoders producing the canonical byte image (0xF zones on
//! leading digits, 0xC/0xD sign for signed fields, 0xF for unsigned,
//! zero-padded to the declared width). Decoding a canonical image and
//! re-encoding it reproduces the bytes exactly.

use byteorder::{BigEndian, ByteOrder};
use thiserror::Error;

use crate::cobol::pic::binary_width;

/// Value rejected by an encoder.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncodeError {
    /// Magnitude needs more digits than the field declares.
    #[error("value needs more than {digits} digits")]
    ValueOutOfRange { digits: u32 },

    /// Negative value in an unsigned field.
    #[error("negative value in unsigned field")]
    NegativeUnsigned,
}

fn check_range(unscaled: i128, digits: u32, signed: bool) -> Result<u128, EncodeError> {
    if unscaled < 0 && !signed {
        return Err(EncodeError::NegativeUnsigned);
    }
    let magnitude = unscaled.unsigned_abs();
    if magnitude >= 10u128.pow(digits.min(38)) {
        return Err(EncodeError::ValueOutOfRange { digits });
    }
    Ok(magnitude)
}

/// Encode a zoned decimal: one byte per digit, 0xF zones, sign in the
/// last byte's zone (0xC non-negative / 0xD negative for signed fields,
/// 0xF for unsigned).
///
/// # Examples
///
/// ```
/// use mfd::cobol::encode::encode_zoned;
///
/// assert_eq!(encode_zoned(-123, 3, true).unwrap(), vec![0xF1, 0xF2, 0xD3]);
/// assert_eq!(encode_zoned(42, 3, false).unwrap(), vec![0xF0, 0xF4, 0xF2]);
/// ```
pub fn encode_zoned(unscaled: i128, digits: u32, signed: bool) -> Result<Vec<u8>, EncodeError> {
    let magnitude = check_range(unscaled, digits, signed)?;
    let text = format!("{magnitude:0>width$}", width = digits as usize);
    let mut bytes: Vec<u8> = text.bytes().map(|d| 0xF0 | (d - b'0')).collect();
    if signed {
        let sign = if unscaled < 0 { 0xD0 } else { 0xC0 };
        if let Some(last) = bytes.last_mut() {
            *last = sign | (*last & 0x0F);
        }
    }
    Ok(bytes)
}

/// Encode a packed decimal: BCD nibbles left-padded with zero to fill
/// ⌈(digits+1)/2⌉ bytes, sign in the final low nibble.
///
/// # Examples
///
/// ```
/// use mfd::cobol::encode::encode_packed;
///
/// assert_eq!(encode_packed(12345, 5, true).unwrap(), vec![0x12, 0x34, 0x5C]);
/// assert_eq!(encode_packed(-123, 5, true).unwrap(), vec![0x00, 0x12, 0x3D]);
/// ```
pub fn encode_packed(unscaled: i128, digits: u32, signed: bool) -> Result<Vec<u8>, EncodeError> {
    let magnitude = check_range(unscaled, digits, signed)?;
    let width = (digits as usize + 2) / 2;
    let nibble_count = width * 2 - 1;
    let text = format!("{magnitude:0>width$}", width = nibble_count);

    let mut bytes = vec![0u8; width];
    for (index, digit) in text.bytes().enumerate() {
        let value = digit - b'0';
        if index % 2 == 0 {
            bytes[index / 2] |= value << 4;
        } else {
            bytes[index / 2] |= value;
        }
    }
    let sign = if !signed {
        0x0F
    } else if unscaled < 0 {
        0x0D
    } else {
        0x0C
    };
    bytes[width - 1] |= sign;
    Ok(bytes)
}

/// Encode a big-endian binary integer at the width implied by the declared
/// digit count.
///
/// # Examples
///
/// ```
/// use mfd::cobol::encode::encode_binary;
///
/// assert_eq!(encode_binary(-2, 4, true).unwrap(), vec![0xFF, 0xFE]);
/// assert_eq!(encode_binary(42, 9, true).unwrap(), vec![0x00, 0x00, 0x00, 0x2A]);
/// ```
pub fn encode_binary(value: i64, digits: u32, signed: bool) -> Result<Vec<u8>, EncodeError> {
    if value < 0 && !signed {
        return Err(EncodeError::NegativeUnsigned);
    }
    let width = binary_width(digits) as usize;
    let fits = match (width, signed) {
        (2, true) => i64::from(i16::MIN) <= value && value <= i64::from(i16::MAX),
        (2, false) => value <= i64::from(u16::MAX),
        (4, true) => i64::from(i32::MIN) <= value && value <= i64::from(i32::MAX),
        (4, false) => value <= i64::from(u32::MAX),
        _ => true,
    };
    if !fits {
        return Err(EncodeError::ValueOutOfRange { digits });
    }
    let mut bytes = vec![0u8; width];
    match width {
        2 => BigEndian::write_i16(&mut bytes, value as i16),
        4 => BigEndian::write_i32(&mut bytes, value as i32),
        _ => BigEndian::write_i64(&mut bytes, value),
    }
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cobol::decode::{decode_binary, decode_packed, decode_zoned};
    use crate::types::{DecimalValue, LogicalValue};

    fn unscaled_of(value: &LogicalValue) -> i128 {
        match value {
            LogicalValue::Int(v) => *v as i128,
            LogicalValue::Decimal(DecimalValue { unscaled, .. }) => *unscaled,
            other => panic!("non-numeric value {other:?}"),
        }
    }

    #[test]
    fn test_zoned_round_trip() {
        for value in [-99999i128, -1234, -1, 0, 1, 7, 42, 99999] {
            let bytes = encode_zoned(value, 5, true).unwrap();
            let decoded = decode_zoned(&bytes, 5, 0).unwrap();
            assert_eq!(unscaled_of(&decoded), value);
            let re = encode_zoned(unscaled_of(&decoded), 5, true).unwrap();
            assert_eq!(re, bytes, "value {value}");
        }
    }

    #[test]
    fn test_zoned_unsigned_round_trip() {
        for value in [0i128, 9, 450, 9999] {
            let bytes = encode_zoned(value, 4, false).unwrap();
            assert!(bytes.iter().all(|b| b >> 4 == 0xF));
            let decoded = decode_zoned(&bytes, 4, 0).unwrap();
            assert_eq!(unscaled_of(&decoded), value);
            assert_eq!(encode_zoned(value, 4, false).unwrap(), bytes);
        }
    }

    #[test]
    fn test_packed_round_trip() {
        for value in [-12345i128, -1, 0, 1, 123, 12345] {
            let bytes = encode_packed(value, 5, true).unwrap();
            assert_eq!(bytes.len(), 3);
            let decoded = decode_packed(&bytes, 5, 2).unwrap();
            assert_eq!(unscaled_of(&decoded), value);
            let re = encode_packed(unscaled_of(&decoded), 5, true).unwrap();
            assert_eq!(re, bytes, "value {value}");
        }
    }

    #[test]
    fn test_packed_even_digits_zero_pad() {
        // digits=4 -> 3 bytes, 5 nibbles, leading nibble zero.
        let bytes = encode_packed(1234, 4, true).unwrap();
        assert_eq!(bytes, vec![0x01, 0x23, 0x4C]);
    }

    #[test]
    fn test_packed_unsigned_sign_nibble() {
        assert_eq!(encode_packed(123, 3, false).unwrap(), vec![0x12, 0x3F]);
    }

    #[test]
    fn test_binary_round_trip() {
        for (value, digits) in [(0i64, 4), (-1, 4), (i16::MAX as i64, 4), (i16::MIN as i64, 4)] {
            let bytes = encode_binary(value, digits, true).unwrap();
            assert_eq!(decode_binary(&bytes, true), LogicalValue::Int(value));
        }
        for (value, digits) in [(123456i64, 9), (i32::MIN as i64, 9)] {
            let bytes = encode_binary(value, digits, true).unwrap();
            assert_eq!(decode_binary(&bytes, true), LogicalValue::Int(value));
        }
        for (value, digits) in [(i64::MAX, 18), (i64::MIN, 18)] {
            let bytes = encode_binary(value, digits, true).unwrap();
            assert_eq!(decode_binary(&bytes, true), LogicalValue::Int(value));
        }
    }

    #[test]
    fn test_range_checks() {
        assert_eq!(
            encode_zoned(100000, 5, true),
            Err(EncodeError::ValueOutOfRange { digits: 5 })
        );
        assert_eq!(encode_zoned(-1, 5, false), Err(EncodeError::NegativeUnsigned));
        assert_eq!(
            encode_packed(-100000, 5, true),
            Err(EncodeError::ValueOutOfRange { digits: 5 })
        );
        assert_eq!(
            encode_binary(40000, 4, true),
            Err(EncodeError::ValueOutOfRange { digits: 4 })
        );
        assert_eq!(encode_binary(40000, 4, false).unwrap(), vec![0x9C, 0x40]);
    }
}
