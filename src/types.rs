//! Physical and logical type model shared by every parser and the decoder.
//!
//! A [`PhysicalType`] describes on-disk bytes exactly — width, representation
//! family, signedness — while a [`LogicalType`] describes what a downstream
//! consumer sees. The two are linked by [`PhysicalType::logical_type`]:
//!
//! | Physical | Width | Logical |
//! |----------|-------|---------|
//! | `Text { length }` | length | String |
//! | `ZonedDecimal { digits, scale }` | digits | Decimal / IntNN |
//! | `PackedDecimal { digits, scale }` | ⌈(digits+1)/2⌉ | Decimal / IntNN |
//! | `Binary { bytes }` | 2 / 4 / 8 | Int16 / Int32 / Int64 |
//! | `Float4` / `Float8` | 4 / 8 | Float32 / Float64 |

use std::fmt;

use serde::Serialize;

use crate::cobol::codepage::CodePage;

/// Physical storage description of one elementary field.
///
/// Every variant has a constant [`byte_width`](PhysicalType::byte_width);
/// the layout builder and the decoder both rely on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PhysicalType {
    /// Fixed-length character data in the given code page.
    Text { length: usize, codec: CodePage },
    /// Zoned decimal (USAGE DISPLAY): one byte per digit, sign in the zone
    /// nibble of the last byte.
    ZonedDecimal { digits: u32, scale: u32, signed: bool },
    /// Packed decimal (COMP-3): two BCD digits per byte, sign in the low
    /// nibble of the last byte.
    PackedDecimal { digits: u32, scale: u32, signed: bool },
    /// Big-endian binary integer (COMP / COMP-4 / COMP-5), 2, 4, or 8 bytes,
    /// two's complement when signed.
    Binary { bytes: u8, signed: bool },
    /// Single-precision float (COMP-1).
    Float4,
    /// Double-precision float (COMP-2).
    Float8,
}

impl PhysicalType {
    /// Storage width in bytes for a single occurrence.
    ///
    /// # Examples
    ///
    /// ```
    /// use mfd::types::PhysicalType;
    ///
    /// let packed = PhysicalType::PackedDecimal { digits: 9, scale: 2, signed: true };
    /// assert_eq!(packed.byte_width(), 5);
    ///
    /// let zoned = PhysicalType::ZonedDecimal { digits: 7, scale: 0, signed: false };
    /// assert_eq!(zoned.byte_width(), 7);
    /// ```
    pub fn byte_width(&self) -> usize {
        match *self {
            PhysicalType::Text { length, .. } => length,
            PhysicalType::ZonedDecimal { digits, .. } => digits as usize,
            PhysicalType::PackedDecimal { digits, .. } => (digits as usize + 2) / 2,
            PhysicalType::Binary { bytes, .. } => bytes as usize,
            PhysicalType::Float4 => 4,
            PhysicalType::Float8 => 8,
        }
    }

    /// The logical type a decoded value of this physical type carries.
    ///
    /// Zoned and packed decimals with a non-zero scale (or more than 18
    /// digits) map to `Decimal(digits, scale)`; otherwise the smallest
    /// integer type that holds the declared digit count is chosen.
    pub fn logical_type(&self) -> LogicalType {
        match *self {
            PhysicalType::Text { .. } => LogicalType::String,
            PhysicalType::ZonedDecimal { digits, scale, .. }
            | PhysicalType::PackedDecimal { digits, scale, .. } => {
                if scale > 0 || digits > 18 {
                    LogicalType::Decimal { precision: digits, scale }
                } else {
                    LogicalType::integer_for_digits(digits)
                }
            }
            PhysicalType::Binary { bytes, .. } => match bytes {
                2 => LogicalType::Int16,
                4 => LogicalType::Int32,
                _ => LogicalType::Int64,
            },
            PhysicalType::Float4 => LogicalType::Float32,
            PhysicalType::Float8 => LogicalType::Float64,
        }
    }

    /// Whether the representation carries a sign.
    pub fn is_signed(&self) -> bool {
        match *self {
            PhysicalType::ZonedDecimal { signed, .. }
            | PhysicalType::PackedDecimal { signed, .. }
            | PhysicalType::Binary { signed, .. } => signed,
            PhysicalType::Float4 | PhysicalType::Float8 => true,
            PhysicalType::Text { .. } => false,
        }
    }
}

impl fmt::Display for PhysicalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            PhysicalType::Text { length, codec } => write!(f, "TEXT({length}, {codec})"),
            PhysicalType::ZonedDecimal { digits, scale, signed } => {
                write!(f, "ZONED({digits},{scale}{})", if signed { ",S" } else { "" })
            }
            PhysicalType::PackedDecimal { digits, scale, signed } => {
                write!(f, "PACKED({digits},{scale}{})", if signed { ",S" } else { "" })
            }
            PhysicalType::Binary { bytes, signed } => {
                write!(f, "BINARY({bytes}{})", if signed { ",S" } else { "" })
            }
            PhysicalType::Float4 => write!(f, "FLOAT4"),
            PhysicalType::Float8 => write!(f, "FLOAT8"),
        }
    }
}

/// Logical (consumer-facing) type of a column or field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LogicalType {
    String,
    Int16,
    Int32,
    Int64,
    Decimal { precision: u32, scale: u32 },
    Float32,
    Float64,
    Date,
    Timestamp,
    Binary,
    Boolean,
}

impl LogicalType {
    /// Smallest integer logical type holding `digits` decimal digits.
    ///
    /// 1–4 digits fit Int16, 5–9 fit Int32, 10–18 fit Int64; wider counts
    /// fall back to an exact decimal.
    pub fn integer_for_digits(digits: u32) -> LogicalType {
        match digits {
            0..=4 => LogicalType::Int16,
            5..=9 => LogicalType::Int32,
            10..=18 => LogicalType::Int64,
            _ => LogicalType::Decimal { precision: digits, scale: 0 },
        }
    }
}

impl fmt::Display for LogicalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            LogicalType::String => write!(f, "STRING"),
            LogicalType::Int16 => write!(f, "INT16"),
            LogicalType::Int32 => write!(f, "INT32"),
            LogicalType::Int64 => write!(f, "INT64"),
            LogicalType::Decimal { precision, scale } => write!(f, "DECIMAL({precision},{scale})"),
            LogicalType::Float32 => write!(f, "FLOAT32"),
            LogicalType::Float64 => write!(f, "FLOAT64"),
            LogicalType::Date => write!(f, "DATE"),
            LogicalType::Timestamp => write!(f, "TIMESTAMP"),
            LogicalType::Binary => write!(f, "BINARY"),
            LogicalType::Boolean => write!(f, "BOOLEAN"),
        }
    }
}

/// Exact decimal value: an unscaled i128 plus precision and scale.
///
/// i128 holds 38 decimal digits; COBOL pictures and DB2 DECIMAL both cap at
/// 31, so every in-range mainframe value is representable without rounding.
///
/// # Examples
///
/// ```
/// use mfd::types::DecimalValue;
///
/// assert_eq!(DecimalValue::new(12345, 5, 2).to_string(), "123.45");
/// assert_eq!(DecimalValue::new(-123, 5, 2).to_string(), "-1.23");
/// assert_eq!(DecimalValue::new(42, 3, 0).to_string(), "42");
/// assert_eq!(DecimalValue::new(7, 5, 4).to_string(), "0.0007");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecimalValue {
    /// The value with the decimal point removed.
    pub unscaled: i128,
    /// Declared total digit count.
    pub precision: u32,
    /// Digits to the right of the decimal point.
    pub scale: u32,
}

impl DecimalValue {
    pub fn new(unscaled: i128, precision: u32, scale: u32) -> Self {
        DecimalValue { unscaled, precision, scale }
    }

    /// True when the value is strictly negative.
    pub fn is_negative(&self) -> bool {
        self.unscaled < 0
    }
}

impl fmt::Display for DecimalValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let magnitude = self.unscaled.unsigned_abs().to_string();
        let sign = if self.unscaled < 0 { "-" } else { "" };
        let scale = self.scale as usize;
        if scale == 0 {
            return write!(f, "{sign}{magnitude}");
        }
        if magnitude.len() <= scale {
            write!(f, "{sign}0.{magnitude:0>scale$}")
        } else {
            let split = magnitude.len() - scale;
            write!(f, "{sign}{}.{}", &magnitude[..split], &magnitude[split..])
        }
    }
}

/// A decoded logical value.
///
/// Produced by the physical decoder; date and timestamp values only arise
/// from SQL-sourced data supplied by the caller and carry ISO-8601 text.
#[derive(Debug, Clone, PartialEq)]
pub enum LogicalValue {
    /// Absent value (lenient decode substitution or SQL NULL).
    Null,
    /// Character data.
    Str(String),
    /// Integer within the Int64 range.
    Int(i64),
    /// Exact decimal.
    Decimal(DecimalValue),
    /// Single-precision float.
    Float(f32),
    /// Double-precision float.
    Double(f64),
    /// Boolean.
    Bool(bool),
    /// Raw bytes (FOR BIT DATA and binary SQL types).
    Bytes(Vec<u8>),
    /// Calendar date, ISO-8601 `YYYY-MM-DD`.
    Date(String),
    /// Timestamp, ISO-8601.
    Timestamp(String),
    /// OCCURS expansion: one element per occurrence.
    Array(Vec<LogicalValue>),
    /// Group item rendered as a nested namespace.
    Group(Vec<(String, LogicalValue)>),
}

impl LogicalValue {
    pub fn is_null(&self) -> bool {
        matches!(self, LogicalValue::Null)
    }
}

/// Record format tag from the dataset registry.
///
/// Only fixed-length (`F`) data is decodable by this crate; `V` and `VB`
/// are recognized so registry entries naming them can be rejected up front.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RecordFormat {
    /// Fixed-length records.
    F,
    /// Variable-length records.
    V,
    /// Variable-blocked records.
    #[serde(rename = "VB")]
    Vb,
}

impl RecordFormat {
    /// Parse the registry tag (`"F"`, `"V"`, `"VB"`).
    pub fn from_tag(tag: &str) -> Option<RecordFormat> {
        match tag.trim().to_ascii_uppercase().as_str() {
            "F" => Some(RecordFormat::F),
            "V" => Some(RecordFormat::V),
            "VB" => Some(RecordFormat::Vb),
            _ => None,
        }
    }

    /// Whether the core decoder handles this format.
    pub fn is_supported(&self) -> bool {
        matches!(self, RecordFormat::F)
    }
}

impl fmt::Display for RecordFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordFormat::F => write!(f, "F"),
            RecordFormat::V => write!(f, "V"),
            RecordFormat::Vb => write!(f, "VB"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_byte_widths() {
        let codec = CodePage::default();
        assert_eq!(PhysicalType::Text { length: 25, codec }.byte_width(), 25);
        assert_eq!(
            PhysicalType::ZonedDecimal { digits: 5, scale: 2, signed: true }.byte_width(),
            5
        );
        // Packed: ceil((digits + 1) / 2)
        assert_eq!(
            PhysicalType::PackedDecimal { digits: 5, scale: 0, signed: false }.byte_width(),
            3
        );
        assert_eq!(
            PhysicalType::PackedDecimal { digits: 6, scale: 0, signed: false }.byte_width(),
            4
        );
        assert_eq!(PhysicalType::Binary { bytes: 8, signed: true }.byte_width(), 8);
        assert_eq!(PhysicalType::Float4.byte_width(), 4);
        assert_eq!(PhysicalType::Float8.byte_width(), 8);
    }

    #[test]
    fn test_logical_derivation() {
        let codec = CodePage::default();
        assert_eq!(
            PhysicalType::Text { length: 10, codec }.logical_type(),
            LogicalType::String
        );
        assert_eq!(
            PhysicalType::ZonedDecimal { digits: 4, scale: 0, signed: false }.logical_type(),
            LogicalType::Int16
        );
        assert_eq!(
            PhysicalType::ZonedDecimal { digits: 9, scale: 0, signed: true }.logical_type(),
            LogicalType::Int32
        );
        assert_eq!(
            PhysicalType::ZonedDecimal { digits: 18, scale: 0, signed: true }.logical_type(),
            LogicalType::Int64
        );
        assert_eq!(
            PhysicalType::PackedDecimal { digits: 9, scale: 2, signed: true }.logical_type(),
            LogicalType::Decimal { precision: 9, scale: 2 }
        );
        assert_eq!(
            PhysicalType::Binary { bytes: 2, signed: true }.logical_type(),
            LogicalType::Int16
        );
        assert_eq!(PhysicalType::Float8.logical_type(), LogicalType::Float64);
    }

    #[test]
    fn test_integer_tiers() {
        assert_eq!(LogicalType::integer_for_digits(1), LogicalType::Int16);
        assert_eq!(LogicalType::integer_for_digits(4), LogicalType::Int16);
        assert_eq!(LogicalType::integer_for_digits(5), LogicalType::Int32);
        assert_eq!(LogicalType::integer_for_digits(9), LogicalType::Int32);
        assert_eq!(LogicalType::integer_for_digits(10), LogicalType::Int64);
        assert_eq!(LogicalType::integer_for_digits(18), LogicalType::Int64);
        assert_eq!(
            LogicalType::integer_for_digits(19),
            LogicalType::Decimal { precision: 19, scale: 0 }
        );
    }

    #[test]
    fn test_decimal_display() {
        assert_eq!(DecimalValue::new(0, 5, 2).to_string(), "0.00");
        assert_eq!(DecimalValue::new(-7, 5, 2).to_string(), "-0.07");
        assert_eq!(DecimalValue::new(100, 5, 2).to_string(), "1.00");
        assert_eq!(DecimalValue::new(i128::from(u64::MAX), 20, 0).to_string(), u64::MAX.to_string());
    }

    #[test]
    fn test_record_format_tags() {
        assert_eq!(RecordFormat::from_tag("F"), Some(RecordFormat::F));
        assert_eq!(RecordFormat::from_tag("vb"), Some(RecordFormat::Vb));
        assert_eq!(RecordFormat::from_tag("FB"), None);
        assert!(RecordFormat::F.is_supported());
        assert!(!RecordFormat::Vb.is_supported());
    }
}
