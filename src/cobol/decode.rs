//! Physical record decoding.
//!
//! Converts the raw bytes of one fixed-length record into logical values
//! using a [`Layout`]. Handles the representations that actually differ
//! from modern formats:
//!
//! | Physical | Encoding | Decoder |
//! |----------|----------|---------|
//! | ZonedDecimal | one digit per byte, sign in last zone nibble | [`decode_zoned`] |
//! | PackedDecimal | two BCD digits per byte, sign in last low nibble | [`decode_packed`] |
//! | Binary | big-endian, two's complement when signed | [`decode_binary`] |
//! | Float4 / Float8 | IEEE 754 big-endian | [`decode_float4`] / [`decode_float8`] |
//! | Text | code-page decode, trailing-space trim | [`decode_text`] |
//!
//! Decoding is pure: the same layout and bytes always produce the same
//! record, and calls are independent, so records can be decoded in
//! parallel by the caller.

use byteorder::{BigEndian, ByteOrder};
use thiserror::Error;

use crate::cobol::codepage::{CodePage, CodePageError, EBCDIC_SPACE};
use crate::cobol::copybook::{Field, Layout};
use crate::types::{DecimalValue, LogicalValue, PhysicalType, RecordFormat};

/// Per-field decode failure kind.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeErrorKind {
    /// A zoned byte carries a non-digit low nibble or an invalid zone.
    #[error("invalid zoned byte 0x{byte:02x} at digit {index}")]
    ZonedInvalidDigit { byte: u8, index: usize },

    /// A packed nibble is not a BCD digit.
    #[error("invalid packed digit nibble 0x{nibble:x} at position {index}")]
    PackedInvalidDigit { nibble: u8, index: usize },

    /// The packed sign nibble is not in {A, B, C, D, E, F}.
    #[error("invalid packed sign nibble 0x{nibble:x}")]
    PackedInvalidSign { nibble: u8 },

    /// Character data did not decode in the field's code page.
    #[error("code page failure: {0}")]
    Codepage(#[from] CodePageError),
}

/// A decode failure bound to the field and record offset it occurred at.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("field {field_name} at offset {}: {kind}", crate::util::hex::format_offset(*offset))]
pub struct FieldDecodeError {
    pub field_name: String,
    pub offset: usize,
    pub kind: DecodeErrorKind,
}

/// Record-level decode failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// The dataset's record-format tag names a format this decoder does
    /// not handle (only fixed-length `F` records are decodable).
    #[error("record format {format} is not decodable; only F (fixed) is supported")]
    UnsupportedRecordFormat { format: RecordFormat },

    /// The buffer does not match the layout's record length.
    #[error("short record: expected {expected} bytes, got {actual}")]
    ShortRecord { expected: usize, actual: usize },

    /// A field failed to decode in strict mode.
    #[error(transparent)]
    Field(#[from] FieldDecodeError),
}

/// Error-surfacing mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DecodeMode {
    /// Abort the record on the first field failure.
    #[default]
    Strict,
    /// Substitute Null for failing fields and report them as warnings.
    Lenient,
}

/// Decoder knobs.
#[derive(Debug, Clone, Copy)]
pub struct DecodeOptions {
    pub mode: DecodeMode,
    /// Trim trailing EBCDIC spaces from text fields (default on).
    pub trim_text: bool,
    /// Emit FILLER fields (default off).
    pub include_fillers: bool,
    /// Re-group values under their group items instead of a flat list.
    pub nested: bool,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        DecodeOptions {
            mode: DecodeMode::Strict,
            trim_text: true,
            include_fillers: false,
            nested: false,
        }
    }
}

/// One decoded record: field name / value pairs in layout order, plus the
/// failures tolerated in lenient mode.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedRecord {
    pub values: Vec<(String, LogicalValue)>,
    pub warnings: Vec<FieldDecodeError>,
}

impl DecodedRecord {
    /// Value of the first field with the given name.
    pub fn get(&self, name: &str) -> Option<&LogicalValue> {
        self.values.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }
}

/// Decode one record.
///
/// The buffer must be exactly `layout.record_length` bytes. Group items are
/// emitted only when [`DecodeOptions::nested`] is set; OCCURS fields come
/// out as arrays.
///
/// # Examples
///
/// ```
/// use mfd::cobol::copybook::parse_copybook;
/// use mfd::cobol::decode::{decode_record, DecodeOptions};
/// use mfd::types::LogicalValue;
///
/// let layout = parse_copybook(
///     "       01 REC.\n          05 ID   PIC 9(3).\n          05 NM   PIC X(3).\n",
/// )
/// .unwrap();
/// // "042" zoned + "ABC" in cp037
/// let record = decode_record(&layout, &[0xF0, 0xF4, 0xF2, 0xC1, 0xC2, 0xC3],
///     &DecodeOptions::default()).unwrap();
/// assert_eq!(record.get("ID"), Some(&LogicalValue::Int(42)));
/// assert_eq!(record.get("NM"), Some(&LogicalValue::Str("ABC".into())));
/// ```
pub fn decode_record(
    layout: &Layout,
    data: &[u8],
    options: &DecodeOptions,
) -> Result<DecodedRecord, DecodeError> {
    if data.len() != layout.record_length {
        return Err(DecodeError::ShortRecord {
            expected: layout.record_length,
            actual: data.len(),
        });
    }

    let mut record = DecodedRecord { values: Vec::new(), warnings: Vec::new() };
    if options.nested {
        for (index, field) in layout.fields.iter().enumerate() {
            if field.parent.is_none() {
                if let Some(value) = decode_tree(layout, index, data, options, &mut record)? {
                    record.values.push((layout.fields[index].name.clone(), value));
                }
            }
        }
    } else {
        for (_, field) in layout.elementary() {
            if field.filler && !options.include_fillers {
                continue;
            }
            if let Some(value) = decode_with_mode(field, data, options, &mut record)? {
                record.values.push((field.name.clone(), value));
            }
        }
    }
    Ok(record)
}

/// Decode one record of a dataset carrying a registry record-format tag.
///
/// Variable-length formats (`V`, `VB`) are rejected up front with
/// [`DecodeError::UnsupportedRecordFormat`] before any bytes are touched;
/// `F` delegates to [`decode_record`].
///
/// # Examples
///
/// ```
/// use mfd::cobol::copybook::parse_copybook;
/// use mfd::cobol::decode::{decode_record_with_format, DecodeError, DecodeOptions};
/// use mfd::types::RecordFormat;
///
/// let layout = parse_copybook("       01 REC.\n          05 A PIC X(2).\n").unwrap();
/// let err = decode_record_with_format(
///     &layout, &[0xC1, 0xC2], RecordFormat::Vb, &DecodeOptions::default(),
/// )
/// .unwrap_err();
/// assert!(matches!(err, DecodeError::UnsupportedRecordFormat { format: RecordFormat::Vb }));
/// ```
pub fn decode_record_with_format(
    layout: &Layout,
    data: &[u8],
    format: RecordFormat,
    options: &DecodeOptions,
) -> Result<DecodedRecord, DecodeError> {
    if !format.is_supported() {
        return Err(DecodeError::UnsupportedRecordFormat { format });
    }
    decode_record(layout, data, options)
}

/// Decode one field subtree for nested output.
fn decode_tree(
    layout: &Layout,
    index: usize,
    data: &[u8],
    options: &DecodeOptions,
    record: &mut DecodedRecord,
) -> Result<Option<LogicalValue>, DecodeError> {
    let field = &layout.fields[index];
    if field.is_elementary() {
        if field.filler && !options.include_fillers {
            return Ok(None);
        }
        return decode_with_mode(field, data, options, record);
    }
    let mut members = Vec::new();
    for &child in &field.children {
        if let Some(value) = decode_tree(layout, child, data, options, record)? {
            members.push((layout.fields[child].name.clone(), value));
        }
    }
    Ok(Some(LogicalValue::Group(members)))
}

/// Decode one elementary field, applying the strict/lenient policy.
fn decode_with_mode(
    field: &Field,
    data: &[u8],
    options: &DecodeOptions,
    record: &mut DecodedRecord,
) -> Result<Option<LogicalValue>, DecodeError> {
    match decode_elementary(field, data, options) {
        Ok(value) => Ok(Some(value)),
        Err(error) => match options.mode {
            DecodeMode::Strict => Err(error.into()),
            DecodeMode::Lenient => {
                record.warnings.push(error);
                Ok(Some(LogicalValue::Null))
            }
        },
    }
}

/// Decode all occurrences of one elementary field.
fn decode_elementary(
    field: &Field,
    data: &[u8],
    options: &DecodeOptions,
) -> Result<LogicalValue, FieldDecodeError> {
    let Some(physical) = field.physical else {
        // Groups consume no bytes themselves.
        return Ok(LogicalValue::Group(Vec::new()));
    };
    let width = physical.byte_width();

    let decode_at = |offset: usize| -> Result<LogicalValue, FieldDecodeError> {
        let bytes = &data[offset..offset + width];
        decode_value(&physical, bytes, options.trim_text).map_err(|kind| FieldDecodeError {
            field_name: field.name.clone(),
            offset,
            kind,
        })
    };

    if field.occurs == 1 {
        decode_at(field.offset)
    } else {
        let mut elements = Vec::with_capacity(field.occurs);
        for occurrence in 0..field.occurs {
            elements.push(decode_at(field.offset + occurrence * width)?);
        }
        Ok(LogicalValue::Array(elements))
    }
}

/// Decode one value of the given physical type from exactly-sized bytes.
pub fn decode_value(
    physical: &PhysicalType,
    bytes: &[u8],
    trim_text: bool,
) -> Result<LogicalValue, DecodeErrorKind> {
    debug_assert_eq!(bytes.len(), physical.byte_width());
    match *physical {
        PhysicalType::Text { codec, .. } => decode_text(bytes, codec, trim_text)
            .map(LogicalValue::Str)
            .map_err(Into::into),
        PhysicalType::ZonedDecimal { digits, scale, .. } => decode_zoned(bytes, digits, scale),
        PhysicalType::PackedDecimal { digits, scale, .. } => decode_packed(bytes, digits, scale),
        PhysicalType::Binary { signed, .. } => Ok(decode_binary(bytes, signed)),
        PhysicalType::Float4 => Ok(decode_float4(bytes)),
        PhysicalType::Float8 => Ok(decode_float8(bytes)),
    }
}

/// Decode a text field, trimming trailing pad characters when asked.
///
/// Single-byte EBCDIC pages trim the 0x40 space byte before decoding;
/// Unicode pages trim spaces after decoding.
pub fn decode_text(bytes: &[u8], codec: CodePage, trim: bool) -> Result<String, CodePageError> {
    if trim && codec.is_single_byte() {
        let mut end = bytes.len();
        while end > 0 && bytes[end - 1] == EBCDIC_SPACE {
            end -= 1;
        }
        codec.decode(&bytes[..end])
    } else {
        let text = codec.decode(bytes)?;
        Ok(if trim { text.trim_end_matches(' ').to_string() } else { text })
    }
}

/// Decode a zoned decimal (one digit per byte).
///
/// The low nibble of every byte must be a decimal digit. Zones of all bytes
/// but the last must be in {A, B, C, D, F}; the last byte's zone is the
/// sign, 0xD meaning negative and anything else non-negative.
///
/// # Examples
///
/// ```
/// use mfd::cobol::decode::decode_zoned;
/// use mfd::types::LogicalValue;
///
/// assert_eq!(decode_zoned(&[0xF1, 0xF2, 0xD3], 3, 0).unwrap(), LogicalValue::Int(-123));
/// assert_eq!(decode_zoned(&[0xF0, 0xF4, 0xF2], 3, 0).unwrap(), LogicalValue::Int(42));
/// ```
pub fn decode_zoned(bytes: &[u8], digits: u32, scale: u32) -> Result<LogicalValue, DecodeErrorKind> {
    let mut magnitude: i128 = 0;
    let mut negative = false;
    let last = bytes.len().saturating_sub(1);
    for (index, &byte) in bytes.iter().enumerate() {
        let zone = byte >> 4;
        let digit = byte & 0x0F;
        if digit > 9 {
            return Err(DecodeErrorKind::ZonedInvalidDigit { byte, index });
        }
        if index == last {
            negative = zone == 0x0D;
        } else if !matches!(zone, 0x0A | 0x0B | 0x0C | 0x0D | 0x0F) {
            return Err(DecodeErrorKind::ZonedInvalidDigit { byte, index });
        }
        magnitude = magnitude * 10 + digit as i128;
    }
    Ok(numeric_value(if negative { -magnitude } else { magnitude }, digits, scale))
}

/// Decode a packed (COMP-3) decimal.
///
/// The buffer carries `2 * width - 1` digit nibbles followed by the sign
/// nibble. When the digit nibbles exceed the declared digit count (even
/// declared counts), the leading nibble must be zero. Sign nibbles 0xB and
/// 0xD are negative, 0xA/0xC/0xE/0xF non-negative; anything else is
/// rejected.
///
/// # Examples
///
/// ```
/// use mfd::cobol::decode::decode_packed;
/// use mfd::types::{DecimalValue, LogicalValue};
///
/// assert_eq!(
///     decode_packed(&[0x12, 0x34, 0x5C], 5, 2).unwrap(),
///     LogicalValue::Decimal(DecimalValue::new(12345, 5, 2))
/// );
/// assert_eq!(
///     decode_packed(&[0x00, 0x12, 0x3D], 5, 2).unwrap(),
///     LogicalValue::Decimal(DecimalValue::new(-123, 5, 2))
/// );
/// ```
pub fn decode_packed(bytes: &[u8], digits: u32, scale: u32) -> Result<LogicalValue, DecodeErrorKind> {
    let nibble_count = bytes.len() * 2 - 1;
    let mut magnitude: i128 = 0;
    for index in 0..nibble_count {
        let byte = bytes[index / 2];
        let nibble = if index % 2 == 0 { byte >> 4 } else { byte & 0x0F };
        if nibble > 9 {
            return Err(DecodeErrorKind::PackedInvalidDigit { nibble, index });
        }
        if index == 0 && nibble_count > digits as usize && nibble != 0 {
            return Err(DecodeErrorKind::PackedInvalidDigit { nibble, index });
        }
        magnitude = magnitude * 10 + nibble as i128;
    }
    let sign = bytes[bytes.len() - 1] & 0x0F;
    let negative = match sign {
        0x0B | 0x0D => true,
        0x0A | 0x0C | 0x0E | 0x0F => false,
        _ => return Err(DecodeErrorKind::PackedInvalidSign { nibble: sign }),
    };
    Ok(numeric_value(if negative { -magnitude } else { magnitude }, digits, scale))
}

/// Decode a big-endian binary integer of 2, 4, or 8 bytes.
pub fn decode_binary(bytes: &[u8], signed: bool) -> LogicalValue {
    match (bytes.len(), signed) {
        (2, true) => LogicalValue::Int(BigEndian::read_i16(bytes) as i64),
        (4, true) => LogicalValue::Int(BigEndian::read_i32(bytes) as i64),
        (8, true) => LogicalValue::Int(BigEndian::read_i64(bytes)),
        (2, false) => LogicalValue::Int(BigEndian::read_u16(bytes) as i64),
        (4, false) => LogicalValue::Int(BigEndian::read_u32(bytes) as i64),
        (8, false) => {
            let value = BigEndian::read_u64(bytes);
            // An unsigned 8-byte quantity can exceed Int64; keep it exact.
            match i64::try_from(value) {
                Ok(v) => LogicalValue::Int(v),
                Err(_) => LogicalValue::Decimal(DecimalValue::new(value as i128, 20, 0)),
            }
        }
        // Widths other than 2/4/8 never come out of the PIC analyzer, but
        // PhysicalType fields are public; read them generically.
        (_, signed) => {
            let mut value: i64 = if signed && bytes.first().is_some_and(|b| b & 0x80 != 0) {
                -1
            } else {
                0
            };
            for &b in bytes {
                value = (value << 8) | b as i64;
            }
            LogicalValue::Int(value)
        }
    }
}

/// Decode a COMP-1 single-precision float (big-endian IEEE 754).
pub fn decode_float4(bytes: &[u8]) -> LogicalValue {
    LogicalValue::Float(f32::from_bits(BigEndian::read_u32(bytes)))
}

/// Decode a COMP-2 double-precision float (big-endian IEEE 754).
pub fn decode_float8(bytes: &[u8]) -> LogicalValue {
    LogicalValue::Double(f64::from_bits(BigEndian::read_u64(bytes)))
}

/// Shape a decoded magnitude into the tightest faithful logical value:
/// integers within Int64 when the declared type is integral and narrow
/// enough, exact decimals otherwise.
fn numeric_value(value: i128, digits: u32, scale: u32) -> LogicalValue {
    if scale == 0 && digits <= 18 {
        LogicalValue::Int(value as i64)
    } else {
        LogicalValue::Decimal(DecimalValue::new(value, digits, scale))
    }
}
