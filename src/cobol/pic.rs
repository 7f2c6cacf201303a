//! COBOL PIC clause analysis.
//!
//! Translates a picture/usage phrase (`PIC S9(7)V99 COMP-3`) into the
//! physical storage description of the field: representation family, byte
//! width, digit count, scale, and signedness.
//!
//! Accepted grammar:
//!
//! ```text
//! pic_phrase := ["PIC" | "PICTURE"] picture [usage]
//! picture    := ["S"] base_run ["V" frac_run]
//! base_run   := ("X"+ | "A"+ | "9"+) ["(" INT ")"]
//! frac_run   := "9"+ ["(" INT ")"]
//! usage      := "COMP" | "COMP-1" | "COMP-2" | "COMP-3" | "COMP-4"
//!             | "COMP-5" | "DISPLAY"
//! ```
//!
//! A parenthesized count extends the symbol it follows, so `X(4)` is four
//! bytes and `99(3)` is four digits. A bare `COMP-1`/`COMP-2` phrase with
//! no picture is also accepted (floats carry no digit picture).

use thiserror::Error;

use crate::cobol::codepage::CodePage;
use crate::types::PhysicalType;

/// Result of analyzing one picture/usage phrase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PicClause {
    /// Physical storage shape, width included.
    pub physical: PhysicalType,
    /// Total declared digits (integer + fraction); 0 for text and floats.
    pub digits: u32,
    /// Digits after the implied decimal point.
    pub scale: u32,
    /// Whether the picture carried a leading `S`.
    pub signed: bool,
}

/// Picture phrase the analyzer could not accept.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("cannot parse picture clause {phrase:?} at position {position}")]
pub struct PicError {
    /// The offending phrase, normalized.
    pub phrase: String,
    /// Byte position of the first unacceptable character.
    pub position: usize,
}

/// COBOL USAGE variants this crate understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Usage {
    /// Zoned decimal / character data (the default).
    #[default]
    Display,
    /// Binary integer (COMP, COMP-4, COMP-5 all share one representation).
    Binary,
    /// Single-precision float (COMP-1).
    Float4,
    /// Double-precision float (COMP-2).
    Float8,
    /// Packed decimal (COMP-3).
    Packed,
}

impl Usage {
    /// Recognize a usage token, e.g. `"COMP-3"` or `"DISPLAY"`.
    pub fn from_token(token: &str) -> Option<Usage> {
        match token {
            "COMP" | "COMP-4" | "COMP-5" | "BINARY" => Some(Usage::Binary),
            "COMP-1" => Some(Usage::Float4),
            "COMP-2" => Some(Usage::Float8),
            "COMP-3" | "PACKED-DECIMAL" => Some(Usage::Packed),
            "DISPLAY" => Some(Usage::Display),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BaseSymbol {
    Alphanumeric, // X or A
    Numeric,      // 9
}

/// Analyze a picture/usage phrase.
///
/// The phrase is upper-cased and whitespace-normalized before scanning.
/// `codec` selects the code page attached to text pictures.
///
/// # Examples
///
/// ```
/// use mfd::cobol::codepage::CodePage;
/// use mfd::cobol::pic::analyze;
/// use mfd::types::PhysicalType;
///
/// let clause = analyze("PIC S9(7)V99 COMP-3", CodePage::Cp037).unwrap();
/// assert_eq!(
///     clause.physical,
///     PhysicalType::PackedDecimal { digits: 9, scale: 2, signed: true }
/// );
/// assert_eq!(clause.physical.byte_width(), 5);
/// ```
pub fn analyze(phrase: &str, codec: CodePage) -> Result<PicClause, PicError> {
    let normalized = normalize(phrase);
    let bytes = normalized.as_bytes();
    let mut pos = 0;

    skip_keyword(bytes, &mut pos, b"PICTURE");
    skip_keyword(bytes, &mut pos, b"PIC");
    skip_spaces(bytes, &mut pos);

    // Floats may appear with no picture at all.
    if let Some(usage) = trailing_usage(&normalized[pos..]) {
        if matches!(usage, Usage::Float4 | Usage::Float8) {
            let physical = if usage == Usage::Float4 {
                PhysicalType::Float4
            } else {
                PhysicalType::Float8
            };
            return Ok(PicClause { physical, digits: 0, scale: 0, signed: true });
        }
    }

    let signed = if pos < bytes.len() && bytes[pos] == b'S' {
        pos += 1;
        true
    } else {
        false
    };

    let (symbol, int_count) = parse_run(&normalized, bytes, &mut pos)?;
    if signed && symbol == BaseSymbol::Alphanumeric {
        return Err(err(&normalized, pos));
    }

    let frac_count = if pos < bytes.len() && bytes[pos] == b'V' {
        pos += 1;
        if symbol == BaseSymbol::Alphanumeric {
            return Err(err(&normalized, pos));
        }
        let (frac_symbol, count) = parse_run(&normalized, bytes, &mut pos)?;
        if frac_symbol != BaseSymbol::Numeric {
            return Err(err(&normalized, pos));
        }
        count
    } else {
        0
    };

    skip_spaces(bytes, &mut pos);
    let rest = normalized[pos..].trim_end_matches('.').trim();
    let usage = if rest.is_empty() {
        Usage::Display
    } else {
        match Usage::from_token(rest) {
            Some(u) => u,
            None => return Err(err(&normalized, pos)),
        }
    };

    let digits = int_count + frac_count;
    let physical = match (symbol, usage) {
        (_, Usage::Float4) => PhysicalType::Float4,
        (_, Usage::Float8) => PhysicalType::Float8,
        (BaseSymbol::Alphanumeric, _) => PhysicalType::Text { length: int_count as usize, codec },
        (BaseSymbol::Numeric, Usage::Display) => {
            PhysicalType::ZonedDecimal { digits, scale: frac_count, signed }
        }
        (BaseSymbol::Numeric, Usage::Packed) => {
            PhysicalType::PackedDecimal { digits, scale: frac_count, signed }
        }
        (BaseSymbol::Numeric, Usage::Binary) => {
            PhysicalType::Binary { bytes: binary_width(digits), signed }
        }
    };

    let scale = match physical {
        PhysicalType::Text { .. } | PhysicalType::Float4 | PhysicalType::Float8 => 0,
        _ => frac_count,
    };
    let digits = match physical {
        PhysicalType::Text { .. } | PhysicalType::Float4 | PhysicalType::Float8 => 0,
        _ => digits,
    };

    Ok(PicClause { physical, digits, scale, signed })
}

/// Analyze with text fallback: an unparseable phrase degrades to a text
/// field sized by the best-effort symbol count of the raw picture.
pub fn analyze_lenient(phrase: &str, codec: CodePage) -> PicClause {
    match analyze(phrase, codec) {
        Ok(clause) => clause,
        Err(_) => {
            let length = raw_storage_estimate(phrase).max(1);
            PicClause {
                physical: PhysicalType::Text { length, codec },
                digits: 0,
                scale: 0,
                signed: false,
            }
        }
    }
}

/// Binary storage width from the declared digit count: 1–4 digits fit two
/// bytes, 5–9 four, anything wider eight.
pub fn binary_width(digits: u32) -> u8 {
    match digits {
        0..=4 => 2,
        5..=9 => 4,
        _ => 8,
    }
}

fn normalize(phrase: &str) -> String {
    phrase.trim().to_ascii_uppercase().split_whitespace().collect::<Vec<_>>().join(" ")
}

fn err(phrase: &str, position: usize) -> PicError {
    PicError { phrase: phrase.to_string(), position }
}

fn skip_spaces(bytes: &[u8], pos: &mut usize) {
    while *pos < bytes.len() && bytes[*pos] == b' ' {
        *pos += 1;
    }
}

/// Consume `keyword` followed by a space, if present at the cursor.
fn skip_keyword(bytes: &[u8], pos: &mut usize, keyword: &[u8]) {
    let end = *pos + keyword.len();
    if end < bytes.len() && &bytes[*pos..end] == keyword && bytes[end] == b' ' {
        *pos = end + 1;
    }
}

/// A symbol run: one or more of the same picture symbol, optionally followed
/// by `(n)` which extends the final symbol to `n` occurrences.
fn parse_run(phrase: &str, bytes: &[u8], pos: &mut usize) -> Result<(BaseSymbol, u32), PicError> {
    let symbol = match bytes.get(*pos) {
        Some(b'X') | Some(b'A') => BaseSymbol::Alphanumeric,
        Some(b'9') => BaseSymbol::Numeric,
        _ => return Err(err(phrase, *pos)),
    };
    let run_char = bytes[*pos];
    let mut count: u32 = 0;
    while bytes.get(*pos) == Some(&run_char) {
        count += 1;
        *pos += 1;
    }
    if bytes.get(*pos) == Some(&b'(') {
        *pos += 1;
        let start = *pos;
        while bytes.get(*pos).is_some_and(u8::is_ascii_digit) {
            *pos += 1;
        }
        if *pos == start || bytes.get(*pos) != Some(&b')') {
            return Err(err(phrase, *pos));
        }
        let repeat: u32 = phrase[start..*pos].parse().map_err(|_| err(phrase, start))?;
        if repeat == 0 {
            return Err(err(phrase, start));
        }
        *pos += 1;
        count = count - 1 + repeat;
    }
    Ok((symbol, count))
}

/// Whole-phrase usage token (used for the no-picture float form).
fn trailing_usage(rest: &str) -> Option<Usage> {
    Usage::from_token(rest.trim().trim_end_matches('.'))
}

/// Count picture symbols in an arbitrary string, expanding `(n)` groups.
fn raw_storage_estimate(phrase: &str) -> usize {
    let upper = phrase.to_ascii_uppercase();
    let bytes = upper.as_bytes();
    let mut total = 0usize;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'X' | b'A' | b'9' => {
                total += 1;
                if bytes.get(i + 1) == Some(&b'(') {
                    let close = upper[i + 2..].find(')').map(|o| i + 2 + o);
                    if let Some(close) = close {
                        if let Ok(n) = upper[i + 2..close].trim().parse::<usize>() {
                            total += n.saturating_sub(1);
                        }
                        i = close;
                    }
                }
            }
            _ => {}
        }
        i += 1;
    }
    total
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::LogicalType;

    fn pic(phrase: &str) -> PicClause {
        analyze(phrase, CodePage::Cp037).unwrap()
    }

    #[test]
    fn test_text_pictures() {
        assert_eq!(
            pic("PIC X(25)").physical,
            PhysicalType::Text { length: 25, codec: CodePage::Cp037 }
        );
        assert_eq!(
            pic("PIC XXX").physical,
            PhysicalType::Text { length: 3, codec: CodePage::Cp037 }
        );
        assert_eq!(
            pic("PIC A(8)").physical,
            PhysicalType::Text { length: 8, codec: CodePage::Cp037 }
        );
        // A count extends the symbol it follows.
        assert_eq!(
            pic("PIC XX(3)").physical,
            PhysicalType::Text { length: 4, codec: CodePage::Cp037 }
        );
    }

    #[test]
    fn test_zoned_pictures() {
        assert_eq!(
            pic("PIC 9(5)").physical,
            PhysicalType::ZonedDecimal { digits: 5, scale: 0, signed: false }
        );
        assert_eq!(
            pic("PIC S9(3)").physical,
            PhysicalType::ZonedDecimal { digits: 3, scale: 0, signed: true }
        );
        assert_eq!(
            pic("PIC 9(7)V99").physical,
            PhysicalType::ZonedDecimal { digits: 9, scale: 2, signed: false }
        );
        assert_eq!(
            pic("PIC S999V9(3)").physical,
            PhysicalType::ZonedDecimal { digits: 6, scale: 3, signed: true }
        );
        assert_eq!(pic("PICTURE 9(4)").physical.byte_width(), 4);
    }

    #[test]
    fn test_packed_pictures() {
        // Spec scenario S1.
        let clause = pic("PIC S9(7)V99 COMP-3");
        assert_eq!(
            clause.physical,
            PhysicalType::PackedDecimal { digits: 9, scale: 2, signed: true }
        );
        assert_eq!(clause.physical.byte_width(), 5);
        assert_eq!(
            clause.physical.logical_type(),
            LogicalType::Decimal { precision: 9, scale: 2 }
        );
    }

    #[test]
    fn test_binary_pictures() {
        assert_eq!(
            pic("PIC S9(4) COMP").physical,
            PhysicalType::Binary { bytes: 2, signed: true }
        );
        assert_eq!(
            pic("PIC 9(9) COMP-4").physical,
            PhysicalType::Binary { bytes: 4, signed: false }
        );
        assert_eq!(
            pic("PIC S9(18) COMP-5").physical,
            PhysicalType::Binary { bytes: 8, signed: true }
        );
        // Boundary tiers: 1-4 -> 2 bytes, 5-9 -> 4, 10-18 -> 8.
        assert_eq!(binary_width(1), 2);
        assert_eq!(binary_width(4), 2);
        assert_eq!(binary_width(5), 4);
        assert_eq!(binary_width(9), 4);
        assert_eq!(binary_width(10), 8);
        assert_eq!(binary_width(18), 8);
    }

    #[test]
    fn test_float_usages() {
        assert_eq!(pic("COMP-1").physical, PhysicalType::Float4);
        assert_eq!(pic("COMP-2").physical, PhysicalType::Float8);
        assert_eq!(pic("PIC S9(9) COMP-2").physical, PhysicalType::Float8);
    }

    #[test]
    fn test_display_usage_explicit() {
        assert_eq!(
            pic("PIC S9(5)V99 DISPLAY").physical,
            PhysicalType::ZonedDecimal { digits: 7, scale: 2, signed: true }
        );
    }

    #[test]
    fn test_syntax_errors() {
        assert!(analyze("PIC", CodePage::Cp037).is_err());
        assert!(analyze("PIC Q(5)", CodePage::Cp037).is_err());
        assert!(analyze("PIC 9(0)", CodePage::Cp037).is_err());
        assert!(analyze("PIC 9(5", CodePage::Cp037).is_err());
        assert!(analyze("PIC SX(5)", CodePage::Cp037).is_err());
        assert!(analyze("PIC X(5)V99", CodePage::Cp037).is_err());
        assert!(analyze("PIC 9(5) COMP-9", CodePage::Cp037).is_err());
        let e = analyze("PIC 9(5) GARBAGE", CodePage::Cp037).unwrap_err();
        assert!(e.position > 0);
    }

    #[test]
    fn test_lenient_fallback() {
        let clause = analyze_lenient("PIC Z(5)9", CodePage::Cp037);
        // Best effort: counts the one recognizable symbol.
        assert_eq!(
            clause.physical,
            PhysicalType::Text { length: 1, codec: CodePage::Cp037 }
        );
        let clause = analyze_lenient("PIC 9(3)V99 COMP-3", CodePage::Cp037);
        assert_eq!(
            clause.physical,
            PhysicalType::PackedDecimal { digits: 5, scale: 2, signed: false }
        );
    }

    #[test]
    fn test_trailing_period_tolerated() {
        assert_eq!(
            pic("PIC 9(3) COMP-3.").physical,
            PhysicalType::PackedDecimal { digits: 3, scale: 0, signed: false }
        );
    }
}
