//! CCSID resolution and EBCDIC text decoding.
//!
//! Mainframe character data names its encoding by CCSID (Coded Character
//! Set Identifier). This module maps the recognized CCSIDs to named code
//! pages and decodes raw bytes into Rust strings.
//!
//! Recognized CCSIDs:
//!
//! | CCSID | Page | Notes |
//! |-------|------|-------|
//! | 37 | cp037 | US/Canada EBCDIC (default) |
//! | 273 | cp273 | German/Austrian EBCDIC |
//! | 284 | cp284 | Spanish EBCDIC |
//! | 285 | cp285 | UK EBCDIC |
//! | 297 | cp297 | French EBCDIC |
//! | 500 | cp500 | International EBCDIC |
//! | 930 / 935 / 937 | cp930/cp935/cp937 | DBCS mixed (recognized, not byte-decodable) |
//! | 1047 | cp1047 | Open Systems EBCDIC |
//! | 1140 | cp1140 | cp037 with Euro |
//! | 1200 | utf-16 | UTF-16 big-endian |
//! | 1208 | utf-8 | UTF-8 |
//!
//! Single-byte pages decode through 256-entry tables: a full cp037 base
//! table plus per-page overrides, generated against the glibc iconv tables.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::util::hex::format_bytes;

/// Substitution byte used when encoding a char the page cannot represent
/// (the cp037 question mark).
pub const SUBSTITUTE_BYTE: u8 = 0x6F;

/// EBCDIC space, trimmed from text fields when trimming is requested.
pub const EBCDIC_SPACE: u8 = 0x40;

/// A named code page selected by CCSID or alias.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CodePage {
    #[default]
    Cp037,
    Cp273,
    Cp284,
    Cp285,
    Cp297,
    Cp500,
    Cp930,
    Cp935,
    Cp937,
    Cp1047,
    Cp1140,
    /// CCSID 1200, UTF-16 big-endian.
    Utf16,
    /// CCSID 1208, UTF-8.
    Utf8,
}

/// Text decode/encode failure for a code page.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodePageError {
    /// The page is recognized but has no byte-level codec here (DBCS pages).
    #[error("code page {0} is not byte-decodable")]
    Unsupported(&'static str),

    /// The byte sequence is not valid in the page's encoding.
    #[error("invalid {codec} sequence: {}", format_bytes(bytes))]
    Malformed { codec: &'static str, bytes: Vec<u8> },
}

impl CodePage {
    /// Resolve a CCSID to a code page. Unknown CCSIDs yield `None`.
    pub fn from_ccsid(ccsid: u32) -> Option<CodePage> {
        match ccsid {
            37 => Some(CodePage::Cp037),
            273 => Some(CodePage::Cp273),
            284 => Some(CodePage::Cp284),
            285 => Some(CodePage::Cp285),
            297 => Some(CodePage::Cp297),
            500 => Some(CodePage::Cp500),
            930 => Some(CodePage::Cp930),
            935 => Some(CodePage::Cp935),
            937 => Some(CodePage::Cp937),
            1047 => Some(CodePage::Cp1047),
            1140 => Some(CodePage::Cp1140),
            1200 => Some(CodePage::Utf16),
            1208 => Some(CodePage::Utf8),
            _ => None,
        }
    }

    /// Resolve a CCSID, falling back to cp037 for unrecognized values.
    ///
    /// The second element is `true` when the fallback was taken; the caller
    /// surfaces that as a warning.
    pub fn from_ccsid_lossy(ccsid: u32) -> (CodePage, bool) {
        match CodePage::from_ccsid(ccsid) {
            Some(page) => (page, false),
            None => (CodePage::Cp037, true),
        }
    }

    /// Resolve a codec alias such as `"cp037"`, `"IBM-1047"`, or `"utf-8"`.
    pub fn from_name(name: &str) -> Option<CodePage> {
        let lower = name.trim().to_ascii_lowercase();
        let stripped = lower
            .strip_prefix("cp")
            .or_else(|| lower.strip_prefix("ibm-"))
            .or_else(|| lower.strip_prefix("ibm"))
            .unwrap_or(&lower);
        match stripped {
            "37" | "037" => Some(CodePage::Cp037),
            "273" => Some(CodePage::Cp273),
            "284" => Some(CodePage::Cp284),
            "285" => Some(CodePage::Cp285),
            "297" => Some(CodePage::Cp297),
            "500" => Some(CodePage::Cp500),
            "930" => Some(CodePage::Cp930),
            "935" => Some(CodePage::Cp935),
            "937" => Some(CodePage::Cp937),
            "1047" => Some(CodePage::Cp1047),
            "1140" => Some(CodePage::Cp1140),
            "1200" | "utf-16" | "utf16" => Some(CodePage::Utf16),
            "1208" | "utf-8" | "utf8" => Some(CodePage::Utf8),
            _ => None,
        }
    }

    /// Resolve either a numeric CCSID or a codec alias.
    ///
    /// # Examples
    ///
    /// ```
    /// use mfd::cobol::codepage::CodePage;
    ///
    /// assert_eq!(CodePage::resolve("1047"), Some(CodePage::Cp1047));
    /// assert_eq!(CodePage::resolve("cp500"), Some(CodePage::Cp500));
    /// assert_eq!(CodePage::resolve("bogus"), None);
    /// ```
    pub fn resolve(spec: &str) -> Option<CodePage> {
        if let Ok(ccsid) = spec.trim().parse::<u32>() {
            return CodePage::from_ccsid(ccsid);
        }
        CodePage::from_name(spec)
    }

    /// The CCSID this page answers to.
    pub fn ccsid(&self) -> u32 {
        match self {
            CodePage::Cp037 => 37,
            CodePage::Cp273 => 273,
            CodePage::Cp284 => 284,
            CodePage::Cp285 => 285,
            CodePage::Cp297 => 297,
            CodePage::Cp500 => 500,
            CodePage::Cp930 => 930,
            CodePage::Cp935 => 935,
            CodePage::Cp937 => 937,
            CodePage::Cp1047 => 1047,
            CodePage::Cp1140 => 1140,
            CodePage::Utf16 => 1200,
            CodePage::Utf8 => 1208,
        }
    }

    /// Codec name, e.g. `"cp037"`.
    pub fn name(&self) -> &'static str {
        match self {
            CodePage::Cp037 => "cp037",
            CodePage::Cp273 => "cp273",
            CodePage::Cp284 => "cp284",
            CodePage::Cp285 => "cp285",
            CodePage::Cp297 => "cp297",
            CodePage::Cp500 => "cp500",
            CodePage::Cp930 => "cp930",
            CodePage::Cp935 => "cp935",
            CodePage::Cp937 => "cp937",
            CodePage::Cp1047 => "cp1047",
            CodePage::Cp1140 => "cp1140",
            CodePage::Utf16 => "utf-16",
            CodePage::Utf8 => "utf-8",
        }
    }

    /// True for the single-byte EBCDIC pages with a 256-entry table.
    pub fn is_single_byte(&self) -> bool {
        self.table().is_some()
    }

    fn table(&self) -> Option<&'static [char; 256]> {
        match self {
            CodePage::Cp037 => Some(&CP037),
            CodePage::Cp273 => Some(&CP273),
            CodePage::Cp284 => Some(&CP284),
            CodePage::Cp285 => Some(&CP285),
            CodePage::Cp297 => Some(&CP297),
            CodePage::Cp500 => Some(&CP500),
            CodePage::Cp1047 => Some(&CP1047),
            CodePage::Cp1140 => Some(&CP1140),
            _ => None,
        }
    }

    /// Decode raw bytes into a string.
    ///
    /// Single-byte pages are total (every byte maps to a scalar); UTF-16BE
    /// and UTF-8 reject malformed sequences; DBCS pages return
    /// [`CodePageError::Unsupported`].
    ///
    /// # Examples
    ///
    /// ```
    /// use mfd::cobol::codepage::CodePage;
    ///
    /// // "Hello" in cp037
    /// let text = CodePage::Cp037.decode(&[0xC8, 0x85, 0x93, 0x93, 0x96]).unwrap();
    /// assert_eq!(text, "Hello");
    /// ```
    pub fn decode(&self, bytes: &[u8]) -> Result<String, CodePageError> {
        if let Some(table) = self.table() {
            return Ok(bytes.iter().map(|&b| table[b as usize]).collect());
        }
        match self {
            CodePage::Utf8 => std::str::from_utf8(bytes)
                .map(str::to_owned)
                .map_err(|_| CodePageError::Malformed { codec: "utf-8", bytes: bytes.to_vec() }),
            CodePage::Utf16 => {
                if bytes.len() % 2 != 0 {
                    return Err(CodePageError::Malformed {
                        codec: "utf-16",
                        bytes: bytes.to_vec(),
                    });
                }
                let units: Vec<u16> = bytes
                    .chunks_exact(2)
                    .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
                    .collect();
                String::from_utf16(&units).map_err(|_| CodePageError::Malformed {
                    codec: "utf-16",
                    bytes: bytes.to_vec(),
                })
            }
            page => Err(CodePageError::Unsupported(page.name())),
        }
    }

    /// Encode text into this page's bytes.
    ///
    /// Only single-byte pages encode; characters outside the page map to
    /// [`SUBSTITUTE_BYTE`]. The reverse lookup scans the 256-entry table,
    /// which is fine for the report-sized strings this is used on.
    pub fn encode(&self, text: &str) -> Result<Vec<u8>, CodePageError> {
        let table = self
            .table()
            .ok_or(CodePageError::Unsupported(self.name()))?;
        Ok(text
            .chars()
            .map(|c| {
                table
                    .iter()
                    .position(|&t| t == c)
                    .map(|i| i as u8)
                    .unwrap_or(SUBSTITUTE_BYTE)
            })
            .collect())
    }
}

impl fmt::Display for CodePage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Copy `base` and apply positional overrides; runs at compile time so the
/// variant tables stay `'static` constants.
const fn with_overrides(base: [char; 256], overrides: &[(u8, char)]) -> [char; 256] {
    let mut table = base;
    let mut i = 0;
    while i < overrides.len() {
        table[overrides[i].0 as usize] = overrides[i].1;
        i += 1;
    }
    table
}

/// cp037 (US/Canada EBCDIC), the base table all single-byte variants patch.
const CP037_BASE: [char; 256] = [
    '\u{0000}', '\u{0001}', '\u{0002}', '\u{0003}', '\u{009c}', '\u{0009}', '\u{0086}', '\u{007f}',
    '\u{0097}', '\u{008d}', '\u{008e}', '\u{000b}', '\u{000c}', '\u{000d}', '\u{000e}', '\u{000f}',
    '\u{0010}', '\u{0011}', '\u{0012}', '\u{0013}', '\u{009d}', '\u{0085}', '\u{0008}', '\u{0087}',
    '\u{0018}', '\u{0019}', '\u{0092}', '\u{008f}', '\u{001c}', '\u{001d}', '\u{001e}', '\u{001f}',
    '\u{0080}', '\u{0081}', '\u{0082}', '\u{0083}', '\u{0084}', '\u{000a}', '\u{0017}', '\u{001b}',
    '\u{0088}', '\u{0089}', '\u{008a}', '\u{008b}', '\u{008c}', '\u{0005}', '\u{0006}', '\u{0007}',
    '\u{0090}', '\u{0091}', '\u{0016}', '\u{0093}', '\u{0094}', '\u{0095}', '\u{0096}', '\u{0004}',
    '\u{0098}', '\u{0099}', '\u{009a}', '\u{009b}', '\u{0014}', '\u{0015}', '\u{009e}', '\u{001a}',
    ' ', '\u{00a0}', '\u{00e2}', '\u{00e4}', '\u{00e0}', '\u{00e1}', '\u{00e3}', '\u{00e5}',
    '\u{00e7}', '\u{00f1}', '\u{00a2}', '.', '<', '(', '+', '|',
    '&', '\u{00e9}', '\u{00ea}', '\u{00eb}', '\u{00e8}', '\u{00ed}', '\u{00ee}', '\u{00ef}',
    '\u{00ec}', '\u{00df}', '!', '$', '*', ')', ';', '\u{00ac}',
    '-', '/', '\u{00c2}', '\u{00c4}', '\u{00c0}', '\u{00c1}', '\u{00c3}', '\u{00c5}',
    '\u{00c7}', '\u{00d1}', '\u{00a6}', ',', '%', '_', '>', '?',
    '\u{00f8}', '\u{00c9}', '\u{00ca}', '\u{00cb}', '\u{00c8}', '\u{00cd}', '\u{00ce}', '\u{00cf}',
    '\u{00cc}', '`', ':', '#', '@', '\'', '=', '"',
    '\u{00d8}', 'a', 'b', 'c', 'd', 'e', 'f', 'g',
    'h', 'i', '\u{00ab}', '\u{00bb}', '\u{00f0}', '\u{00fd}', '\u{00fe}', '\u{00b1}',
    '\u{00b0}', 'j', 'k', 'l', 'm', 'n', 'o', 'p',
    'q', 'r', '\u{00aa}', '\u{00ba}', '\u{00e6}', '\u{00b8}', '\u{00c6}', '\u{00a4}',
    '\u{00b5}', '~', 's', 't', 'u', 'v', 'w', 'x',
    'y', 'z', '\u{00a1}', '\u{00bf}', '\u{00d0}', '\u{00dd}', '\u{00de}', '\u{00ae}',
    '^', '\u{00a3}', '\u{00a5}', '\u{00b7}', '\u{00a9}', '\u{00a7}', '\u{00b6}', '\u{00bc}',
    '\u{00bd}', '\u{00be}', '[', ']', '\u{00af}', '\u{00a8}', '\u{00b4}', '\u{00d7}',
    '{', 'A', 'B', 'C', 'D', 'E', 'F', 'G',
    'H', 'I', '\u{00ad}', '\u{00f4}', '\u{00f6}', '\u{00f2}', '\u{00f3}', '\u{00f5}',
    '}', 'J', 'K', 'L', 'M', 'N', 'O', 'P',
    'Q', 'R', '\u{00b9}', '\u{00fb}', '\u{00fc}', '\u{00f9}', '\u{00fa}', '\u{00ff}',
    '\\', '\u{00f7}', 'S', 'T', 'U', 'V', 'W', 'X',
    'Y', 'Z', '\u{00b2}', '\u{00d4}', '\u{00d6}', '\u{00d2}', '\u{00d3}', '\u{00d5}',
    '0', '1', '2', '3', '4', '5', '6', '7',
    '8', '9', '\u{00b3}', '\u{00db}', '\u{00dc}', '\u{00d9}', '\u{00da}', '\u{009f}',
];

static CP037: [char; 256] = CP037_BASE;

static CP273: [char; 256] = with_overrides(
    CP037_BASE,
    &[
        (0x43, '{'),
        (0x4A, '\u{00c4}'),
        (0x4F, '!'),
        (0x59, '~'),
        (0x5A, '\u{00dc}'),
        (0x5F, '^'),
        (0x63, '['),
        (0x6A, '\u{00f6}'),
        (0x7C, '\u{00a7}'),
        (0xA1, '\u{00df}'),
        (0xB0, '\u{00a2}'),
        (0xB5, '@'),
        (0xBA, '\u{00ac}'),
        (0xBB, '|'),
        (0xC0, '\u{00e4}'),
        (0xCC, '\u{00a6}'),
        (0xD0, '\u{00fc}'),
        (0xDC, '}'),
        (0xE0, '\u{00d6}'),
        (0xEC, '\\'),
        (0xFC, ']'),
    ],
);

static CP284: [char; 256] = with_overrides(
    CP037_BASE,
    &[
        (0x49, '\u{00a6}'),
        (0x4A, '['),
        (0x5A, ']'),
        (0x69, '#'),
        (0x6A, '\u{00f1}'),
        (0x7B, '\u{00d1}'),
        (0xA1, '\u{00a8}'),
        (0xB0, '\u{00a2}'),
        (0xBA, '^'),
        (0xBB, '!'),
        (0xBD, '~'),
    ],
);

static CP285: [char; 256] = with_overrides(
    CP037_BASE,
    &[
        (0x4A, '$'),
        (0x5B, '\u{00a3}'),
        (0xA1, '\u{203e}'),
        (0xB0, '\u{00a2}'),
        (0xB1, '['),
        (0xBA, '^'),
        (0xBC, '~'),
    ],
);

static CP297: [char; 256] = with_overrides(
    CP037_BASE,
    &[
        (0x44, '@'),
        (0x48, '\\'),
        (0x4A, '\u{00b0}'),
        (0x4F, '!'),
        (0x51, '{'),
        (0x54, '}'),
        (0x5A, '\u{00a7}'),
        (0x5F, '^'),
        (0x6A, '\u{00f9}'),
        (0x79, '\u{00b5}'),
        (0x7B, '\u{00a3}'),
        (0x7C, '\u{00e0}'),
        (0x90, '['),
        (0xA0, '`'),
        (0xA1, '\u{00a8}'),
        (0xB0, '\u{00a2}'),
        (0xB1, '#'),
        (0xB5, ']'),
        (0xBA, '\u{00ac}'),
        (0xBB, '|'),
        (0xBD, '~'),
        (0xC0, '\u{00e9}'),
        (0xD0, '\u{00e8}'),
        (0xDD, '\u{00a6}'),
        (0xE0, '\u{00e7}'),
    ],
);

static CP500: [char; 256] = with_overrides(
    CP037_BASE,
    &[
        (0x4A, '['),
        (0x4F, '!'),
        (0x5A, ']'),
        (0x5F, '^'),
        (0xB0, '\u{00a2}'),
        (0xBA, '\u{00ac}'),
        (0xBB, '|'),
    ],
);

static CP1047: [char; 256] = with_overrides(
    CP037_BASE,
    &[
        (0x5F, '^'),
        (0xAD, '['),
        (0xB0, '\u{00ac}'),
        (0xBA, '\u{00dd}'),
        (0xBB, '\u{00a8}'),
        (0xBD, ']'),
    ],
);

static CP1140: [char; 256] = with_overrides(CP037_BASE, &[(0x9F, '\u{20ac}')]);
