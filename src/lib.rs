//! Mainframe data artifact parsing toolkit.
//!
//! The `mainframe-utils` crate (library name `mfd`) parses the metadata
//! artifacts that describe mainframe datasets — COBOL copybooks, DB2 DDL,
//! and DCLGEN output — and decodes fixed-length EBCDIC record files into
//! logical values that analytics pipelines can consume without any
//! knowledge of mainframe encodings.
//!
//! # Quick example
//!
//! ```
//! use mfd::cobol::copybook::parse_copybook;
//! use mfd::cobol::decode::{decode_record, DecodeOptions};
//! use mfd::schema::logical_schema_of_layout;
//! use mfd::types::{DecimalValue, LogicalValue};
//!
//! let source = [
//!     "       01 CUSTOMER.",
//!     "          05 CUST-ID   PIC 9(4).",
//!     "          05 CUST-NAME PIC X(6).",
//!     "          05 BALANCE   PIC S9(5)V99 COMP-3.",
//! ]
//! .join("\n");
//! let layout = parse_copybook(&source).unwrap();
//! assert_eq!(layout.record_length, 14);
//!
//! // The logical schema downstream writers consume.
//! let schema = logical_schema_of_layout(&layout);
//! assert_eq!(schema.len(), 3);
//!
//! // One raw record: id 0042, name "ACME  ", balance -123.45
//! let mut data = vec![0xF0, 0xF0, 0xF4, 0xF2];
//! data.extend([0xC1, 0xC3, 0xD4, 0xC5, 0x40, 0x40]);
//! data.extend([0x00, 0x12, 0x34, 0x5D]);
//! let record = decode_record(&layout, &data, &DecodeOptions::default()).unwrap();
//! assert_eq!(record.get("CUST-ID"), Some(&LogicalValue::Int(42)));
//! assert_eq!(record.get("CUST-NAME"), Some(&LogicalValue::Str("ACME".into())));
//! assert_eq!(
//!     record.get("BALANCE"),
//!     Some(&LogicalValue::Decimal(DecimalValue::new(-12345, 7, 2)))
//! );
//! ```
//!
//! # Key entry points
//!
//! | Type / Function | Purpose |
//! |-----------------|---------|
//! | [`cobol::copybook::parse_copybook`] | Copybook text → [`cobol::copybook::Layout`] |
//! | [`cobol::decode::decode_record`] | Layout + raw bytes → logical record |
//! | [`cobol::decode::decode_record_with_format`] | Same, gated on the registry's F/V/VB tag |
//! | [`db2::ddl::parse_ddl`] | CREATE TABLE text → [`db2::ddl::TableDef`] |
//! | [`db2::dclgen::parse_dclgen`] | DCLGEN output → [`db2::dclgen::DclGenResult`] |
//! | [`schema::logical_schema_of_layout`] | Unified schema from a layout |
//! | [`schema::logical_schema_of_table`] | Unified schema from a table def |
//! | [`export::to_json_value`] | Logical value → JSON per the writer contract |
//!
//! # Module overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`cobol::codepage`] | CCSID resolution and EBCDIC decoding |
//! | [`cobol::pic`] | PIC clause analysis into physical types |
//! | [`cobol::copybook`] | Copybook parsing, offsets, REDEFINES, OCCURS |
//! | [`cobol::decode`] | Zoned/packed/binary/float/text record decoding |
//! | [`cobol::encode`] | Canonical numeric encoders (write-side mirror) |
//! | [`db2::ddl`] | CREATE TABLE parsing |
//! | [`db2::dclgen`] | DCLGEN parsing and column/host-variable pairing |
//! | [`db2::sqltype`] | SQL type → logical type mapping |
//! | [`schema`] | Logical schema unification over both source kinds |
//! | [`export`] | JSON-lines and delimited-text value mapping |
//!
//! # Design constraints
//!
//! The core is purely functional: parsers take strings and return immutable
//! layouts and table definitions, the decoder takes a layout plus a byte
//! slice and returns one record. Nothing here performs I/O, logs, or keeps
//! global state; warnings are values on results and every decode call is
//! independently parallelizable by the caller.

pub mod cobol;
pub mod db2;
pub mod export;
pub mod schema;
pub mod types;
pub mod util;

use thiserror::Error;

/// Coarse error wrapper over every parser and decoder failure in the crate.
///
/// The per-module error types carry the precise failure (position, field,
/// offset, byte); this wrapper exists for callers that funnel all source
/// kinds through one pipeline.
#[derive(Error, Debug)]
pub enum MfError {
    /// Copybook source or layout failure.
    #[error("copybook error: {0}")]
    Copybook(#[from] cobol::copybook::CopybookError),

    /// Standalone picture clause failure.
    #[error("picture error: {0}")]
    Pic(#[from] cobol::pic::PicError),

    /// Record decode failure.
    #[error("decode error: {0}")]
    Decode(#[from] cobol::decode::DecodeError),

    /// DDL parse failure.
    #[error("DDL error: {0}")]
    Ddl(#[from] db2::ddl::DdlError),

    /// DCLGEN parse failure.
    #[error("DCLGEN error: {0}")]
    DclGen(#[from] db2::dclgen::DclGenError),

    /// Numeric encode failure.
    #[error("encode error: {0}")]
    Encode(#[from] cobol::encode::EncodeError),
}
