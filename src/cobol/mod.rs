//! COBOL/VSAM artifact handling.
//!
//! This module contains the copybook-side half of the crate: code-page
//! tables for EBCDIC text, the PIC clause analyzer, the copybook parser
//! that builds record layouts, and the physical decoder/encoders for
//! zoned, packed, binary, and float representations.
//!
//! Start with [`copybook::parse_copybook`] to obtain a layout, then feed
//! records to [`decode::decode_record`].

pub mod codepage;
pub mod copybook;
pub mod decode;
pub mod encode;
pub mod pic;
