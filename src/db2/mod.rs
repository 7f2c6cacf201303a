//! DB2 artifact handling.
//!
//! Parsers for the SQL-side sources: CREATE TABLE DDL ([`ddl`]) and DCLGEN
//! output ([`dclgen`]), plus the SQL type mapper ([`sqltype`]) both share.
//! DCLGEN host-variable pictures are analyzed with the same PIC analyzer
//! the copybook parser uses, so one logical schema covers the SQL and the
//! physical COBOL view of a table.

pub mod dclgen;
pub mod ddl;
pub mod sqltype;
