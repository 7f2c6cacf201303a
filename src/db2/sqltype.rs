//! DB2 SQL type to logical type mapping.
//!
//! Maps free-text DB2 z/OS column types onto [`LogicalType`]:
//!
//! | SQL type | Logical |
//! |----------|---------|
//! | SMALLINT | Int16 |
//! | INTEGER / INT | Int32 |
//! | BIGINT | Int64 |
//! | DECIMAL / DEC / NUMERIC (p[,s]) | Decimal(p, s) |
//! | DECFLOAT(16\|34) | Decimal(p, 0) |
//! | REAL | Float32 |
//! | FLOAT / DOUBLE / DOUBLE PRECISION | Float64 |
//! | CHAR / VARCHAR / CLOB / GRAPHIC / VARGRAPHIC / DBCLOB | String |
//! | BINARY / VARBINARY / BLOB | Binary |
//! | DATE | Date |
//! | TIMESTAMP [(p)] [WITH TIME ZONE] | Timestamp |
//! | TIME | String |
//! | BOOLEAN | Boolean |
//! | XML / ROWID | String |
//!
//! `FOR BIT DATA` turns character types into Binary. Anything else
//! downgrades to String with an [`UnsupportedSqlType`] warning for the
//! caller — unknown types must never abort a whole table parse.
//!
//! [`UnsupportedSqlType`]: MappingWarning::UnsupportedSqlType

use std::fmt;

use crate::types::LogicalType;

/// Non-fatal mapping finding attached to the parsed table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MappingWarning {
    /// SQL type not in the mapping table; column downgraded to String.
    UnsupportedSqlType { column: String, sql_type: String },
}

impl fmt::Display for MappingWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MappingWarning::UnsupportedSqlType { column, sql_type } => {
                write!(f, "column {column}: unsupported SQL type {sql_type:?}, using STRING")
            }
        }
    }
}

/// Map a DB2 type expression to a logical type.
///
/// Returns the logical type and whether the type was recognized; callers
/// raise [`MappingWarning::UnsupportedSqlType`] when it was not.
///
/// # Examples
///
/// ```
/// use mfd::db2::sqltype::map_sql_type;
/// use mfd::types::LogicalType;
///
/// assert_eq!(map_sql_type("DECIMAL(15,2)"), (LogicalType::Decimal { precision: 15, scale: 2 }, true));
/// assert_eq!(map_sql_type("VARCHAR(100)"), (LogicalType::String, true));
/// assert_eq!(map_sql_type("CHAR(8) FOR BIT DATA"), (LogicalType::Binary, true));
/// assert_eq!(map_sql_type("GEOGRAPHY"), (LogicalType::String, false));
/// ```
pub fn map_sql_type(sql_type: &str) -> (LogicalType, bool) {
    let normalized = sql_type.trim().to_ascii_uppercase();
    let normalized = normalized.split_whitespace().collect::<Vec<_>>().join(" ");

    let for_bit_data = normalized.ends_with("FOR BIT DATA");
    let base = normalized.trim_end_matches("FOR BIT DATA").trim();

    let (name, args) = split_type_args(base);
    let logical = match name {
        "SMALLINT" => LogicalType::Int16,
        "INTEGER" | "INT" => LogicalType::Int32,
        "BIGINT" => LogicalType::Int64,
        "DECIMAL" | "DEC" | "NUMERIC" => {
            let precision = args.first().copied().unwrap_or(5);
            let scale = args.get(1).copied().unwrap_or(0);
            LogicalType::Decimal { precision, scale }
        }
        "DECFLOAT" => {
            let precision = args.first().copied().unwrap_or(34);
            LogicalType::Decimal { precision, scale: 0 }
        }
        "REAL" => LogicalType::Float32,
        "FLOAT" | "DOUBLE" | "DOUBLE PRECISION" => LogicalType::Float64,
        "CHAR" | "CHARACTER" | "VARCHAR" | "LONG VARCHAR" | "CLOB" | "GRAPHIC" | "VARGRAPHIC"
        | "LONG VARGRAPHIC" | "DBCLOB" => {
            if for_bit_data {
                LogicalType::Binary
            } else {
                LogicalType::String
            }
        }
        "BINARY" | "VARBINARY" | "BLOB" => LogicalType::Binary,
        "DATE" => LogicalType::Date,
        "TIMESTAMP" | "TIMESTAMP WITH TIME ZONE" => LogicalType::Timestamp,
        "TIME" => LogicalType::String,
        "BOOLEAN" => LogicalType::Boolean,
        "XML" | "ROWID" => LogicalType::String,
        _ => return (LogicalType::String, false),
    };
    (logical, true)
}

/// Split `"DECIMAL(15, 2)"` into the base name and numeric arguments.
/// Keyword suffixes after the parenthesis (`WITH TIME ZONE`) fold back into
/// the base name.
fn split_type_args(text: &str) -> (&str, Vec<u32>) {
    let Some(open) = text.find('(') else {
        return (text, Vec::new());
    };
    let Some(close) = text[open..].find(')').map(|o| open + o) else {
        return (text.trim(), Vec::new());
    };
    let args = text[open + 1..close]
        .split(',')
        .filter_map(|a| a.trim().parse::<u32>().ok())
        .collect();
    let name = text[..open].trim();
    // TIMESTAMP(6) WITH TIME ZONE keeps its suffix for matching.
    let suffix = text[close + 1..].trim();
    if suffix.is_empty() {
        (name, args)
    } else if name == "TIMESTAMP" && suffix == "WITH TIME ZONE" {
        ("TIMESTAMP WITH TIME ZONE", args)
    } else {
        (name, args)
    }
}
