//! DCLGEN output parsing and SQL ↔ host-variable cross-mapping.
//!
//! DCLGEN files interleave two views of one table: an
//! `EXEC SQL DECLARE … TABLE (…) END-EXEC` block with SQL column types, and
//! a COBOL `01` record whose host variables mirror the columns. This module
//! extracts both, analyzes host-variable pictures with the shared PIC
//! analyzer, and pairs columns to variables by the DCLGEN naming
//! convention: strip a leading `DCL-` prefix and replace `-` with `_`.
//!
//! Level 01 lines (the record name) and level 49 lines (the length prefix
//! DCLGEN generates for VARCHAR columns) are skipped; every other numbered
//! line becomes a [`HostVar`].

use std::fmt::{self, Write as _};

use serde::Serialize;
use thiserror::Error;

use crate::cobol::codepage::CodePage;
use crate::cobol::pic::{self, PicClause, Usage};
use crate::db2::ddl::ColumnSpec;
use crate::db2::sqltype::{map_sql_type, MappingWarning};
use crate::types::PhysicalType;

/// One COBOL host variable from the DCLGEN record block.
#[derive(Debug, Clone, Serialize)]
pub struct HostVar {
    /// Canonical (uppercase) variable name, e.g. `DCL-CUST-ID`.
    pub name: String,
    /// COBOL level number.
    pub level: u8,
    /// Reconstructed picture/usage phrase, when present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,
    /// Physical storage of the variable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub physical: Option<PhysicalType>,
    /// Paired SQL column, resolved by naming convention.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sql_column: Option<String>,
}

/// Non-fatal DCLGEN findings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DclGenWarning {
    /// A host variable matched no SQL column by the naming convention.
    HostVariableUnpaired { variable: String },
    /// The `NUMBER OF COLUMNS` comment disagrees with the DECLARE block.
    ColumnCountMismatch { declared: usize, parsed: usize },
    /// An SQL column type fell outside the mapping table.
    Mapping(MappingWarning),
}

impl fmt::Display for DclGenWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DclGenWarning::HostVariableUnpaired { variable } => {
                write!(f, "host variable {variable} pairs with no SQL column")
            }
            DclGenWarning::ColumnCountMismatch { declared, parsed } => write!(
                f,
                "DCLGEN declares {declared} columns but {parsed} were parsed"
            ),
            DclGenWarning::Mapping(w) => w.fmt(f),
        }
    }
}

/// Parsed DCLGEN output: both views of the table plus their pairing.
#[derive(Debug, Clone, Serialize)]
pub struct DclGenResult {
    /// Full table name as declared (possibly schema-qualified).
    pub table_name: String,
    /// Schema part, empty when unqualified.
    pub schema: String,
    /// Table part.
    pub table: String,
    /// SQL columns from the DECLARE block.
    pub sql_columns: Vec<ColumnSpec>,
    /// COBOL host variables, in declaration order.
    pub host_variables: Vec<HostVar>,
    /// Column count, from the DCLGEN comment when present.
    pub column_count: usize,
    /// Pairing and mapping findings.
    #[serde(skip_serializing_if = "Vec::is_empty", serialize_with = "ser_warnings")]
    pub warnings: Vec<DclGenWarning>,
}

fn ser_warnings<S: serde::Serializer>(
    warnings: &[DclGenWarning],
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_seq(warnings.iter().map(|w| w.to_string()))
}

impl DclGenResult {
    /// The host variable paired with `column`, if any.
    pub fn host_for_column(&self, column: &str) -> Option<&HostVar> {
        self.host_variables
            .iter()
            .find(|v| v.sql_column.as_deref() == Some(column))
    }

    /// Render the SQL ↔ COBOL mapping report.
    pub fn render_mapping(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "DCLGEN MAPPING: {}", self.table_name);
        let _ = writeln!(
            out,
            "{:<25} {:<20} {:<25} PICTURE",
            "SQL COLUMN", "SQL TYPE", "HOST VARIABLE"
        );
        for column in &self.sql_columns {
            let host = self.host_for_column(&column.name);
            let _ = writeln!(
                out,
                "{:<25} {:<20} {:<25} {}",
                column.name,
                column.sql_type,
                host.map(|h| h.name.as_str()).unwrap_or(""),
                host.and_then(|h| h.picture.as_deref()).unwrap_or("")
            );
        }
        let _ = writeln!(out, "COLUMNS: {}", self.column_count);
        out
    }
}

/// DCLGEN parse failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DclGenError {
    /// Missing or unterminated `EXEC SQL DECLARE … END-EXEC` block.
    #[error("DCLGEN structure error: {reason}")]
    Structure { reason: String },
}

/// Parse DCLGEN output.
///
/// # Examples
///
/// ```
/// use mfd::types::{LogicalType, PhysicalType};
///
/// let source = "\
///      EXEC SQL DECLARE DSN8.CUST TABLE\n\
///      ( CUST_ID        INTEGER NOT NULL,\n\
///        CUST_NAME      VARCHAR(30)\n\
///      ) END-EXEC.\n\
///      01  DCLCUST.\n\
///          10 DCL-CUST-ID     PIC S9(9) COMP.\n\
///          10 DCL-CUST-NAME.\n\
///             49 DCL-CUST-NAME-LEN  PIC S9(4) COMP.\n\
///             49 DCL-CUST-NAME-TEXT PIC X(30).\n";
/// let result = mfd::db2::dclgen::parse_dclgen(source).unwrap();
/// assert_eq!(result.table_name, "DSN8.CUST");
/// let var = result.host_for_column("CUST_ID").unwrap();
/// assert_eq!(var.physical, Some(PhysicalType::Binary { bytes: 4, signed: true }));
/// assert_eq!(result.sql_columns[0].logical, LogicalType::Int32);
/// ```
pub fn parse_dclgen(text: &str) -> Result<DclGenResult, DclGenError> {
    let (table_name, declare_body, declare_span) = extract_declare(text)?;
    let (schema, table) = match table_name.split_once('.') {
        Some((s, t)) => (s.to_string(), t.to_string()),
        None => (String::new(), table_name.clone()),
    };

    let mut warnings = Vec::new();
    let sql_columns = parse_declare_columns(&declare_body, &mut warnings);

    // Host variables live outside the DECLARE block.
    let outside = format!("{}\n{}", &text[..declare_span.0], &text[declare_span.1..]);
    let mut host_variables = parse_host_variables(&outside);

    let declared_count = declared_column_count(text).unwrap_or(sql_columns.len());
    if declared_count != sql_columns.len() {
        warnings.push(DclGenWarning::ColumnCountMismatch {
            declared: declared_count,
            parsed: sql_columns.len(),
        });
    }

    // Pair host variables to columns: DCL- strip, then hyphens to
    // underscores, exact match.
    for variable in &mut host_variables {
        let candidate = variable
            .name
            .strip_prefix("DCL-")
            .unwrap_or(&variable.name)
            .replace('-', "_");
        if sql_columns.iter().any(|c| c.name == candidate) {
            variable.sql_column = Some(candidate);
        } else {
            warnings.push(DclGenWarning::HostVariableUnpaired {
                variable: variable.name.clone(),
            });
        }
    }

    Ok(DclGenResult {
        table_name,
        schema,
        table,
        sql_columns,
        host_variables,
        column_count: declared_count,
        warnings,
    })
}

/// Locate `EXEC SQL DECLARE <name> TABLE ( … ) END-EXEC`; returns the table
/// name, the parenthesized body, and the byte span of the whole block.
fn extract_declare(text: &str) -> Result<(String, String, (usize, usize)), DclGenError> {
    let structure = |reason: &str| DclGenError::Structure { reason: reason.to_string() };
    let upper = text.to_ascii_uppercase();

    let exec_at = upper.find("EXEC SQL").ok_or_else(|| structure("no EXEC SQL DECLARE block"))?;
    let declare_at = upper[exec_at..]
        .find("DECLARE")
        .map(|o| exec_at + o)
        .ok_or_else(|| structure("EXEC SQL without DECLARE"))?;
    let after_declare = declare_at + "DECLARE".len();

    let table_kw = upper[after_declare..]
        .find("TABLE")
        .map(|o| after_declare + o)
        .ok_or_else(|| structure("DECLARE without TABLE keyword"))?;
    let table_name = text[after_declare..table_kw]
        .trim()
        .to_ascii_uppercase();
    if table_name.is_empty() {
        return Err(structure("DECLARE without a table name"));
    }

    let open = text[table_kw..]
        .find('(')
        .map(|o| table_kw + o)
        .ok_or_else(|| structure("DECLARE TABLE without a column list"))?;
    let end_exec = upper[open..]
        .find("END-EXEC")
        .map(|o| open + o)
        .ok_or_else(|| structure("DECLARE block without END-EXEC"))?;

    let body_region = &text[open..end_exec];
    let close = body_region
        .rfind(')')
        .ok_or_else(|| structure("unterminated column list in DECLARE"))?;
    let body = body_region[1..close].to_string();

    Ok((table_name, body, (exec_at, end_exec + "END-EXEC".len())))
}

/// Parse the DECLARE column list (subset grammar: name, type, optional
/// NOT NULL [WITH DEFAULT]).
fn parse_declare_columns(body: &str, warnings: &mut Vec<DclGenWarning>) -> Vec<ColumnSpec> {
    let normalized = body.split_whitespace().collect::<Vec<_>>().join(" ");
    let mut columns = Vec::new();
    for item in split_depth0(&normalized) {
        let item = item.trim();
        if item.is_empty() {
            continue;
        }
        let Some((name, rest)) = item.split_once(' ') else {
            continue;
        };
        let name = name.to_ascii_uppercase();
        let upper_rest = rest.to_ascii_uppercase();
        let not_null_at = upper_rest.find("NOT NULL");
        let sql_type = rest[..not_null_at.unwrap_or(rest.len())].trim().to_ascii_uppercase();
        if sql_type.is_empty() {
            continue;
        }
        let (logical, known) = map_sql_type(&sql_type);
        if !known {
            warnings.push(DclGenWarning::Mapping(MappingWarning::UnsupportedSqlType {
                column: name.clone(),
                sql_type: sql_type.clone(),
            }));
        }
        columns.push(ColumnSpec {
            name,
            sql_type,
            logical,
            nullable: not_null_at.is_none(),
            default_value: None,
            is_primary_key: false,
            foreign_key_ref: None,
        });
    }
    columns
}

fn split_depth0(text: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0usize;
    for (i, c) in text.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(&text[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&text[start..]);
    parts
}

/// Scan for numbered host-variable lines, skipping levels 01 and 49.
fn parse_host_variables(text: &str) -> Vec<HostVar> {
    let mut variables = Vec::new();
    for line in text.lines() {
        let line = line.trim().trim_end_matches('.');
        let mut tokens = line.split_whitespace();
        let Some(level_token) = tokens.next() else {
            continue;
        };
        let Ok(level) = level_token.parse::<u8>() else {
            continue;
        };
        // 01 names the record; 49 is the VARCHAR length prefix pair.
        if level == 1 || level == 49 || !(2..=48).contains(&level) {
            continue;
        }
        let Some(name) = tokens.next() else {
            continue;
        };
        let name = name.to_ascii_uppercase();

        let mut picture: Option<String> = None;
        let mut usage: Option<Usage> = None;
        let rest: Vec<String> = tokens.map(|t| t.to_ascii_uppercase()).collect();
        let mut i = 0;
        while i < rest.len() {
            match rest[i].as_str() {
                "PIC" | "PICTURE" => {
                    picture = rest.get(i + 1).cloned();
                    i += 2;
                }
                "USAGE" => {
                    let mut j = i + 1;
                    if rest.get(j).map(String::as_str) == Some("IS") {
                        j += 1;
                    }
                    usage = rest.get(j).and_then(|t| Usage::from_token(t));
                    i = j + 1;
                }
                token => {
                    if let Some(u) = Usage::from_token(token) {
                        usage = Some(u);
                    }
                    i += 1;
                }
            }
        }

        let clause: Option<PicClause> = if let Some(body) = picture.take() {
            let phrase = match usage {
                Some(Usage::Binary) => format!("PIC {body} COMP"),
                Some(Usage::Packed) => format!("PIC {body} COMP-3"),
                Some(Usage::Float4) => format!("PIC {body} COMP-1"),
                Some(Usage::Float8) => format!("PIC {body} COMP-2"),
                _ => format!("PIC {body}"),
            };
            let clause = pic::analyze(&phrase, CodePage::default()).ok();
            picture = Some(phrase);
            clause
        } else {
            match usage {
                Some(Usage::Float4) => {
                    picture = Some("COMP-1".to_string());
                    Some(PicClause {
                        physical: PhysicalType::Float4,
                        digits: 0,
                        scale: 0,
                        signed: true,
                    })
                }
                Some(Usage::Float8) => {
                    picture = Some("COMP-2".to_string());
                    Some(PicClause {
                        physical: PhysicalType::Float8,
                        digits: 0,
                        scale: 0,
                        signed: true,
                    })
                }
                _ => None,
            }
        };

        variables.push(HostVar {
            name,
            level,
            picture,
            physical: clause.map(|c| c.physical),
            sql_column: None,
        });
    }
    variables
}

/// The `NUMBER OF COLUMNS IN TABLE … IS n` comment DCLGEN writes.
fn declared_column_count(text: &str) -> Option<usize> {
    let upper = text.to_ascii_uppercase();
    let at = upper.find("NUMBER OF COLUMNS")?;
    let is_at = upper[at..].find(" IS ").map(|o| at + o + 4)?;
    upper[is_at..]
        .split_whitespace()
        .next()?
        .trim_matches(|c: char| !c.is_ascii_digit())
        .parse()
        .ok()
}
