//! DB2 CREATE TABLE parsing.
//!
//! Extracts a [`TableDef`] from DDL text: schema-qualified name, columns
//! with nullability / defaults, the primary key, and foreign keys. Line
//! (`--`) and block (`/* */`) comments are stripped and whitespace
//! normalized before a single depth-aware pass splits the body into items.
//!
//! Grammar handled per item:
//!
//! ```text
//! column  := NAME sql_type ["FOR BIT DATA"] ["NOT NULL"] ["WITH DEFAULT" [expr]]
//! pk      := "PRIMARY KEY" "(" name_list ")"
//! fk      := "FOREIGN KEY" [NAME] "(" name_list ")" "REFERENCES" qname "(" name_list ")"
//! ignored := "CONSTRAINT" … | "UNIQUE" … | "CHECK" … | "INDEX" …
//! ```

use std::fmt::Write as _;

use serde::Serialize;
use thiserror::Error;

use crate::db2::sqltype::{map_sql_type, MappingWarning};
use crate::types::LogicalType;

/// One column of a table definition.
#[derive(Debug, Clone, Serialize)]
pub struct ColumnSpec {
    /// Canonical (uppercase) column name.
    pub name: String,
    /// SQL type text as written, normalized.
    pub sql_type: String,
    /// Mapped logical type.
    pub logical: LogicalType,
    /// Whether NULL is allowed.
    pub nullable: bool,
    /// WITH DEFAULT expression; empty string for a bare WITH DEFAULT.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
    /// Whether the column is part of the primary key.
    pub is_primary_key: bool,
    /// `schema.table.column` reference when the column is a foreign key.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub foreign_key_ref: Option<String>,
}

/// A foreign key constraint.
#[derive(Debug, Clone, Serialize)]
pub struct ForeignKey {
    /// Constraint name, when one was given.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Referencing columns in this table.
    pub columns: Vec<String>,
    /// Referenced table (possibly schema-qualified).
    pub referenced_table: String,
    /// Referenced columns.
    pub referenced_columns: Vec<String>,
}

/// A parsed CREATE TABLE statement.
#[derive(Debug, Clone, Serialize)]
pub struct TableDef {
    /// Schema name; `"DBO"` when the table name was unqualified.
    pub schema: String,
    /// Table name.
    pub name: String,
    /// Columns in declaration order.
    pub columns: Vec<ColumnSpec>,
    /// Primary key column names.
    pub primary_key: Vec<String>,
    /// Foreign key constraints.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub foreign_keys: Vec<ForeignKey>,
    /// Mapping findings (unsupported types downgraded to String).
    #[serde(skip_serializing_if = "Vec::is_empty", serialize_with = "ser_warnings")]
    pub warnings: Vec<MappingWarning>,
}

fn ser_warnings<S: serde::Serializer>(
    warnings: &[MappingWarning],
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_seq(warnings.iter().map(|w| w.to_string()))
}

impl TableDef {
    /// `SCHEMA.TABLE`.
    pub fn full_name(&self) -> String {
        format!("{}.{}", self.schema, self.name)
    }

    /// Render a human-readable column report.
    pub fn render_definition(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "TABLE: {}", self.full_name());
        let _ = writeln!(out, "{:<25} {:<25} {:<6} KEY", "COLUMN", "TYPE", "NULL");
        for column in &self.columns {
            let mut key = String::new();
            if column.is_primary_key {
                key.push_str("PK");
            }
            if let Some(fk) = &column.foreign_key_ref {
                let _ = write!(key, " FK->{fk}");
            }
            let _ = writeln!(
                out,
                "{:<25} {:<25} {:<6} {}",
                column.name,
                column.sql_type,
                if column.nullable { "YES" } else { "NO" },
                key.trim()
            );
        }
        if !self.primary_key.is_empty() {
            let _ = writeln!(out, "PRIMARY KEY: {}", self.primary_key.join(", "));
        }
        out
    }
}

/// DDL parse failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DdlError {
    /// No CREATE TABLE statement in the input.
    #[error("no CREATE TABLE statement found")]
    NoCreateTable,

    /// Statement present but malformed.
    #[error("DDL syntax error: {reason}")]
    Syntax { reason: String },
}

/// Parse CREATE TABLE text into a [`TableDef`].
///
/// # Examples
///
/// ```
/// use mfd::types::LogicalType;
///
/// let table = mfd::db2::ddl::parse_ddl(
///     "CREATE TABLE S.T (K INTEGER NOT NULL, V DECIMAL(15,2), PRIMARY KEY(K))",
/// )
/// .unwrap();
/// assert_eq!(table.full_name(), "S.T");
/// assert_eq!(table.columns[0].name, "K");
/// assert!(!table.columns[0].nullable);
/// assert!(table.columns[0].is_primary_key);
/// assert_eq!(table.columns[1].logical, LogicalType::Decimal { precision: 15, scale: 2 });
/// ```
pub fn parse_ddl(text: &str) -> Result<TableDef, DdlError> {
    let cleaned = strip_comments(text);
    let normalized = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");

    let create_at = find_keyword_pair(&normalized, "CREATE", "TABLE")
        .ok_or(DdlError::NoCreateTable)?;
    let rest = &normalized[create_at..];

    // Qualified name up to the opening parenthesis.
    let open = rest.find('(').ok_or_else(|| DdlError::Syntax {
        reason: "CREATE TABLE without a column list".to_string(),
    })?;
    let qname = rest[..open].trim();
    if qname.is_empty() {
        return Err(DdlError::Syntax { reason: "CREATE TABLE without a table name".to_string() });
    }
    let (schema, name) = split_qname(qname);

    let body = matching_paren_body(&rest[open..]).ok_or_else(|| DdlError::Syntax {
        reason: "unbalanced parentheses in column list".to_string(),
    })?;

    let mut columns: Vec<ColumnSpec> = Vec::new();
    let mut primary_key: Vec<String> = Vec::new();
    let mut foreign_keys: Vec<ForeignKey> = Vec::new();
    let mut warnings: Vec<MappingWarning> = Vec::new();

    for item in split_depth0_commas(body) {
        let item = item.trim();
        if item.is_empty() {
            continue;
        }
        let upper = item.to_ascii_uppercase();
        if upper.starts_with("PRIMARY KEY") {
            primary_key = paren_name_list(item).ok_or_else(|| DdlError::Syntax {
                reason: format!("malformed PRIMARY KEY item: {item:?}"),
            })?;
        } else if upper.starts_with("FOREIGN KEY") {
            foreign_keys.push(parse_foreign_key(item)?);
        } else if upper.starts_with("CONSTRAINT")
            || upper.starts_with("UNIQUE")
            || upper.starts_with("CHECK")
            || upper.starts_with("INDEX")
        {
            // Out of scope for the logical schema.
            continue;
        } else {
            columns.push(parse_column(item, &mut warnings)?);
        }
    }

    // Back-annotate key membership onto the columns.
    for column in &mut columns {
        if primary_key.iter().any(|k| k == &column.name) {
            column.is_primary_key = true;
        }
        for fk in &foreign_keys {
            if let Some(position) = fk.columns.iter().position(|c| c == &column.name) {
                let referenced = fk
                    .referenced_columns
                    .get(position)
                    .or_else(|| fk.referenced_columns.first());
                if let Some(referenced) = referenced {
                    column.foreign_key_ref =
                        Some(format!("{}.{}", fk.referenced_table, referenced));
                }
            }
        }
    }

    Ok(TableDef { schema, name, columns, primary_key, foreign_keys, warnings })
}

/// Strip `--` line comments and `/* */` block comments.
fn strip_comments(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '-' if chars.peek() == Some(&'-') => {
                while chars.peek().is_some_and(|&n| n != '\n') {
                    chars.next();
                }
            }
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                let mut prev = ' ';
                for n in chars.by_ref() {
                    if prev == '*' && n == '/' {
                        break;
                    }
                    prev = n;
                }
                out.push(' ');
            }
            _ => out.push(c),
        }
    }
    out
}

/// Find `first` followed by `second` as words (case-insensitive); returns
/// the offset just past `second`.
fn find_keyword_pair(text: &str, first: &str, second: &str) -> Option<usize> {
    let upper = text.to_ascii_uppercase();
    let mut search_from = 0;
    while let Some(at) = upper[search_from..].find(first).map(|o| search_from + o) {
        let after = at + first.len();
        let word_start = at == 0 || !upper.as_bytes()[at - 1].is_ascii_alphanumeric();
        let rest = upper[after..].trim_start();
        if word_start && rest.starts_with(second) {
            let consumed = upper[after..].len() - rest.len();
            return Some(after + consumed + second.len());
        }
        search_from = after;
    }
    None
}

fn split_qname(qname: &str) -> (String, String) {
    match qname.split_once('.') {
        Some((schema, name)) => (schema.trim().to_ascii_uppercase(), name.trim().to_ascii_uppercase()),
        None => ("DBO".to_string(), qname.to_ascii_uppercase()),
    }
}

/// Given text starting at `(`, return the body inside the matching `)`.
fn matching_paren_body(text: &str) -> Option<&str> {
    let mut depth = 0usize;
    for (i, c) in text.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[1..i]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Split on commas at parenthesis depth 0.
fn split_depth0_commas(text: &str) -> Vec<&str> {
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

/// Extract the name list from the first parenthesized group of `item`.
fn paren_name_list(item: &str) -> Option<Vec<String>> {
    let open = item.find('(')?;
    let body = matching_paren_body(&item[open..])?;
    Some(
        body.split(',')
            .map(|n| n.trim().to_ascii_uppercase())
            .filter(|n| !n.is_empty())
            .collect(),
    )
}

fn parse_foreign_key(item: &str) -> Result<ForeignKey, DdlError> {
    let syntax = |reason: &str| DdlError::Syntax { reason: format!("{reason}: {item:?}") };
    let upper = item.to_ascii_uppercase();

    let after_kw = item["FOREIGN KEY".len()..].trim_start();
    let open = after_kw.find('(').ok_or_else(|| syntax("FOREIGN KEY without columns"))?;
    let name = {
        let label = after_kw[..open].trim();
        if label.is_empty() {
            None
        } else {
            Some(label.to_ascii_uppercase())
        }
    };
    let columns = paren_name_list(after_kw).ok_or_else(|| syntax("FOREIGN KEY without columns"))?;

    let references_at = upper.find("REFERENCES").ok_or_else(|| syntax("FOREIGN KEY without REFERENCES"))?;
    let after_ref = item[references_at + "REFERENCES".len()..].trim_start();
    let ref_open = after_ref.find('(').ok_or_else(|| syntax("REFERENCES without columns"))?;
    let referenced_table = after_ref[..ref_open].trim().to_ascii_uppercase();
    if referenced_table.is_empty() {
        return Err(syntax("REFERENCES without a table name"));
    }
    let referenced_columns =
        paren_name_list(after_ref).ok_or_else(|| syntax("REFERENCES without columns"))?;

    Ok(ForeignKey { name, columns, referenced_table, referenced_columns })
}

/// Parse one column item.
fn parse_column(item: &str, warnings: &mut Vec<MappingWarning>) -> Result<ColumnSpec, DdlError> {
    let (name, rest) = item.split_once(' ').ok_or_else(|| DdlError::Syntax {
        reason: format!("column item without a type: {item:?}"),
    })?;
    let name = name.trim().to_ascii_uppercase();
    let rest = rest.trim();
    let upper = rest.to_ascii_uppercase();

    // The type text runs up to the first NOT NULL / WITH DEFAULT marker.
    let not_null_at = upper.find("NOT NULL");
    let default_at = upper.find("WITH DEFAULT");
    let type_end = [not_null_at, default_at]
        .into_iter()
        .flatten()
        .min()
        .unwrap_or(rest.len());
    let sql_type = rest[..type_end].trim().to_ascii_uppercase();
    if sql_type.is_empty() {
        return Err(DdlError::Syntax { reason: format!("column {name} has no type") });
    }

    let nullable = not_null_at.is_none();
    let default_value = default_at.map(|at| rest[at + "WITH DEFAULT".len()..].trim().to_string());

    let (logical, known) = map_sql_type(&sql_type);
    if !known {
        warnings.push(MappingWarning::UnsupportedSqlType {
            column: name.clone(),
            sql_type: sql_type.clone(),
        });
    }

    Ok(ColumnSpec {
        name,
        sql_type,
        logical,
        nullable,
        default_value,
        is_primary_key: false,
        foreign_key_ref: None,
    })
}
