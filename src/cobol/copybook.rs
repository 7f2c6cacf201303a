//! COBOL copybook parsing and record layout construction.
//!
//! Copybook source is area-encoded: columns 1–6 carry sequence numbers
//! (discarded), column 7 is the indicator (`*` comment, `-` continuation),
//! columns 8–72 carry content, and columns 73–80 are discarded. Statements
//! end with a period and may span lines.
//!
//! [`parse_copybook`] normalizes the source, parses each statement's level,
//! name, and clauses (`PIC`, `OCCURS`, `REDEFINES`, `USAGE`, `VALUE`), and
//! builds a [`Layout`]: a flat, ordered field list with byte offsets, a
//! parent/children index structure for groups, overlay links for REDEFINES,
//! and the computed record length.
//!
//! Levels 66 (RENAMES) and 88 (condition names) are recognized and
//! discarded. FILLER items are kept in the layout and flagged so callers
//! can hide them.

use std::fmt::Write as _;

use serde::Serialize;
use thiserror::Error;

use crate::cobol::codepage::CodePage;
use crate::cobol::pic::{self, PicClause, PicError, Usage};
use crate::types::PhysicalType;

/// One field of a record layout.
#[derive(Debug, Clone, Serialize)]
pub struct Field {
    /// Canonical (uppercase) field name; hyphens preserved.
    pub name: String,
    /// COBOL level number.
    pub level: u8,
    /// Byte offset from the start of the record.
    pub offset: usize,
    /// Physical storage; `None` for group items.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub physical: Option<PhysicalType>,
    /// Raw picture/usage text as written, for reports and diagnostics.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,
    /// Number of occurrences (1 unless OCCURS is present).
    pub occurs: usize,
    /// Name of the redefined sibling, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redefines: Option<String>,
    /// Index of the overlaid field for REDEFINES items.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overlay_of: Option<usize>,
    /// Index of the enclosing group item.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<usize>,
    /// Indices of direct children (group items only).
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<usize>,
    /// Whether the item is a FILLER.
    pub filler: bool,
    /// Recorded VALUE literal, otherwise ignored.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl Field {
    /// Elementary items carry a physical type; groups do not.
    pub fn is_elementary(&self) -> bool {
        self.physical.is_some()
    }

    pub fn is_group(&self) -> bool {
        self.physical.is_none() && !self.filler
    }

    /// Storage width of one occurrence, 0 for groups.
    pub fn width(&self) -> usize {
        self.physical.map(|p| p.byte_width()).unwrap_or(0)
    }

    /// Total storage including OCCURS.
    pub fn total_width(&self) -> usize {
        self.width() * self.occurs
    }
}

/// Immutable record layout: ordered fields plus the computed record length.
#[derive(Debug, Clone, Serialize)]
pub struct Layout {
    /// Fields in declaration order.
    pub fields: Vec<Field>,
    /// Total record length in bytes.
    pub record_length: usize,
}

/// Non-fatal layout finding surfaced to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayoutWarning {
    /// Caller-declared record length disagrees with the computed one.
    RecordLengthInconsistent { expected: usize, computed: usize },
}

impl std::fmt::Display for LayoutWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LayoutWarning::RecordLengthInconsistent { expected, computed } => write!(
                f,
                "declared record length {expected} does not match computed length {computed}"
            ),
        }
    }
}

impl Layout {
    /// Iterate elementary fields with their indices, in layout order.
    pub fn elementary(&self) -> impl Iterator<Item = (usize, &Field)> {
        self.fields.iter().enumerate().filter(|(_, f)| f.is_elementary())
    }

    /// Look up the first field with the given canonical name.
    pub fn field(&self, name: &str) -> Option<&Field> {
        let upper = name.to_ascii_uppercase();
        self.fields.iter().find(|f| f.name == upper)
    }

    /// Compare a caller-declared record length against the computed one.
    pub fn check_record_length(&self, expected: usize) -> Option<LayoutWarning> {
        if expected != self.record_length {
            Some(LayoutWarning::RecordLengthInconsistent {
                expected,
                computed: self.record_length,
            })
        } else {
            None
        }
    }

    /// Render a human-readable layout report.
    ///
    /// ```text
    /// OFFSET   LENGTH   LEVEL  NAME                                PICTURE
    /// 0        4        05     CUST-ID                             9(4)
    /// ```
    pub fn render_layout(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "{:<8} {:<8} {:<6} {:<35} PICTURE",
            "OFFSET", "LENGTH", "LEVEL", "NAME"
        );
        for field in &self.fields {
            let indent = "  ".repeat((field.level as usize) / 5);
            let name = format!("{indent}{}", field.name);
            let picture = field.picture.as_deref().unwrap_or("(GROUP)");
            let mut annotations = String::new();
            if field.occurs > 1 {
                let _ = write!(annotations, " OCCURS {}", field.occurs);
            }
            if let Some(target) = &field.redefines {
                let _ = write!(annotations, " REDEFINES {target}");
            }
            let _ = writeln!(
                out,
                "{:<8} {:<8} {:<6} {:<35} {}{}",
                field.offset,
                field.total_width(),
                format!("{:02}", field.level),
                name,
                picture,
                annotations
            );
        }
        let _ = writeln!(out, "RECORD LENGTH: {} bytes", self.record_length);
        out
    }
}

/// Copybook parse failure. Fatal; reported with the 1-based source line.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CopybookError {
    /// The source does not conform to the fixed-column area layout or the
    /// statement grammar.
    #[error("line {line}: {reason}")]
    Area { line: usize, reason: String },

    /// A picture clause failed to analyze.
    #[error("line {line}: {source}")]
    Pic { line: usize, source: PicError },

    /// REDEFINES names no previous sibling at the same level and parent.
    #[error("line {line}: {name} redefines unknown sibling {target}")]
    RedefinesTargetMissing { name: String, target: String, line: usize },

    /// OCCURS count below 1.
    #[error("line {line}: {name} declares OCCURS {count}")]
    OccursNotPositive { name: String, count: i64, line: usize },

    /// A nested group closed without any children.
    #[error("group {name} contains no fields")]
    GroupEmpty { name: String },
}

/// Parser knobs.
#[derive(Debug, Clone, Copy)]
pub struct CopybookOptions {
    /// Code page attached to text pictures.
    pub codec: CodePage,
    /// Degrade unparseable pictures to text instead of failing.
    pub lenient_pics: bool,
}

impl Default for CopybookOptions {
    fn default() -> Self {
        CopybookOptions { codec: CodePage::default(), lenient_pics: false }
    }
}

/// Parse copybook source into a [`Layout`] using default options (cp037,
/// strict pictures).
///
/// # Examples
///
/// ```
/// use mfd::cobol::copybook::parse_copybook;
///
/// let layout = parse_copybook(
///     "       01 REC.\n          05 CUST-ID   PIC 9(4).\n          05 NAME      PIC X(20).\n",
/// )
/// .unwrap();
/// assert_eq!(layout.record_length, 24);
/// assert_eq!(layout.field("NAME").unwrap().offset, 4);
/// ```
pub fn parse_copybook(text: &str) -> Result<Layout, CopybookError> {
    parse_copybook_with(text, &CopybookOptions::default())
}

/// Parse copybook source with explicit options.
pub fn parse_copybook_with(
    text: &str,
    options: &CopybookOptions,
) -> Result<Layout, CopybookError> {
    let statements = normalize_areas(text)?;
    let mut builder = LayoutBuilder::new();
    for stmt in &statements {
        if let Some(parsed) = parse_statement(stmt, options)? {
            builder.push(parsed, stmt.line)?;
        }
    }
    builder.finish()
}

// ---------------------------------------------------------------------------
// Area normalization
// ---------------------------------------------------------------------------

/// One period-terminated statement with the line it started on.
#[derive(Debug)]
struct Statement {
    text: String,
    line: usize,
}

/// Strip sequence/indicator/right margin areas, splice continuations, and
/// split the result into period-terminated statements. Periods inside
/// quoted literals do not terminate.
fn normalize_areas(text: &str) -> Result<Vec<Statement>, CopybookError> {
    // Pass 1: per-line area handling into (content, line) chunks.
    let mut chunks: Vec<(String, usize)> = Vec::new();
    for (idx, raw) in text.lines().enumerate() {
        let line_no = idx + 1;
        if raw.trim().is_empty() {
            continue;
        }
        let chars: Vec<char> = raw.chars().collect();
        let (indicator, content) = if chars.len() >= 7 {
            let end = chars.len().min(72);
            (chars[6], chars[7..end].iter().collect::<String>())
        } else {
            // Short line: treat everything as content (free-form fragments
            // show up in DCLGEN-extracted copybooks).
            (' ', raw.to_string())
        };
        match indicator {
            '*' | '/' => continue,
            '-' => {
                let (prev, _) = chunks.last_mut().ok_or_else(|| CopybookError::Area {
                    line: line_no,
                    reason: "continuation with no preceding line".to_string(),
                })?;
                let trimmed = prev.trim_end().to_string();
                *prev = trimmed + content.trim_start();
            }
            ' ' => {
                if !content.trim().is_empty() {
                    chunks.push((content, line_no));
                }
            }
            other => {
                return Err(CopybookError::Area {
                    line: line_no,
                    reason: format!("unrecognized indicator {other:?} in column 7"),
                });
            }
        }
    }

    // Pass 2: split on statement-terminating periods, quote-aware.
    let mut statements = Vec::new();
    let mut current = String::new();
    let mut current_line = 0usize;
    for (content, line_no) in &chunks {
        if current.is_empty() {
            current_line = *line_no;
        } else {
            current.push(' ');
        }
        let mut quote: Option<char> = None;
        for c in content.chars() {
            match quote {
                Some(q) => {
                    current.push(c);
                    if c == q {
                        quote = None;
                    }
                }
                None => match c {
                    '\'' | '"' => {
                        quote = Some(c);
                        current.push(c);
                    }
                    '.' => {
                        let text = current.trim().to_string();
                        if !text.is_empty() {
                            statements.push(Statement { text, line: current_line });
                        }
                        current.clear();
                        current_line = *line_no;
                    }
                    _ => current.push(c),
                },
            }
        }
    }
    let tail = current.trim().to_string();
    if !tail.is_empty() {
        statements.push(Statement { text: tail, line: current_line });
    }
    Ok(statements)
}

// ---------------------------------------------------------------------------
// Statement parsing
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct ParsedStatement {
    level: u8,
    name: String,
    filler: bool,
    clause: Option<PicClause>,
    picture: Option<String>,
    occurs: usize,
    redefines: Option<String>,
    value: Option<String>,
}

/// Split a statement into whitespace-separated tokens, keeping quoted
/// literals (with their spaces) as single tokens.
fn tokenize(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;
    for c in text.chars() {
        match quote {
            Some(q) => {
                current.push(c);
                if c == q {
                    quote = None;
                }
            }
            None => match c {
                '\'' | '"' => {
                    quote = Some(c);
                    current.push(c);
                }
                c if c.is_whitespace() => {
                    if !current.is_empty() {
                        tokens.push(std::mem::take(&mut current));
                    }
                }
                _ => current.push(c),
            },
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

/// Parse one statement. Returns `None` for discarded statements (levels 66
/// and 88).
fn parse_statement(
    stmt: &Statement,
    options: &CopybookOptions,
) -> Result<Option<ParsedStatement>, CopybookError> {
    let tokens = tokenize(&stmt.text);
    let area_err = |reason: String| CopybookError::Area { line: stmt.line, reason };

    let level_token = tokens
        .first()
        .ok_or_else(|| area_err("empty statement".to_string()))?;
    let level: u8 = level_token
        .parse()
        .map_err(|_| area_err(format!("statement does not begin with a level number: {:?}", stmt.text)))?;
    if level == 66 || level == 88 {
        return Ok(None);
    }
    if !(1..=49).contains(&level) && level != 77 {
        return Err(area_err(format!("level {level} outside the data-item range")));
    }

    let name = tokens
        .get(1)
        .ok_or_else(|| area_err("level number with no field name".to_string()))?
        .to_ascii_uppercase();
    let filler = name == "FILLER";

    let mut occurs: usize = 1;
    let mut redefines: Option<String> = None;
    let mut picture_text: Option<String> = None;
    let mut usage: Option<Usage> = None;
    let mut value: Option<String> = None;

    let mut i = 2;
    while i < tokens.len() {
        let token = tokens[i].to_ascii_uppercase();
        match token.as_str() {
            "REDEFINES" => {
                let target = tokens
                    .get(i + 1)
                    .ok_or_else(|| area_err("REDEFINES with no target name".to_string()))?;
                redefines = Some(target.to_ascii_uppercase());
                i += 2;
            }
            "OCCURS" => {
                let count_token = tokens
                    .get(i + 1)
                    .ok_or_else(|| area_err("OCCURS with no count".to_string()))?;
                let count: i64 = count_token
                    .parse()
                    .map_err(|_| area_err(format!("OCCURS count {count_token:?} is not a number")))?;
                if count < 1 {
                    return Err(CopybookError::OccursNotPositive {
                        name: name.clone(),
                        count,
                        line: stmt.line,
                    });
                }
                occurs = count as usize;
                i += 2;
                if tokens.get(i).map(|t| t.eq_ignore_ascii_case("TIMES")) == Some(true) {
                    i += 1;
                }
            }
            "PIC" | "PICTURE" => {
                let body = tokens
                    .get(i + 1)
                    .ok_or_else(|| area_err("PIC with no picture".to_string()))?;
                picture_text = Some(body.to_ascii_uppercase());
                i += 2;
            }
            "USAGE" => {
                let mut j = i + 1;
                if tokens.get(j).map(|t| t.eq_ignore_ascii_case("IS")) == Some(true) {
                    j += 1;
                }
                let token = tokens
                    .get(j)
                    .ok_or_else(|| area_err("USAGE with no representation".to_string()))?
                    .to_ascii_uppercase();
                usage = Usage::from_token(&token);
                if usage.is_none() {
                    return Err(area_err(format!("unrecognized USAGE {token:?}")));
                }
                i = j + 1;
            }
            "VALUE" | "VALUES" => {
                let mut j = i + 1;
                if tokens.get(j).map(|t| t.eq_ignore_ascii_case("IS")) == Some(true) {
                    j += 1;
                }
                // Recorded, otherwise ignored.
                value = tokens.get(j).cloned();
                i = j + 1;
            }
            _ => {
                // Bare usage tokens (COMP-3 etc.) and clauses outside the
                // supported grammar (SYNC, JUSTIFIED, BLANK WHEN ZERO).
                if let Some(u) = Usage::from_token(&token) {
                    usage = Some(u);
                }
                i += 1;
            }
        }
    }

    // Resolve the physical type from picture and/or usage.
    let (clause, picture) = match (&picture_text, usage) {
        (Some(body), _) => {
            let phrase = match usage_suffix(usage) {
                Some(suffix) => format!("PIC {body} {suffix}"),
                None => format!("PIC {body}"),
            };
            let clause = if options.lenient_pics {
                pic::analyze_lenient(&phrase, options.codec)
            } else {
                pic::analyze(&phrase, options.codec)
                    .map_err(|source| CopybookError::Pic { line: stmt.line, source })?
            };
            (Some(clause), Some(phrase))
        }
        (None, Some(Usage::Float4)) => (
            Some(PicClause { physical: PhysicalType::Float4, digits: 0, scale: 0, signed: true }),
            Some("COMP-1".to_string()),
        ),
        (None, Some(Usage::Float8)) => (
            Some(PicClause { physical: PhysicalType::Float8, digits: 0, scale: 0, signed: true }),
            Some("COMP-2".to_string()),
        ),
        (None, _) => (None, None),
    };

    Ok(Some(ParsedStatement {
        level,
        name,
        filler,
        clause,
        picture,
        occurs,
        redefines,
        value,
    }))
}

fn usage_suffix(usage: Option<Usage>) -> Option<&'static str> {
    match usage? {
        Usage::Binary => Some("COMP"),
        Usage::Packed => Some("COMP-3"),
        Usage::Float4 => Some("COMP-1"),
        Usage::Float8 => Some("COMP-2"),
        Usage::Display => Some("DISPLAY"),
    }
}

// ---------------------------------------------------------------------------
// Layout building
// ---------------------------------------------------------------------------

struct StackEntry {
    level: u8,
    index: usize,
    /// Cursor to restore when a REDEFINES group closes.
    restore_cursor: Option<usize>,
}

struct LayoutBuilder {
    fields: Vec<Field>,
    stack: Vec<StackEntry>,
    cursor: usize,
}

impl LayoutBuilder {
    fn new() -> Self {
        LayoutBuilder { fields: Vec::new(), stack: Vec::new(), cursor: 0 }
    }

    fn push(&mut self, stmt: ParsedStatement, line: usize) -> Result<(), CopybookError> {
        self.close_to_level(stmt.level)?;

        let parent = self.stack.last().map(|entry| entry.index);
        let index = self.fields.len();

        let is_group = stmt.clause.is_none() && !stmt.filler;
        let physical = stmt.clause.map(|c| c.physical);
        let width = physical.map(|p| p.byte_width()).unwrap_or(0);

        // REDEFINES overlays the named sibling and does not move the cursor.
        let mut overlay_of = None;
        let mut restore_cursor = None;
        let offset = if let Some(target) = &stmt.redefines {
            let target_index = self
                .find_sibling(parent, stmt.level, target)
                .ok_or_else(|| CopybookError::RedefinesTargetMissing {
                    name: stmt.name.clone(),
                    target: target.clone(),
                    line,
                })?;
            overlay_of = Some(target_index);
            let overlay_offset = self.fields[target_index].offset;
            if is_group {
                // Children lay out from the overlaid offset; the original
                // cursor comes back when this group closes.
                restore_cursor = Some(self.cursor);
                self.cursor = overlay_offset;
            }
            overlay_offset
        } else {
            let offset = self.cursor;
            if physical.is_some() {
                self.cursor += width * stmt.occurs;
            }
            offset
        };

        if let Some(parent_index) = parent {
            self.fields[parent_index].children.push(index);
        }

        self.fields.push(Field {
            name: stmt.name,
            level: stmt.level,
            offset,
            physical,
            picture: stmt.picture,
            occurs: stmt.occurs,
            redefines: stmt.redefines,
            overlay_of,
            parent,
            children: Vec::new(),
            filler: stmt.filler,
            value: stmt.value,
        });

        if is_group {
            self.stack.push(StackEntry { level: stmt.level, index, restore_cursor });
        }
        Ok(())
    }

    /// Pop stack entries at or below the incoming level, validating groups
    /// and restoring REDEFINES cursors as they close.
    fn close_to_level(&mut self, level: u8) -> Result<(), CopybookError> {
        while let Some(top) = self.stack.last() {
            if top.level < level {
                break;
            }
            let Some(entry) = self.stack.pop() else { break };
            let field = &self.fields[entry.index];
            if field.children.is_empty() && field.parent.is_some() {
                return Err(CopybookError::GroupEmpty { name: field.name.clone() });
            }
            if let Some(cursor) = entry.restore_cursor {
                self.cursor = cursor;
            }
        }
        Ok(())
    }

    /// Nearest previous sibling (same parent, same level) with the name.
    fn find_sibling(&self, parent: Option<usize>, level: u8, name: &str) -> Option<usize> {
        self.fields
            .iter()
            .enumerate()
            .rev()
            .find(|(_, f)| f.parent == parent && f.level == level && f.name == name)
            .map(|(i, _)| i)
    }

    fn finish(mut self) -> Result<Layout, CopybookError> {
        self.close_to_level(0)?;
        let record_length = self
            .fields
            .iter()
            .filter(|f| f.is_elementary())
            .map(|f| f.offset + f.total_width())
            .max()
            .unwrap_or(0);
        Ok(Layout { fields: self.fields, record_length })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Indent content into area B the way real copybooks are written.
    fn cpy(body: &str) -> String {
        body.lines()
            .map(|l| format!("       {l}"))
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn test_flat_layout_offsets() {
        let layout = parse_copybook(&cpy(
            "01 CUSTOMER-REC.\n\
             05 CUST-ID      PIC 9(9).\n\
             05 CUST-NAME    PIC X(30).\n\
             05 BALANCE      PIC S9(7)V99 COMP-3.",
        ))
        .unwrap();

        assert_eq!(layout.field("CUST-ID").unwrap().offset, 0);
        assert_eq!(layout.field("CUST-NAME").unwrap().offset, 9);
        assert_eq!(layout.field("BALANCE").unwrap().offset, 39);
        assert_eq!(layout.record_length, 44);
    }

    #[test]
    fn test_redefines_scenario() {
        // Spec scenario S4.
        let layout = parse_copybook(&cpy(
            "01 REC.\n\
             05 A   PIC X(4).\n\
             05 B   PIC X(4).\n\
             05 C REDEFINES B   PIC 9(4).\n\
             05 D   PIC X(2).",
        ))
        .unwrap();

        assert_eq!(layout.field("A").unwrap().offset, 0);
        assert_eq!(layout.field("B").unwrap().offset, 4);
        assert_eq!(layout.field("C").unwrap().offset, 4);
        assert_eq!(layout.field("D").unwrap().offset, 8);
        assert_eq!(layout.record_length, 10);

        let c = layout.field("C").unwrap();
        assert_eq!(c.redefines.as_deref(), Some("B"));
        assert_eq!(c.overlay_of, Some(2));
    }

    #[test]
    fn test_group_redefines_restores_cursor() {
        let layout = parse_copybook(&cpy(
            "01 REC.\n\
             05 RAW        PIC X(8).\n\
             05 PARTS REDEFINES RAW.\n\
             10 HIGH       PIC X(4).\n\
             10 LOW        PIC X(4).\n\
             05 AFTER-X    PIC X(2).",
        ))
        .unwrap();

        assert_eq!(layout.field("HIGH").unwrap().offset, 0);
        assert_eq!(layout.field("LOW").unwrap().offset, 4);
        // Cursor after the overlay pair equals cursor after RAW alone.
        assert_eq!(layout.field("AFTER-X").unwrap().offset, 8);
        assert_eq!(layout.record_length, 10);
    }

    #[test]
    fn test_redefines_target_missing() {
        let err = parse_copybook(&cpy(
            "01 REC.\n\
             05 A   PIC X(4).\n\
             10 B REDEFINES A PIC X(4).",
        ))
        .unwrap_err();
        // Level mismatch: A is an 05, the redefinition is an 10.
        assert!(matches!(err, CopybookError::RedefinesTargetMissing { .. }));
    }

    #[test]
    fn test_occurs_advances_cursor() {
        let layout = parse_copybook(&cpy(
            "01 REC.\n\
             05 MONTH-TOTALS  PIC S9(5)V99 COMP-3 OCCURS 12 TIMES.\n\
             05 TRAILER       PIC X(3).",
        ))
        .unwrap();
        let totals = layout.field("MONTH-TOTALS").unwrap();
        assert_eq!(totals.occurs, 12);
        assert_eq!(totals.total_width(), 48);
        assert_eq!(layout.field("TRAILER").unwrap().offset, 48);
        assert_eq!(layout.record_length, 51);
    }

    #[test]
    fn test_occurs_not_positive() {
        let err = parse_copybook(&cpy(
            "01 REC.\n\
             05 X PIC 9(2) OCCURS 0.",
        ))
        .unwrap_err();
        assert!(matches!(err, CopybookError::OccursNotPositive { count: 0, .. }));
    }

    #[test]
    fn test_levels_66_88_discarded() {
        let layout = parse_copybook(&cpy(
            "01 REC.\n\
             05 STATUS-CODE  PIC X.\n\
             88 STATUS-OK    VALUE 'A'.\n\
             88 STATUS-BAD   VALUE 'Z'.\n\
             66 ALIAS RENAMES STATUS-CODE.\n\
             05 AMOUNT       PIC 9(3).",
        ))
        .unwrap();
        assert!(layout.field("STATUS-OK").is_none());
        assert!(layout.field("ALIAS").is_none());
        assert_eq!(layout.field("AMOUNT").unwrap().offset, 1);
        assert_eq!(layout.record_length, 4);
    }

    #[test]
    fn test_filler_retained_and_flagged() {
        let layout = parse_copybook(&cpy(
            "01 REC.\n\
             05 A       PIC X(2).\n\
             05 FILLER  PIC X(6).\n\
             05 B       PIC X(2).",
        ))
        .unwrap();
        let filler = layout.field("FILLER").unwrap();
        assert!(filler.filler);
        assert_eq!(filler.offset, 2);
        assert_eq!(layout.field("B").unwrap().offset, 8);
    }

    #[test]
    fn test_area_encoding() {
        // Sequence numbers in 1-6, comment lines, a continuation, and
        // discarded columns 73-80.
        let source = "\
000100 01 REC.                                                          00010001
000200* THIS WHOLE LINE IS COMMENTARY                                   00020001
000300    05 ACCT-NO      PIC X(8).                                     00030001
000400    05 DESCRIPTION  PIC X(1                                       00040001
000500-2).                                                              00050001
000600    05 AMT          PIC S9(5) COMP-3.                             00060001
";
        let layout = parse_copybook(source).unwrap();
        assert_eq!(layout.field("ACCT-NO").unwrap().offset, 0);
        let desc = layout.field("DESCRIPTION").unwrap();
        assert_eq!(desc.offset, 8);
        assert_eq!(desc.total_width(), 12);
        assert_eq!(layout.field("AMT").unwrap().offset, 20);
        assert_eq!(layout.record_length, 23);
    }

    #[test]
    fn test_multiple_statements_one_line() {
        let layout =
            parse_copybook(&cpy("01 REC. 05 A PIC X(2). 05 B PIC X(3).")).unwrap();
        assert_eq!(layout.field("B").unwrap().offset, 2);
        assert_eq!(layout.record_length, 5);
    }

    #[test]
    fn test_value_recorded_not_interpreted() {
        let layout = parse_copybook(&cpy(
            "01 REC.\n\
             05 KIND PIC X(4) VALUE 'INIT'.\n\
             05 NEXT-FIELD PIC X(2).",
        ))
        .unwrap();
        assert_eq!(layout.field("KIND").unwrap().value.as_deref(), Some("'INIT'"));
        // The literal's period stayed inside the quote; offsets unaffected.
        assert_eq!(layout.field("NEXT-FIELD").unwrap().offset, 4);
    }

    #[test]
    fn test_group_empty_nested_rejected() {
        let err = parse_copybook(&cpy(
            "01 REC.\n\
             05 EMPTY-GROUP.\n\
             05 AFTER-X PIC X.",
        ))
        .unwrap_err();
        assert!(matches!(err, CopybookError::GroupEmpty { .. }));
    }

    #[test]
    fn test_empty_top_level_group_legal() {
        let layout = parse_copybook(&cpy("01 EMPTY-REC.")).unwrap();
        assert_eq!(layout.record_length, 0);
        assert_eq!(layout.fields.len(), 1);
    }

    #[test]
    fn test_usage_clause_forms() {
        let layout = parse_copybook(&cpy(
            "01 REC.\n\
             05 A PIC S9(4) USAGE IS COMP.\n\
             05 B PIC S9(4) COMP-3.\n\
             05 C USAGE COMP-2.",
        ))
        .unwrap();
        assert_eq!(
            layout.field("A").unwrap().physical,
            Some(PhysicalType::Binary { bytes: 2, signed: true })
        );
        assert_eq!(
            layout.field("B").unwrap().physical,
            Some(PhysicalType::PackedDecimal { digits: 4, scale: 0, signed: true })
        );
        assert_eq!(layout.field("C").unwrap().physical, Some(PhysicalType::Float8));
    }

    #[test]
    fn test_hierarchy_indices() {
        let layout = parse_copybook(&cpy(
            "01 REC.\n\
             05 HEADER.\n\
             10 H1 PIC X.\n\
             10 H2 PIC X.\n\
             05 BODY PIC X(4).",
        ))
        .unwrap();
        let header = layout.field("HEADER").unwrap();
        assert!(header.is_group());
        assert_eq!(header.children, vec![2, 3]);
        assert_eq!(layout.fields[2].parent, Some(1));
        assert_eq!(layout.field("BODY").unwrap().offset, 2);
    }

    #[test]
    fn test_render_layout_report() {
        let layout = parse_copybook(&cpy(
            "01 REC.\n\
             05 A PIC X(4).",
        ))
        .unwrap();
        let report = layout.render_layout();
        assert!(report.contains("RECORD LENGTH: 4 bytes"));
        assert!(report.contains("A"));
    }

    #[test]
    fn test_universal_width_invariant() {
        // Sum of width*occurs over elementary non-REDEFINES fields equals
        // record_length.
        let layout = parse_copybook(&cpy(
            "01 REC.\n\
             05 A PIC X(4).\n\
             05 B PIC S9(7)V99 COMP-3 OCCURS 3.\n\
             05 C REDEFINES B PIC X(15).\n\
             05 D PIC 9(4) COMP.",
        ))
        .unwrap();
        let sum: usize = layout
            .fields
            .iter()
            .filter(|f| f.is_elementary() && f.overlay_of.is_none())
            .map(|f| f.total_width())
            .sum();
        assert_eq!(sum, layout.record_length);
    }
}
