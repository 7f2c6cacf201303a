//! Logical schema unification.
//!
//! Produces one consumer-facing schema regardless of whether the dataset
//! was described by a COBOL copybook or a DB2 table definition. Downstream
//! writers consume the `[(name, LogicalType, nullable)]` shape and never
//! see mainframe physical types.

use serde::Serialize;

use crate::cobol::copybook::Layout;
use crate::db2::ddl::TableDef;
use crate::types::LogicalType;

/// One column of the unified logical schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnSchema {
    /// Canonical column name.
    pub name: String,
    /// Logical type.
    pub logical: LogicalType,
    /// Whether the column may be null in the output.
    pub nullable: bool,
}

/// Logical schema of a copybook layout: elementary, non-FILLER fields in
/// layout order. Columns are nullable because lenient decoding substitutes
/// null for undecodable fields.
///
/// # Examples
///
/// ```
/// use mfd::cobol::copybook::parse_copybook;
/// use mfd::schema::logical_schema_of_layout;
/// use mfd::types::LogicalType;
///
/// let layout = parse_copybook(
///     "       01 REC.\n          05 ID  PIC 9(9).\n          05 NM  PIC X(20).\n",
/// )
/// .unwrap();
/// let schema = logical_schema_of_layout(&layout);
/// assert_eq!(schema[0].logical, LogicalType::Int32);
/// assert_eq!(schema[1].logical, LogicalType::String);
/// ```
pub fn logical_schema_of_layout(layout: &Layout) -> Vec<ColumnSchema> {
    layout
        .fields
        .iter()
        .filter(|field| !field.filler)
        .filter_map(|field| {
            field.physical.map(|physical| ColumnSchema {
                name: field.name.clone(),
                logical: physical.logical_type(),
                nullable: true,
            })
        })
        .collect()
}

/// Logical schema of a DB2 table definition; nullability follows NOT NULL.
pub fn logical_schema_of_table(table: &TableDef) -> Vec<ColumnSchema> {
    table
        .columns
        .iter()
        .map(|column| ColumnSchema {
            name: column.name.clone(),
            logical: column.logical,
            nullable: column.nullable,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cobol::copybook::parse_copybook;
    use crate::db2::ddl::parse_ddl;

    fn cpy(body: &str) -> String {
        body.lines().map(|l| format!("       {l}")).collect::<Vec<_>>().join("\n")
    }

    #[test]
    fn test_layout_schema() {
        let layout = parse_copybook(&cpy(
            "01 REC.\n\
             05 ID      PIC 9(9).\n\
             05 FILLER  PIC X(4).\n\
             05 AMT     PIC S9(7)V99 COMP-3.\n\
             05 FLAGS   PIC X(2).",
        ))
        .unwrap();
        let schema = logical_schema_of_layout(&layout);
        assert_eq!(schema.len(), 3);
        assert_eq!(schema[0].name, "ID");
        assert_eq!(schema[0].logical, LogicalType::Int32);
        assert_eq!(schema[1].logical, LogicalType::Decimal { precision: 9, scale: 2 });
        assert!(schema.iter().all(|c| c.nullable));
    }

    #[test]
    fn test_table_schema() {
        let table = parse_ddl(
            "CREATE TABLE S.T (K INTEGER NOT NULL, V DECIMAL(15,2), PRIMARY KEY(K))",
        )
        .unwrap();
        let schema = logical_schema_of_table(&table);
        assert_eq!(
            schema,
            vec![
                ColumnSchema { name: "K".into(), logical: LogicalType::Int32, nullable: false },
                ColumnSchema {
                    name: "V".into(),
                    logical: LogicalType::Decimal { precision: 15, scale: 2 },
                    nullable: true,
                },
            ]
        );
    }

    #[test]
    fn test_groups_not_in_schema() {
        let layout = parse_copybook(&cpy(
            "01 REC.\n\
             05 HEADER.\n\
             10 H1 PIC X.\n\
             05 BODY PIC X.",
        ))
        .unwrap();
        let schema = logical_schema_of_layout(&layout);
        let names: Vec<&str> = schema.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["H1", "BODY"]);
    }
}
