//! Integration tests for copybook parsing and layout construction.

use mfd::cobol::copybook::{parse_copybook, parse_copybook_with, CopybookError, CopybookOptions};
use mfd::cobol::codepage::CodePage;
use mfd::schema::logical_schema_of_layout;
use mfd::types::{LogicalType, PhysicalType};

/// Indent body lines into area B (column 8+).
fn cpy(body: &str) -> String {
    body.lines().map(|l| format!("       {l}")).collect::<Vec<_>>().join("\n")
}

const CUSTOMER: &str = "\
01 CUSTOMER-RECORD.
   05 CUST-KEY.
      10 CUST-ID        PIC 9(9).
      10 CUST-REGION    PIC X(2).
   05 CUST-NAME         PIC X(30).
   05 CUST-SINCE        PIC X(8).
   05 CUST-SINCE-PARTS REDEFINES CUST-SINCE.
      10 SINCE-YEAR     PIC 9(4).
      10 SINCE-MONTH    PIC 9(2).
      10 SINCE-DAY      PIC 9(2).
   05 BALANCE           PIC S9(9)V99 COMP-3.
   05 CREDIT-LIMIT      PIC S9(7) COMP.
   05 MONTH-TOTAL       PIC S9(5)V99 COMP-3 OCCURS 12.
   05 FILLER            PIC X(5).";

#[test]
fn customer_record_offsets() {
    let layout = parse_copybook(&cpy(CUSTOMER)).unwrap();

    assert_eq!(layout.field("CUST-ID").unwrap().offset, 0);
    assert_eq!(layout.field("CUST-REGION").unwrap().offset, 9);
    assert_eq!(layout.field("CUST-NAME").unwrap().offset, 11);
    assert_eq!(layout.field("CUST-SINCE").unwrap().offset, 41);

    // The redefinition overlays CUST-SINCE without advancing the cursor.
    assert_eq!(layout.field("SINCE-YEAR").unwrap().offset, 41);
    assert_eq!(layout.field("SINCE-MONTH").unwrap().offset, 45);
    assert_eq!(layout.field("SINCE-DAY").unwrap().offset, 47);

    assert_eq!(layout.field("BALANCE").unwrap().offset, 49);
    // S9(9)V99 COMP-3: 11 digits -> 6 bytes.
    assert_eq!(layout.field("CREDIT-LIMIT").unwrap().offset, 55);
    // S9(7) COMP: 4 bytes.
    assert_eq!(layout.field("MONTH-TOTAL").unwrap().offset, 59);
    // 12 * 4 bytes of packed S9(5)V99.
    assert_eq!(layout.field("FILLER").unwrap().offset, 107);
    assert_eq!(layout.record_length, 112);
}

#[test]
fn width_sum_matches_record_length() {
    let layout = parse_copybook(&cpy(CUSTOMER)).unwrap();
    let sum: usize = layout
        .fields
        .iter()
        .filter(|f| f.is_elementary() && f.overlay_of.is_none())
        .map(|f| f.total_width())
        .sum();
    assert_eq!(sum, layout.record_length);
}

#[test]
fn redefines_cursor_law() {
    // Cursor after the overlay pair equals cursor after the redefined
    // field alone: BALANCE starts right after CUST-SINCE's region.
    let layout = parse_copybook(&cpy(CUSTOMER)).unwrap();
    let since = layout.field("CUST-SINCE").unwrap();
    let balance = layout.field("BALANCE").unwrap();
    assert_eq!(balance.offset, since.offset + since.total_width());
}

#[test]
fn logical_schema_shape() {
    let layout = parse_copybook(&cpy(CUSTOMER)).unwrap();
    let schema = logical_schema_of_layout(&layout);

    // Groups and FILLER are not part of the schema.
    assert!(schema.iter().all(|c| c.name != "CUST-KEY" && c.name != "FILLER"));

    let by_name = |name: &str| schema.iter().find(|c| c.name == name).unwrap();
    assert_eq!(by_name("CUST-ID").logical, LogicalType::Int32);
    assert_eq!(by_name("CUST-NAME").logical, LogicalType::String);
    assert_eq!(
        by_name("BALANCE").logical,
        LogicalType::Decimal { precision: 11, scale: 2 }
    );
    assert_eq!(by_name("CREDIT-LIMIT").logical, LogicalType::Int32);
}

#[test]
fn alternate_codec_flows_into_text_fields() {
    let options = CopybookOptions { codec: CodePage::Cp1047, lenient_pics: false };
    let layout = parse_copybook_with(&cpy("01 R.\n05 T PIC X(4)."), &options).unwrap();
    assert_eq!(
        layout.field("T").unwrap().physical,
        Some(PhysicalType::Text { length: 4, codec: CodePage::Cp1047 })
    );
}

#[test]
fn lenient_pictures_degrade_to_text() {
    let source = cpy("01 R.\n05 E PIC ZZ9V99.\n05 F PIC X(3).");
    assert!(matches!(
        parse_copybook(&source),
        Err(CopybookError::Pic { .. })
    ));

    let options = CopybookOptions { codec: CodePage::default(), lenient_pics: true };
    let layout = parse_copybook_with(&source, &options).unwrap();
    // Best-effort storage estimate for the edited picture.
    let e = layout.field("E").unwrap();
    assert!(matches!(e.physical, Some(PhysicalType::Text { .. })));
    assert_eq!(layout.field("F").unwrap().offset, e.total_width());
}

#[test]
fn record_length_check() {
    let layout = parse_copybook(&cpy(CUSTOMER)).unwrap();
    assert!(layout.check_record_length(112).is_none());
    let warning = layout.check_record_length(120).unwrap();
    assert!(warning.to_string().contains("120"));
    assert!(warning.to_string().contains("112"));
}

#[test]
fn render_layout_lists_every_field() {
    let layout = parse_copybook(&cpy(CUSTOMER)).unwrap();
    let report = layout.render_layout();
    for field in &layout.fields {
        assert!(report.contains(&field.name), "missing {}", field.name);
    }
    assert!(report.contains("RECORD LENGTH: 112 bytes"));
    assert!(report.contains("OCCURS 12"));
    assert!(report.contains("REDEFINES CUST-SINCE"));
}

#[test]
fn serializes_to_json() {
    let layout = parse_copybook(&cpy("01 R.\n05 A PIC S9(3) COMP-3.")).unwrap();
    let json = serde_json::to_value(&layout).unwrap();
    assert_eq!(json["record_length"], serde_json::json!(2));
    assert_eq!(json["fields"][1]["physical"]["kind"], serde_json::json!("packed_decimal"));
    assert_eq!(json["fields"][1]["physical"]["digits"], serde_json::json!(3));
}
