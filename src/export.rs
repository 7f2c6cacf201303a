//! Output value serialization.
//!
//! The writer that materializes decoded records lives outside this crate,
//! but the value mapping it must follow is fixed here:
//!
//! | Logical value | JSON |
//! |---------------|------|
//! | String | string |
//! | Int | number |
//! | Decimal | string (preserves precision beyond 2^53) |
//! | Float / Double | number (NaN and infinities become null) |
//! | Date / Timestamp | ISO-8601 string |
//! | Bytes | base64 string |
//! | Bool | boolean |
//! | Array / Group | array / object |
//!
//! [`record_to_json_line`] renders one record per line (JSON-lines), and
//! [`record_to_delimited_row`] renders RFC-4180-style delimited text.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde_json::{Map, Number, Value};

use crate::types::LogicalValue;

/// Map one logical value to its JSON representation.
///
/// # Examples
///
/// ```
/// use mfd::export::to_json_value;
/// use mfd::types::{DecimalValue, LogicalValue};
///
/// let decimal = LogicalValue::Decimal(DecimalValue::new(12345, 5, 2));
/// assert_eq!(to_json_value(&decimal), serde_json::json!("123.45"));
/// assert_eq!(to_json_value(&LogicalValue::Bytes(vec![0xDE, 0xAD])), serde_json::json!("3q0="));
/// ```
pub fn to_json_value(value: &LogicalValue) -> Value {
    match value {
        LogicalValue::Null => Value::Null,
        LogicalValue::Str(s) => Value::String(s.clone()),
        LogicalValue::Int(v) => Value::Number((*v).into()),
        LogicalValue::Decimal(d) => Value::String(d.to_string()),
        LogicalValue::Float(v) => Number::from_f64(f64::from(*v)).map(Value::Number).unwrap_or(Value::Null),
        LogicalValue::Double(v) => Number::from_f64(*v).map(Value::Number).unwrap_or(Value::Null),
        LogicalValue::Bool(v) => Value::Bool(*v),
        LogicalValue::Bytes(bytes) => Value::String(BASE64.encode(bytes)),
        LogicalValue::Date(iso) | LogicalValue::Timestamp(iso) => Value::String(iso.clone()),
        LogicalValue::Array(elements) => Value::Array(elements.iter().map(to_json_value).collect()),
        LogicalValue::Group(members) => Value::Object(
            members
                .iter()
                .map(|(name, value)| (name.clone(), to_json_value(value)))
                .collect(),
        ),
    }
}

/// Render one record as a JSON-lines row.
pub fn record_to_json_line(values: &[(String, LogicalValue)]) -> String {
    let object: Map<String, Value> = values
        .iter()
        .map(|(name, value)| (name.clone(), to_json_value(value)))
        .collect();
    Value::Object(object).to_string()
}

/// Escape one value for delimited-text output.
///
/// Null renders empty, numbers render plainly, and text containing the
/// delimiter, quotes, or newlines is quoted with internal quotes doubled
/// (RFC 4180). Bytes render as base64; arrays and groups fall back to
/// their JSON rendering.
pub fn delimited_escape(value: &LogicalValue, delimiter: char) -> String {
    let raw = match value {
        LogicalValue::Null => return String::new(),
        LogicalValue::Int(v) => return v.to_string(),
        LogicalValue::Decimal(d) => return d.to_string(),
        LogicalValue::Float(v) => return v.to_string(),
        LogicalValue::Double(v) => return v.to_string(),
        LogicalValue::Bool(v) => return v.to_string(),
        LogicalValue::Bytes(bytes) => BASE64.encode(bytes),
        LogicalValue::Str(s) => s.clone(),
        LogicalValue::Date(iso) | LogicalValue::Timestamp(iso) => iso.clone(),
        nested @ (LogicalValue::Array(_) | LogicalValue::Group(_)) => {
            to_json_value(nested).to_string()
        }
    };
    if raw.contains(delimiter) || raw.contains('"') || raw.contains('\n') || raw.contains('\r') {
        format!("\"{}\"", raw.replace('"', "\"\""))
    } else {
        raw
    }
}

/// Render one record as a delimited row.
pub fn record_to_delimited_row(values: &[(String, LogicalValue)], delimiter: char) -> String {
    values
        .iter()
        .map(|(_, value)| delimited_escape(value, delimiter))
        .collect::<Vec<_>>()
        .join(&delimiter.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DecimalValue;

    #[test]
    fn test_json_mapping() {
        assert_eq!(to_json_value(&LogicalValue::Null), Value::Null);
        assert_eq!(to_json_value(&LogicalValue::Int(-42)), serde_json::json!(-42));
        assert_eq!(
            to_json_value(&LogicalValue::Decimal(DecimalValue::new(-123, 5, 2))),
            serde_json::json!("-1.23")
        );
        assert_eq!(to_json_value(&LogicalValue::Bool(true)), serde_json::json!(true));
        assert_eq!(
            to_json_value(&LogicalValue::Date("2024-07-01".into())),
            serde_json::json!("2024-07-01")
        );
        assert_eq!(to_json_value(&LogicalValue::Double(f64::NAN)), Value::Null);
    }

    #[test]
    fn test_decimal_precision_preserved() {
        // 19 digits would lose precision as a JSON number.
        let wide = LogicalValue::Decimal(DecimalValue::new(9_007_199_254_740_993_111, 19, 0));
        assert_eq!(to_json_value(&wide), serde_json::json!("9007199254740993111"));
    }

    #[test]
    fn test_bytes_base64() {
        assert_eq!(
            to_json_value(&LogicalValue::Bytes(vec![0x00, 0x01, 0x02])),
            serde_json::json!("AAEC")
        );
    }

    #[test]
    fn test_json_line() {
        let values = vec![
            ("ID".to_string(), LogicalValue::Int(7)),
            ("NM".to_string(), LogicalValue::Str("ACME".into())),
        ];
        let line = record_to_json_line(&values);
        let parsed: Value = serde_json::from_str(&line).unwrap();
        assert_eq!(parsed["ID"], serde_json::json!(7));
        assert_eq!(parsed["NM"], serde_json::json!("ACME"));
        assert!(!line.contains('\n'));
    }

    #[test]
    fn test_nested_json() {
        let group = LogicalValue::Group(vec![
            ("A".to_string(), LogicalValue::Int(1)),
            (
                "B".to_string(),
                LogicalValue::Array(vec![LogicalValue::Int(2), LogicalValue::Null]),
            ),
        ]);
        assert_eq!(to_json_value(&group), serde_json::json!({"A": 1, "B": [2, null]}));
    }

    #[test]
    fn test_delimited_escaping() {
        assert_eq!(delimited_escape(&LogicalValue::Null, ','), "");
        assert_eq!(delimited_escape(&LogicalValue::Int(5), ','), "5");
        assert_eq!(delimited_escape(&LogicalValue::Str("plain".into()), ','), "plain");
        assert_eq!(
            delimited_escape(&LogicalValue::Str("a,b".into()), ','),
            "\"a,b\""
        );
        assert_eq!(
            delimited_escape(&LogicalValue::Str("say \"hi\"".into()), ','),
            "\"say \"\"hi\"\"\""
        );
        // Pipe-delimited output only quotes on pipes.
        assert_eq!(delimited_escape(&LogicalValue::Str("a,b".into()), '|'), "a,b");
    }

    #[test]
    fn test_delimited_row() {
        let values = vec![
            ("A".to_string(), LogicalValue::Int(1)),
            ("B".to_string(), LogicalValue::Str("x,y".into())),
            ("C".to_string(), LogicalValue::Null),
        ];
        assert_eq!(record_to_delimited_row(&values, ','), "1,\"x,y\",");
    }
}
