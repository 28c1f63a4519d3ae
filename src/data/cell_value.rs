//! Value formatting, coercion and ordering for grid cells
//!
//! Cells hold `serde_json::Value`s. Filters work on a stringified form,
//! the clipboard on a spreadsheet-compatible form, and sorting on a total
//! order across mixed types.

use serde_json::{Number, Value};
use std::cmp::Ordering;

use crate::data::column::ColumnKind;

/// Stringify a value for display and filtering. Null renders empty.
pub fn display_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Array(items) => items
            .iter()
            .map(display_text)
            .collect::<Vec<_>>()
            .join(", "),
        Value::Object(_) => value.to_string(),
    }
}

/// Format a value for tab-separated clipboard text.
/// Booleans become `TRUE`/`FALSE`; tabs and line breaks are flattened so the
/// cell stays in place.
pub fn clipboard_text(value: &Value) -> String {
    match value {
        Value::Bool(true) => "TRUE".to_string(),
        Value::Bool(false) => "FALSE".to_string(),
        other => display_text(other)
            .replace('\t', " ")
            .replace("\r\n", " ")
            .replace(['\n', '\r'], " "),
    }
}

/// Null, blank strings and empty arrays count as empty
pub fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

/// Turn pasted text into a typed cell value for a column of `kind`
pub fn coerce_pasted(text: &str, kind: ColumnKind) -> Value {
    if text.eq_ignore_ascii_case("true") {
        return Value::Bool(true);
    }
    if text.eq_ignore_ascii_case("false") {
        return Value::Bool(false);
    }

    match kind {
        ColumnKind::Numeric => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                return Value::Null;
            }
            if let Ok(i) = trimmed.parse::<i64>() {
                return Value::Number(i.into());
            }
            // Non-integers are kept verbatim so nothing pasted is lost
            Value::String(text.to_string())
        }
        ColumnKind::Checkbox if text.trim().is_empty() => Value::Bool(false),
        _ => Value::String(text.to_string()),
    }
}

fn type_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}

fn compare_numbers(a: &Number, b: &Number) -> Ordering {
    match (a.as_i64(), b.as_i64()) {
        (Some(a), Some(b)) => a.cmp(&b),
        _ => {
            let a = a.as_f64().unwrap_or(f64::NAN);
            let b = b.as_f64().unwrap_or(f64::NAN);
            a.partial_cmp(&b).unwrap_or(Ordering::Equal)
        }
    }
}

/// Total order used by sorting.
/// Order across types: Null < Boolean < Number < String < Array < Object.
/// Strings compare case-insensitively, ties broken by exact comparison.
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
        (Value::Number(a), Value::Number(b)) => compare_numbers(a, b),
        (Value::String(a), Value::String(b)) => a
            .to_lowercase()
            .cmp(&b.to_lowercase())
            .then_with(|| a.cmp(b)),
        (Value::Array(_), Value::Array(_)) | (Value::Object(_), Value::Object(_)) => {
            display_text(a).cmp(&display_text(b))
        }
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}

/// Compare optional values; a missing field sorts with null
pub fn compare_optional_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    compare_values(a.unwrap_or(&Value::Null), b.unwrap_or(&Value::Null))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_clipboard_text_uses_spreadsheet_booleans() {
        assert_eq!(clipboard_text(&json!(true)), "TRUE");
        assert_eq!(clipboard_text(&json!(false)), "FALSE");
        assert_eq!(clipboard_text(&Value::Null), "");
        assert_eq!(clipboard_text(&json!(42)), "42");
        assert_eq!(clipboard_text(&json!("a\tb\nc")), "a b c");
    }

    #[test]
    fn test_coerce_pasted_values() {
        assert_eq!(coerce_pasted("TRUE", ColumnKind::Text), json!(true));
        assert_eq!(coerce_pasted("false", ColumnKind::Dropdown), json!(false));
        assert_eq!(coerce_pasted("17", ColumnKind::Numeric), json!(17));
        assert_eq!(coerce_pasted("17", ColumnKind::Text), json!("17"));
        assert_eq!(coerce_pasted("1.5", ColumnKind::Numeric), json!("1.5"));
        assert_eq!(coerce_pasted("", ColumnKind::Numeric), Value::Null);
        assert_eq!(coerce_pasted("", ColumnKind::Checkbox), json!(false));
    }

    #[test]
    fn test_compare_values_ordering() {
        assert_eq!(compare_values(&json!(1), &json!(2)), Ordering::Less);
        assert_eq!(compare_values(&json!(2.5), &json!(2)), Ordering::Greater);
        assert_eq!(compare_values(&json!("apple"), &json!("Banana")), Ordering::Less);
        assert_eq!(compare_values(&Value::Null, &json!(false)), Ordering::Less);
        assert_eq!(compare_values(&json!(10), &json!("10")), Ordering::Less);
        assert_eq!(
            compare_optional_values(None, Some(&json!("x"))),
            Ordering::Less
        );
    }

    #[test]
    fn test_empty_values() {
        assert!(is_empty_value(&Value::Null));
        assert!(is_empty_value(&json!("  ")));
        assert!(is_empty_value(&json!([])));
        assert!(!is_empty_value(&json!(0)));
        assert!(!is_empty_value(&json!(false)));
    }
}
