use chrono::NaiveDateTime;
use serde_json::Value;

use crate::error::ArchiveError;

/// Written for any payload key that is absent.
pub const MISSING: &str = "N/A";

/// Header written to an empty sheet. Column order matches [`LogRow`].
pub const HEADER: [&str; 7] = [
    "Log ID",
    "Timestamp",
    "Type",
    "Item Name",
    "Action",
    "Location",
    "System Sync",
];

/// Payload keys looked up in column order; the seventh column is the sync time.
pub const FIELDS: [&str; 6] = ["log_id", "timestamp", "type", "item_name", "action", "location"];

const SYNC_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One normalized sheet row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRow([String; 7]);

impl LogRow {
    /// Map a parsed payload onto the fixed column layout.
    ///
    /// `now` becomes the System Sync column and is independent of any
    /// `timestamp` the device embedded in the payload.
    pub fn from_payload(payload: &Value, now: NaiveDateTime) -> Result<Self, ArchiveError> {
        let map = match payload {
            Value::Object(map) => map,
            Value::Array(items) => {
                return Err(ArchiveError::MalformedPayload(format!(
                    "expected a JSON object, got an array of {} item(s)",
                    items.len()
                )))
            }
            other => {
                return Err(ArchiveError::MalformedPayload(format!(
                    "expected a JSON object, got {}",
                    kind_of(other)
                )))
            }
        };

        let field = |key: &str| match map.get(key) {
            Some(value) => cell_text(value),
            None => MISSING.to_string(),
        };

        Ok(Self([
            field(FIELDS[0]),
            field(FIELDS[1]),
            field(FIELDS[2]),
            field(FIELDS[3]),
            field(FIELDS[4]),
            field(FIELDS[5]),
            now.format(SYNC_FORMAT).to_string(),
        ]))
    }

    pub fn cells(&self) -> &[String] {
        &self.0
    }

    pub fn log_id(&self) -> &str {
        &self.0[0]
    }

    /// Item name for status lines.
    pub fn item_label(&self) -> &str {
        match self.0[3].as_str() {
            MISSING => "Unknown",
            name => name,
        }
    }
}

/// Header as owned cells, ready for [`crate::sheets::SheetBackend::append_row`].
pub fn header_cells() -> Vec<String> {
    HEADER.iter().map(|h| h.to_string()).collect()
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::json;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 3, 14)
            .unwrap()
            .and_hms_opt(9, 5, 7)
            .unwrap()
    }

    #[test]
    fn test_missing_fields_become_sentinel() {
        let payload = json!({"log_id": "A1", "item_name": "Widget", "action": "IN"});
        let row = LogRow::from_payload(&payload, now()).unwrap();
        assert_eq!(
            row.cells(),
            ["A1", "N/A", "N/A", "Widget", "IN", "N/A", "2026-03-14 09:05:07"]
        );
    }

    #[test]
    fn test_empty_object_fills_every_field() {
        let row = LogRow::from_payload(&json!({}), now()).unwrap();
        assert_eq!(row.cells().len(), 7);
        assert!(row.cells()[..6].iter().all(|c| c == MISSING));
        assert_eq!(row.item_label(), "Unknown");
    }

    #[test]
    fn test_full_payload_keeps_column_order() {
        let payload = json!({
            "location": "Shelf 4",
            "action": "OUT",
            "item_name": "Bolt",
            "type": "hardware",
            "timestamp": "2026-03-14T08:00:00Z",
            "log_id": "L-77",
            "extra": "ignored"
        });
        let row = LogRow::from_payload(&payload, now()).unwrap();
        assert_eq!(
            row.cells(),
            [
                "L-77",
                "2026-03-14T08:00:00Z",
                "hardware",
                "Bolt",
                "OUT",
                "Shelf 4",
                "2026-03-14 09:05:07"
            ]
        );
        assert_eq!(row.log_id(), "L-77");
        assert_eq!(row.item_label(), "Bolt");
    }

    #[test]
    fn test_non_string_values_are_coerced() {
        let payload = json!({"log_id": 42, "type": true, "location": null, "item_name": {"sku": 9}});
        let row = LogRow::from_payload(&payload, now()).unwrap();
        assert_eq!(row.cells()[0], "42");
        assert_eq!(row.cells()[2], "true");
        assert_eq!(row.cells()[3], r#"{"sku":9}"#);
        assert_eq!(row.cells()[5], "");
    }

    #[test]
    fn test_array_root_is_malformed() {
        let err = LogRow::from_payload(&json!([{"log_id": "A1"}]), now()).unwrap_err();
        assert!(matches!(err, ArchiveError::MalformedPayload(_)));
        assert!(err.to_string().contains("array"));
    }

    #[test]
    fn test_scalar_root_is_malformed() {
        let err = LogRow::from_payload(&json!("just text"), now()).unwrap_err();
        assert!(matches!(err, ArchiveError::MalformedPayload(_)));
    }

    #[test]
    fn test_header_matches_row_width() {
        assert_eq!(header_cells().len(), FIELDS.len() + 1);
        assert_eq!(header_cells()[6], "System Sync");
    }
}
