//! Raw booking records as they arrive from the CSV file or the HTTP endpoint.
//!
//! A [`RawRecord`] is a flat, ordered mapping of field names to [`FieldValue`]s.
//! It carries no schema of its own: which fields are required, numeric or
//! categorical is decided by the feature recipe in
//! [`crate::preprocessing::features`].

use crate::preprocessing::error::PreprocessingError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

pub const BOOKING_ID: &str = "Booking_ID";
pub const BOOKING_STATUS: &str = "booking_status";

pub const NO_OF_ADULTS: &str = "no_of_adults";
pub const NO_OF_CHILDREN: &str = "no_of_children";
pub const NO_OF_WEEK_NIGHTS: &str = "no_of_week_nights";
pub const NO_OF_WEEKEND_NIGHTS: &str = "no_of_weekend_nights";
pub const TOTAL_NIGHTS: &str = "total_nights";
pub const LEAD_TIME: &str = "lead_time";
pub const AVG_PRICE_PER_ROOM: &str = "avg_price_per_room";
pub const ROOM_TYPE_RESERVED: &str = "room_type_reserved";
pub const TYPE_OF_MEAL_PLAN: &str = "type_of_meal_plan";
pub const MARKET_SEGMENT_TYPE: &str = "market_segment_type";
pub const REPEATED_GUEST: &str = "repeated_guest";
pub const NO_OF_SPECIAL_REQUESTS: &str = "no_of_special_requests";

/// A single field value: either numeric or free text.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum FieldValue {
    Number(f64),
    Text(String),
}

impl FieldValue {
    /// Parse a CSV cell: anything that reads as a float is numeric.
    pub fn parse(cell: &str) -> Self {
        let trimmed = cell.trim();
        match trimmed.parse::<f64>() {
            Ok(v) => FieldValue::Number(v),
            Err(_) => FieldValue::Text(trimmed.to_string()),
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Number(v) => Some(*v),
            FieldValue::Text(_) => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Number(v) => write!(f, "{}", v),
            FieldValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        FieldValue::Number(v)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        FieldValue::Text(v.to_string())
    }
}

/// One booking as a flat set of named fields.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    fields: BTreeMap<String, FieldValue>,
}

impl RawRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert, handy for tests and fixtures.
    pub fn with(mut self, name: &str, value: impl Into<FieldValue>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: &str, value: impl Into<FieldValue>) {
        self.fields.insert(name.to_string(), value.into());
    }

    pub fn remove(&mut self, name: &str) -> Option<FieldValue> {
        self.fields.remove(name)
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Build a record from a JSON object.
    ///
    /// Numbers and strings map directly, booleans become `1.0`/`0.0` and
    /// `null` is treated as an absent field. Nested arrays or objects are
    /// rejected with the offending field name.
    pub fn from_json(value: &serde_json::Value) -> Result<Self, PreprocessingError> {
        let object = value.as_object().ok_or_else(|| {
            PreprocessingError::MalformedRecord("expected a JSON object".to_string())
        })?;

        let mut record = RawRecord::new();
        for (name, v) in object {
            match v {
                serde_json::Value::Null => {}
                serde_json::Value::Bool(b) => record.insert(name, if *b { 1.0 } else { 0.0 }),
                serde_json::Value::Number(n) => {
                    let x = n.as_f64().ok_or_else(|| PreprocessingError::InvalidValue {
                        field: name.clone(),
                        reason: format!("{} is not representable as f64", n),
                    })?;
                    record.insert(name, x);
                }
                serde_json::Value::String(s) => record.insert(name, s.as_str()),
                serde_json::Value::Array(_) | serde_json::Value::Object(_) => {
                    return Err(PreprocessingError::InvalidType {
                        field: name.clone(),
                        expected: "number or string",
                    })
                }
            }
        }
        Ok(record)
    }
}

impl FromIterator<(String, FieldValue)> for RawRecord {
    fn from_iter<I: IntoIterator<Item = (String, FieldValue)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_cell_numeric_and_text() {
        assert_eq!(FieldValue::parse("42"), FieldValue::Number(42.0));
        assert_eq!(FieldValue::parse(" 65.5 "), FieldValue::Number(65.5));
        assert_eq!(
            FieldValue::parse("Room_Type 1"),
            FieldValue::Text("Room_Type 1".to_string())
        );
    }

    #[test]
    fn test_from_json_maps_scalars() {
        let record = RawRecord::from_json(&json!({
            "lead_time": 5,
            "market_segment_type": "Online",
            "repeated_guest": false,
            "no_of_children": null
        }))
        .unwrap();

        assert_eq!(record.get("lead_time"), Some(&FieldValue::Number(5.0)));
        assert_eq!(
            record.get("market_segment_type"),
            Some(&FieldValue::Text("Online".to_string()))
        );
        assert_eq!(record.get("repeated_guest"), Some(&FieldValue::Number(0.0)));
        assert!(!record.contains("no_of_children"));
    }

    #[test]
    fn test_from_json_rejects_non_object() {
        let err = RawRecord::from_json(&json!([1, 2, 3])).unwrap_err();
        assert!(matches!(err, PreprocessingError::MalformedRecord(_)));
    }

    #[test]
    fn test_from_json_rejects_nested_value() {
        let err = RawRecord::from_json(&json!({ "lead_time": [1] })).unwrap_err();
        match err {
            PreprocessingError::InvalidType { field, .. } => assert_eq!(field, "lead_time"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_display_number_renders_integers_plainly() {
        assert_eq!(FieldValue::Number(1.0).to_string(), "1");
        assert_eq!(FieldValue::Number(2.5).to_string(), "2.5");
    }
}
