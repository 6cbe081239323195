//! Typed field paths into loosely-typed records
//!
//! Records are JSON objects whose nested fields are addressed with
//! dot notation (`payment.postdate`). A [`FieldPath`] is parsed once and then
//! used to read or write through nested objects.

use crate::types::{JsonObject, JsonValue};
use std::fmt;

/// A dot-separated path to a (possibly nested) record field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPath {
    segments: Vec<String>,
}

impl FieldPath {
    /// Parse a dot-separated path. Empty segments are ignored.
    pub fn parse(path: &str) -> Self {
        Self {
            segments: path
                .split('.')
                .filter(|s| !s.is_empty())
                .map(ToString::to_string)
                .collect(),
        }
    }

    /// Read the value at this path.
    ///
    /// Returns `None` when any segment is missing or an intermediate value is
    /// not an object.
    pub fn get<'a>(&self, record: &'a JsonObject) -> Option<&'a JsonValue> {
        let (last, parents) = self.segments.split_last()?;
        let mut current = record;
        for segment in parents {
            current = current.get(segment)?.as_object()?;
        }
        current.get(last)
    }

    /// Read the value at this path as a non-empty string
    pub fn get_str<'a>(&self, record: &'a JsonObject) -> Option<&'a str> {
        self.get(record)
            .and_then(JsonValue::as_str)
            .filter(|s| !s.is_empty())
    }

    /// Write `value` at this path, creating intermediate objects as needed.
    ///
    /// An intermediate value that is not an object (including `null`) is
    /// replaced by an empty object.
    pub fn set(&self, record: &mut JsonObject, value: JsonValue) {
        let Some((last, parents)) = self.segments.split_last() else {
            return;
        };
        let mut current = record;
        for segment in parents {
            let entry = current
                .entry(segment.clone())
                .or_insert_with(|| JsonValue::Object(JsonObject::new()));
            if !entry.is_object() {
                *entry = JsonValue::Object(JsonObject::new());
            }
            current = match entry {
                JsonValue::Object(next) => next,
                _ => return,
            };
        }
        current.insert(last.clone(), value);
    }

    /// Replace the value at this path with `f(value)` if it is present.
    ///
    /// Returns `Ok(false)` without touching the record when the path does not
    /// resolve.
    pub fn update<F, E>(&self, record: &mut JsonObject, f: F) -> Result<bool, E>
    where
        F: FnOnce(&JsonValue) -> Result<JsonValue, E>,
    {
        let Some(current) = self.get(record) else {
            return Ok(false);
        };
        let updated = f(current)?;
        self.set(record, updated);
        Ok(true)
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("."))
    }
}

impl From<&str> for FieldPath {
    fn from(path: &str) -> Self {
        Self::parse(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn object(value: JsonValue) -> JsonObject {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_get_nested() {
        let record = object(json!({"foo": {"bar": 4}}));
        assert_eq!(FieldPath::parse("foo.bar").get(&record), Some(&json!(4)));
        assert_eq!(FieldPath::parse("foo.zaz").get(&record), None);
        assert_eq!(FieldPath::parse("missing.bar").get(&record), None);
    }

    #[test]
    fn test_get_through_non_object() {
        let record = object(json!({"payment": null, "amount": 5}));
        assert_eq!(FieldPath::parse("payment.postdate").get(&record), None);
        assert_eq!(FieldPath::parse("amount.value").get(&record), None);
    }

    #[test]
    fn test_get_str_skips_empty() {
        let record = object(json!({"customerGuid": "", "other": "x"}));
        assert_eq!(FieldPath::parse("customerGuid").get_str(&record), None);
        assert_eq!(FieldPath::parse("other").get_str(&record), Some("x"));
    }

    #[test]
    fn test_set_existing_and_new() {
        let mut record = object(json!({"foo": {"bar": 4}}));

        FieldPath::parse("foo.bar").set(&mut record, json!(7));
        FieldPath::parse("foo.zaz").set(&mut record, json!(12));
        FieldPath::parse("new.deep.leaf").set(&mut record, json!("x"));

        assert_eq!(
            JsonValue::Object(record),
            json!({"foo": {"bar": 7, "zaz": 12}, "new": {"deep": {"leaf": "x"}}})
        );
    }

    #[test]
    fn test_update_only_when_present() {
        let mut record = object(json!({"payment": {"postdate": "a"}}));

        let changed = FieldPath::parse("payment.postdate")
            .update(&mut record, |_| Ok::<_, ()>(json!("b")))
            .unwrap();
        assert!(changed);
        assert_eq!(record["payment"]["postdate"], json!("b"));

        let changed = FieldPath::parse("payment.refund")
            .update(&mut record, |_| Ok::<_, ()>(json!("c")))
            .unwrap();
        assert!(!changed);
        assert!(record["payment"].get("refund").is_none());
    }

    #[test]
    fn test_display() {
        assert_eq!(FieldPath::parse("a..b.c").to_string(), "a.b.c");
    }
}
