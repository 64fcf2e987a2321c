//! Forgiving deserializers for fields of older or partially corrupt documents.
//!
//! A bad element or field is logged and dropped so its siblings survive.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// A list where elements that fail to parse are skipped.
///
/// Anything other than an array (including `null`) reads as an empty list.
pub(crate) fn records<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    let items = match value {
        Value::Array(items) => items,
        Value::Null => return Ok(Vec::new()),
        other => {
            log::warn!("Expected a record list, found {}; treating as empty", kind_of(&other));
            return Ok(Vec::new());
        }
    };

    let mut out = Vec::with_capacity(items.len());
    for (i, item) in items.into_iter().enumerate() {
        let id = item.get("id").and_then(Value::as_str).map(str::to_owned);
        match serde_json::from_value(item) {
            Ok(record) => out.push(record),
            Err(e) => log::warn!(
                "Dropping unreadable record #{} ({}): {}",
                i,
                id.as_deref().unwrap_or("no id"),
                e
            ),
        }
    }
    Ok(out)
}

/// An optional field where a malformed value reads as absent.
pub(crate) fn optional<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    if value.is_null() {
        return Ok(None);
    }
    match serde_json::from_value(value) {
        Ok(v) => Ok(Some(v)),
        Err(e) => {
            log::warn!("Ignoring malformed optional field: {}", e);
            Ok(None)
        }
    }
}

/// A field where a malformed value reads as the type's default.
pub(crate) fn or_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    match serde_json::from_value(value) {
        Ok(v) => Ok(v),
        Err(e) => {
            log::warn!("Malformed field replaced by its default: {}", e);
            Ok(T::default())
        }
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
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Item {
        id: String,
        n: u32,
    }

    #[derive(Debug, Deserialize)]
    struct Holder {
        #[serde(default, deserialize_with = "records")]
        items: Vec<Item>,
        #[serde(default, deserialize_with = "optional")]
        extra: Option<Item>,
    }

    #[test]
    fn test_bad_elements_dropped() {
        let holder: Holder = serde_json::from_str(
            r#"{"items": [{"id": "a", "n": 1}, {"id": "b", "n": "x"}, {"id": "c", "n": 3}]}"#,
        )
        .unwrap();
        let ids: Vec<_> = holder.items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, ["a", "c"]);
    }

    #[test]
    fn test_non_array_reads_empty() {
        let holder: Holder = serde_json::from_str(r#"{"items": 5}"#).unwrap();
        assert!(holder.items.is_empty());
        let holder: Holder = serde_json::from_str(r#"{"items": null}"#).unwrap();
        assert!(holder.items.is_empty());
    }

    #[test]
    fn test_malformed_optional_is_none() {
        let holder: Holder = serde_json::from_str(r#"{"extra": {"id": 1}}"#).unwrap();
        assert!(holder.extra.is_none());
        let holder: Holder = serde_json::from_str(r#"{"extra": {"id": "z", "n": 2}}"#).unwrap();
        assert_eq!(holder.extra, Some(Item { id: "z".into(), n: 2 }));
    }
}
