//! Flattening of structured property bags into text key/value entries.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::catalog::Properties;
use crate::error::ExportError;

/// Key of the single entry produced in [`PropertyMode::Json`].
pub const PROPERTIES_KEY: &str = "properties";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyMode {
    /// One `"properties"` entry holding the whole bag as compact JSON.
    #[default]
    Json,
    /// One entry per top-level key. Strings are stored verbatim, everything
    /// else as compact JSON.
    Flat,
}

/// Serializes `properties` into entries for a group or channel.
///
/// `None` produces no entries at all. Output is stable: keys come out in the
/// map's sorted order and JSON is rendered without whitespace.
pub fn serialize_properties(
    properties: Option<&Properties>,
    mode: PropertyMode,
) -> Result<Vec<(String, String)>, ExportError> {
    let Some(properties) = properties else {
        return Ok(Vec::new());
    };

    match mode {
        PropertyMode::Json => {
            let text = serde_json::to_string(properties)?;
            Ok(vec![(PROPERTIES_KEY.to_string(), text)])
        }
        PropertyMode::Flat => properties
            .iter()
            .map(|(key, value)| {
                let text = match value {
                    Value::String(s) => s.clone(),
                    other => serde_json::to_string(other)?,
                };
                Ok((key.clone(), text))
            })
            .collect(),
    }
}

/// Reverses [`PropertyMode::Json`] serialization from stored entries.
pub fn deserialize_properties(entries: &[(String, String)]) -> Result<Option<Properties>, ExportError> {
    match entries.iter().find(|(k, _)| k == PROPERTIES_KEY) {
        Some((_, text)) => Ok(Some(serde_json::from_str(text)?)),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn bag(value: Value) -> Properties {
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[test]
    fn no_bag_means_no_entries() {
        assert!(serialize_properties(None, PropertyMode::Json).unwrap().is_empty());
        assert!(serialize_properties(None, PropertyMode::Flat).unwrap().is_empty());
    }

    #[test]
    fn json_mode_is_stable() {
        let a = bag(json!({ "b": [1, 2], "a": { "x": "y" } }));
        let b = bag(json!({ "a": { "x": "y" }, "b": [1, 2] }));
        let first = serialize_properties(Some(&a), PropertyMode::Json).unwrap();
        let second = serialize_properties(Some(&b), PropertyMode::Json).unwrap();
        assert_eq!(first, second);
        assert_eq!(first[0].1, r#"{"a":{"x":"y"},"b":[1,2]}"#);
    }

    #[test]
    fn json_mode_round_trips() {
        let original = bag(json!({ "unit": "°C", "limits": { "min": -40, "max": 125.5 } }));
        let entries = serialize_properties(Some(&original), PropertyMode::Json).unwrap();
        assert_eq!(deserialize_properties(&entries).unwrap(), Some(original));
    }

    #[test]
    fn flat_mode_keeps_strings_verbatim() {
        let properties = bag(json!({ "unit": "V", "gain": 2.5, "tags": ["x"] }));
        let entries = serialize_properties(Some(&properties), PropertyMode::Flat).unwrap();
        assert_eq!(
            entries,
            vec![
                ("gain".to_string(), "2.5".to_string()),
                ("tags".to_string(), r#"["x"]"#.to_string()),
                ("unit".to_string(), "V".to_string()),
            ]
        );
    }
}
