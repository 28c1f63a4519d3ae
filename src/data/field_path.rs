//! Typed accessor for (possibly nested) row fields
//!
//! Rows arrive as JSON objects and some columns address nested members such
//! as `fabric_details.name`. A `FieldPath` holds the parsed key list so reads
//! and writes never re-split strings at the call site.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldPath {
    keys: Vec<String>,
}

impl FieldPath {
    /// Parse a dot-delimited accessor. Empty segments are ignored.
    pub fn parse(accessor: &str) -> Self {
        Self {
            keys: accessor
                .split('.')
                .filter(|segment| !segment.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }

    pub fn from_keys<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keys: keys.into_iter().map(Into::into).collect(),
        }
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// True for the top-level `id` field
    pub fn is_id(&self) -> bool {
        self.keys.len() == 1 && self.keys[0] == "id"
    }

    /// Read the value at this path, if every segment resolves
    pub fn get<'a>(&self, object: &'a Map<String, Value>) -> Option<&'a Value> {
        let (first, rest) = self.keys.split_first()?;
        let mut current = object.get(first)?;
        for key in rest {
            current = current.as_object()?.get(key)?;
        }
        Some(current)
    }

    /// Write `value` at this path, creating intermediate objects as needed.
    /// A non-object intermediate value is replaced by an object.
    /// Returns the previous value, if any.
    pub fn set(&self, object: &mut Map<String, Value>, value: Value) -> Option<Value> {
        let (last, parents) = self.keys.split_last()?;
        let mut current = object;
        for key in parents {
            let entry = current
                .entry(key.clone())
                .or_insert_with(|| Value::Object(Map::new()));
            if !entry.is_object() {
                *entry = Value::Object(Map::new());
            }
            current = match entry {
                Value::Object(map) => map,
                _ => return None,
            };
        }
        current.insert(last.clone(), value)
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.keys.join("."))
    }
}

impl From<&str> for FieldPath {
    fn from(accessor: &str) -> Self {
        Self::parse(accessor)
    }
}

impl Serialize for FieldPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for FieldPath {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let accessor = String::deserialize(deserializer)?;
        Ok(Self::parse(&accessor))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_get_nested_value() {
        let row = object(json!({"fabric_details": {"name": "FAB-A"}, "name": "alias1"}));
        let path = FieldPath::parse("fabric_details.name");
        assert_eq!(path.get(&row), Some(&json!("FAB-A")));
        assert_eq!(FieldPath::parse("name").get(&row), Some(&json!("alias1")));
        assert_eq!(FieldPath::parse("fabric_details.missing").get(&row), None);
        assert_eq!(FieldPath::parse("name.deeper").get(&row), None);
    }

    #[test]
    fn test_set_creates_intermediate_objects() {
        let mut row = object(json!({"id": 1}));
        let path = FieldPath::parse("storage.location.rack");
        assert_eq!(path.set(&mut row, json!("R12")), None);
        assert_eq!(row["storage"]["location"]["rack"], json!("R12"));

        let previous = path.set(&mut row, json!("R13"));
        assert_eq!(previous, Some(json!("R12")));
    }

    #[test]
    fn test_set_replaces_scalar_intermediate() {
        let mut row = object(json!({"storage": "legacy"}));
        FieldPath::parse("storage.name").set(&mut row, json!("VSP"));
        assert_eq!(row["storage"], json!({"name": "VSP"}));
    }

    #[test]
    fn test_display_round_trips_accessor() {
        let path = FieldPath::parse("a..b.c");
        assert_eq!(path.keys(), &["a", "b", "c"]);
        assert_eq!(path.to_string(), "a.b.c");
        assert!(FieldPath::parse("id").is_id());
        assert!(!FieldPath::parse("fabric.id").is_id());
    }
}
