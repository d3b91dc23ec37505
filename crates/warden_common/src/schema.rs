//! Schema documents - the unit of drift comparison.
//!
//! A schema document is an API description fetched from an integration's
//! live-spec URL (OpenAPI-shaped in practice, but the differ makes no
//! format assumption beyond nested JSON). Represented as a tagged
//! recursive value so traversal is total and panic-free; `null` and
//! missing substructures read as empty objects.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A parsed schema document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct SchemaDoc(pub Value);

impl SchemaDoc {
    /// Empty document. Diffing against it yields all-added or all-removed.
    pub fn empty() -> Self {
        SchemaDoc(Value::Object(Map::new()))
    }

    /// Parse a document from raw JSON text.
    pub fn parse(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw).map(SchemaDoc)
    }

    /// View this document as an object map; `null` and non-objects read
    /// as empty so callers never branch on malformed shapes.
    pub fn as_object(&self) -> &Map<String, Value> {
        match &self.0 {
            Value::Object(map) => map,
            _ => empty_map(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.as_object().is_empty()
    }
}

impl From<Value> for SchemaDoc {
    fn from(value: Value) -> Self {
        SchemaDoc(value)
    }
}

/// Coarse type tag used when reporting type changes.
pub fn value_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn empty_map() -> &'static Map<String, Value> {
    static EMPTY: std::sync::OnceLock<Map<String, Value>> = std::sync::OnceLock::new();
    EMPTY.get_or_init(Map::new)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_and_object_view() {
        let doc = SchemaDoc::parse(r#"{"paths": {"/users": {}}}"#).unwrap();
        assert!(doc.as_object().contains_key("paths"));
        assert!(!doc.is_empty());
    }

    #[test]
    fn test_null_reads_as_empty() {
        let doc = SchemaDoc(json!(null));
        assert!(doc.is_empty());

        let scalar = SchemaDoc(json!(42));
        assert!(scalar.as_object().is_empty());
    }

    #[test]
    fn test_type_names() {
        assert_eq!(value_type_name(&json!("x")), "string");
        assert_eq!(value_type_name(&json!([1])), "array");
        assert_eq!(value_type_name(&json!({})), "object");
    }
}
