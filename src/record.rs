use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One domain row as received from `/api/domains`.
///
/// The backend sends loosely typed rows, so the record keeps the raw JSON
/// object and exposes typed accessors on top of it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DomainRecord(Map<String, Value>);

impl DomainRecord {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// Natural key of the record, empty when the backend omitted it.
    pub fn domain(&self) -> &str {
        self.0.get("domain").and_then(Value::as_str).unwrap_or("")
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Non-empty string value of a scalar field.
    pub fn str_field(&self, key: &str) -> Option<&str> {
        self.0
            .get(key)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }
}

impl From<Value> for DomainRecord {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(map) => Self(map),
            _ => Self::default(),
        }
    }
}

/// String form of a field value as used by search and sort.
///
/// Falsy scalars (null, `false`, zero, empty string) read as empty. Arrays
/// join their elements with `,`. Objects contribute only their non-empty leaf
/// values, also joined with `,`, so key names never match a search.
pub fn value_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(false) => String::new(),
        Value::Number(n) if n.as_f64() == Some(0.0) => String::new(),
        other => element_text(other),
    }
}

fn element_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        Value::Array(items) => items.iter().map(element_text).collect::<Vec<_>>().join(","),
        Value::Object(map) => map
            .values()
            .map(element_text)
            .filter(|text| !text.is_empty())
            .collect::<Vec<_>>()
            .join(","),
    }
}

/// String form of `record[key]`, empty when the field is missing.
pub fn field_text(record: &DomainRecord, key: &str) -> String {
    record.get(key).map(value_text).unwrap_or_default()
}

/// Whether a value counts as "no data" for column auto-hiding.
pub fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}
