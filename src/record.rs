//! Value lookup over the records being searched.

use serde_json::{Map, Value as JsonValue};
use std::collections::BTreeMap;

use crate::plan::Field;
use crate::value::Value;

/// Read access to one record. Implementations shared across threads must allow concurrent reads.
pub trait Record {
    /// `None` when the record has no value for the field.
    fn value_of(&self, field: &Field) -> Option<Value>;

    /// Every value the record exposes, in a stable order.
    fn all_values(&self) -> Vec<Value>;
}

/// Scalars map directly; arrays and objects are searched through their JSON text; null is absent.
pub fn json_to_value(value: &JsonValue) -> Option<Value> {
    match value {
        JsonValue::Null => None,
        JsonValue::Bool(b) => Some(Value::Boolean(*b)),
        JsonValue::Number(n) => match n.as_i64() {
            Some(i) => Some(Value::Integer(i)),
            None => n.as_f64().map(Value::Float),
        },
        JsonValue::String(s) => Some(Value::Text(s.clone())),
        other => Some(Value::Text(other.to_string())),
    }
}

/// A JSON object, keyed by field name.
#[derive(Debug, Clone, Copy)]
pub struct JsonRecord<'a> {
    object: &'a Map<String, JsonValue>,
}

impl<'a> JsonRecord<'a> {
    pub fn new(object: &'a Map<String, JsonValue>) -> Self {
        Self { object }
    }

    /// `None` unless the value is an object.
    pub fn from_value(value: &'a JsonValue) -> Option<Self> {
        value.as_object().map(Self::new)
    }
}

impl Record for JsonRecord<'_> {
    fn value_of(&self, field: &Field) -> Option<Value> {
        self.object.get(field.name()).and_then(json_to_value)
    }

    fn all_values(&self) -> Vec<Value> {
        self.object.values().filter_map(json_to_value).collect()
    }
}

/// Name-keyed map of values, iterated in key order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MapRecord {
    values: BTreeMap<String, Value>,
}

impl MapRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(name.into(), value.into());
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for MapRecord {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl Record for MapRecord {
    fn value_of(&self, field: &Field) -> Option<Value> {
        self.values.get(field.name()).cloned()
    }

    fn all_values(&self) -> Vec<Value> {
        self.values.values().cloned().collect()
    }
}
