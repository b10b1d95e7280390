//! Navigable read-only records built from validated JSON documents.
//!
//! A [`DynamicRecord`] mirrors the document tree one-to-one. Object fields
//! keep the order in which they appear in the source file. Lookups that miss
//! return a shared `Null` node instead of panicking, so chained indexing such
//! as `record["measurements"][0]["value"]` is always safe.

use std::ops::Index;

use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};
use serde_json::{Map, Number, Value};

static NULL: DynamicRecord = DynamicRecord::Null;

/// One node of a converted document.
#[derive(Debug, Clone, PartialEq)]
pub enum DynamicRecord {
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Array(Vec<DynamicRecord>),
    Object(DynamicObject),
}

/// Ordered field map of an object node.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DynamicObject {
    fields: Vec<(String, DynamicRecord)>,
}

impl DynamicObject {
    pub fn get(&self, key: &str) -> Option<&DynamicRecord> {
        self.fields.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &DynamicRecord)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl From<Map<String, Value>> for DynamicObject {
    fn from(map: Map<String, Value>) -> Self {
        Self {
            fields: map
                .into_iter()
                .map(|(k, v)| (k, DynamicRecord::from(v)))
                .collect(),
        }
    }
}

impl From<Value> for DynamicRecord {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(b),
            Value::Number(n) => Self::Number(n),
            Value::String(s) => Self::String(s),
            Value::Array(items) => Self::Array(items.into_iter().map(Self::from).collect()),
            Value::Object(map) => Self::Object(DynamicObject::from(map)),
        }
    }
}

impl DynamicRecord {
    /// Field `key` of an object node.
    pub fn get(&self, key: &str) -> Option<&DynamicRecord> {
        match self {
            Self::Object(obj) => obj.get(key),
            _ => None,
        }
    }

    /// Element `index` of an array node.
    pub fn at(&self, index: usize) -> Option<&DynamicRecord> {
        match self {
            Self::Array(items) => items.get(index),
            _ => None,
        }
    }

    /// Look up a node by RFC 6901 JSON Pointer, e.g. `/measurements/0/value`.
    ///
    /// The empty pointer addresses the record itself.
    pub fn pointer(&self, pointer: &str) -> Option<&DynamicRecord> {
        if pointer.is_empty() {
            return Some(self);
        }
        let rest = pointer.strip_prefix('/')?;
        rest.split('/')
            .map(|token| token.replace("~1", "/").replace("~0", "~"))
            .try_fold(self, |node, token| match node {
                Self::Object(obj) => obj.get(&token),
                Self::Array(items) => token.parse::<usize>().ok().and_then(|i| items.get(i)),
                _ => None,
            })
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => n.as_f64(),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Number(n) => n.as_i64(),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_array(&self) -> Option<&[DynamicRecord]> {
        match self {
            Self::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&DynamicObject> {
        match self {
            Self::Object(obj) => Some(obj),
            _ => None,
        }
    }

    /// Field names of an object node in source order; empty otherwise.
    pub fn keys(&self) -> Vec<&str> {
        match self {
            Self::Object(obj) => obj.keys().collect(),
            _ => Vec::new(),
        }
    }

    /// Number of fields or elements. Scalars have length 0.
    pub fn len(&self) -> usize {
        match self {
            Self::Object(obj) => obj.len(),
            Self::Array(items) => items.len(),
            _ => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Convert back into a JSON value without loss.
    pub fn to_value(&self) -> Value {
        match self {
            Self::Null => Value::Null,
            Self::Bool(b) => Value::Bool(*b),
            Self::Number(n) => Value::Number(n.clone()),
            Self::String(s) => Value::String(s.clone()),
            Self::Array(items) => Value::Array(items.iter().map(Self::to_value).collect()),
            Self::Object(obj) => Value::Object(
                obj.iter()
                    .map(|(k, v)| (k.to_string(), v.to_value()))
                    .collect(),
            ),
        }
    }
}

impl Index<&str> for DynamicRecord {
    type Output = DynamicRecord;

    fn index(&self, key: &str) -> &DynamicRecord {
        self.get(key).unwrap_or(&NULL)
    }
}

impl Index<usize> for DynamicRecord {
    type Output = DynamicRecord;

    fn index(&self, index: usize) -> &DynamicRecord {
        self.at(index).unwrap_or(&NULL)
    }
}

impl Serialize for DynamicRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Null => serializer.serialize_unit(),
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Number(n) => n.serialize(serializer),
            Self::String(s) => serializer.serialize_str(s),
            Self::Array(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Self::Object(obj) => obj.serialize(serializer),
        }
    }
}

impl Serialize for DynamicObject {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (k, v) in &self.fields {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}
