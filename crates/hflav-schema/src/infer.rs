//! # Schema-by-Example Inference
//!
//! Derives a JSON Schema from the observed structure of an example document.
//!
//! Rules:
//!
//! - every object becomes `{"type": "object", "properties": {...},
//!   "additionalProperties": false}` with one property per observed key;
//! - no property is ever listed as `required`;
//! - arrays become `{"type": "array", "items": <merge of element schemas>}`,
//!   or `{"type": "array"}` when empty;
//! - scalars map to their JSON type (`string`, `number`, `boolean`, `null`).
//!
//! Element schemas of one array are merged: objects union their properties,
//! arrays merge their items, and differing types fall back to `anyOf`.
//! The result is exactly as permissive as the example: data may omit any
//! field the example has but may not introduce a field it lacks.

use serde_json::{json, Map, Value};

use crate::DRAFT_07_URI;

/// Infer a schema node for `document`. Pure; no `$schema` marker.
pub fn infer(document: &Value) -> Value {
    match document {
        Value::Null => json!({"type": "null"}),
        Value::Bool(_) => json!({"type": "boolean"}),
        Value::Number(_) => json!({"type": "number"}),
        Value::String(_) => json!({"type": "string"}),
        Value::Array(items) => {
            let merged = items.iter().map(infer).reduce(merge);
            match merged {
                Some(items) => json!({"type": "array", "items": items}),
                None => json!({"type": "array"}),
            }
        }
        Value::Object(map) => {
            let properties: Map<String, Value> =
                map.iter().map(|(k, v)| (k.clone(), infer(v))).collect();
            closed_object(properties)
        }
    }
}

/// Infer a complete draft-07 schema document for `document`.
pub fn infer_document_schema(document: &Value) -> Value {
    let mut schema = infer(document);
    if let Value::Object(map) = &mut schema {
        map.insert("$schema".to_string(), Value::String(DRAFT_07_URI.to_string()));
    }
    schema
}

fn closed_object(properties: Map<String, Value>) -> Value {
    json!({
        "type": "object",
        "properties": Value::Object(properties),
        "additionalProperties": false
    })
}

fn type_of(schema: &Value) -> Option<&str> {
    schema.get("type").and_then(Value::as_str)
}

/// Merge two inferred schema nodes into one accepting both.
fn merge(a: Value, b: Value) -> Value {
    if a == b {
        return a;
    }
    match (type_of(&a), type_of(&b)) {
        (Some("object"), Some("object")) => merge_objects(a, b),
        (Some("array"), Some("array")) => merge_arrays(a, b),
        _ => merge_any_of(a, b),
    }
}

fn merge_objects(a: Value, b: Value) -> Value {
    let mut properties = properties_of(a);
    for (key, schema) in properties_of(b) {
        let merged = match properties.remove(&key) {
            Some(existing) => merge(existing, schema),
            None => schema,
        };
        properties.insert(key, merged);
    }
    closed_object(properties)
}

fn properties_of(schema: Value) -> Map<String, Value> {
    match schema {
        Value::Object(mut map) => match map.remove("properties") {
            Some(Value::Object(props)) => props,
            _ => Map::new(),
        },
        _ => Map::new(),
    }
}

fn merge_arrays(a: Value, b: Value) -> Value {
    let items = match (items_of(a), items_of(b)) {
        (Some(x), Some(y)) => Some(merge(x, y)),
        (x, y) => x.or(y),
    };
    match items {
        Some(items) => json!({"type": "array", "items": items}),
        None => json!({"type": "array"}),
    }
}

fn items_of(schema: Value) -> Option<Value> {
    match schema {
        Value::Object(mut map) => map.remove("items"),
        _ => None,
    }
}

fn variants_of(schema: Value) -> Vec<Value> {
    match schema {
        Value::Object(mut map) if map.contains_key("anyOf") => match map.remove("anyOf") {
            Some(Value::Array(variants)) => variants,
            _ => Vec::new(),
        },
        other => vec![other],
    }
}

/// Fold the variants of `b` into those of `a`, merging same-typed variants.
fn merge_any_of(a: Value, b: Value) -> Value {
    let mut variants = variants_of(a);
    for incoming in variants_of(b) {
        let slot = variants
            .iter()
            .position(|v| type_of(v).is_some() && type_of(v) == type_of(&incoming));
        match slot {
            Some(i) => {
                let existing = variants.remove(i);
                variants.insert(i, merge(existing, incoming));
            }
            None => variants.push(incoming),
        }
    }
    if variants.len() == 1 {
        return variants.remove(0);
    }
    json!({"anyOf": variants})
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_types() {
        assert_eq!(infer(&json!("x")), json!({"type": "string"}));
        assert_eq!(infer(&json!(1)), json!({"type": "number"}));
        assert_eq!(infer(&json!(1.5)), json!({"type": "number"}));
        assert_eq!(infer(&json!(true)), json!({"type": "boolean"}));
        assert_eq!(infer(&Value::Null), json!({"type": "null"}));
    }

    #[test]
    fn single_key_template() {
        let schema = infer(&json!({"k": "v"}));
        assert_eq!(
            schema,
            json!({
                "type": "object",
                "properties": {"k": {"type": "string"}},
                "additionalProperties": false
            })
        );
    }

    #[test]
    fn nested_objects_are_closed_and_nothing_is_required() {
        let schema = infer(&json!({"a": 1, "b": {"c": "x"}}));
        assert_eq!(schema["additionalProperties"], json!(false));
        assert_eq!(schema["properties"]["b"]["additionalProperties"], json!(false));
        assert!(schema.get("required").is_none());
        assert!(schema["properties"]["b"].get("required").is_none());
    }

    #[test]
    fn document_schema_declares_draft_07() {
        let schema = infer_document_schema(&json!({"a": 1}));
        assert_eq!(schema["$schema"], json!(DRAFT_07_URI));
    }

    #[test]
    fn empty_array_has_no_items() {
        assert_eq!(infer(&json!([])), json!({"type": "array"}));
    }

    #[test]
    fn homogeneous_array_items() {
        assert_eq!(
            infer(&json!([1, 2.5, 3])),
            json!({"type": "array", "items": {"type": "number"}})
        );
    }

    #[test]
    fn array_of_objects_unions_properties() {
        let schema = infer(&json!([{"name": "a"}, {"value": 1}]));
        let props = &schema["items"]["properties"];
        assert_eq!(props["name"], json!({"type": "string"}));
        assert_eq!(props["value"], json!({"type": "number"}));
        assert_eq!(schema["items"]["additionalProperties"], json!(false));
    }

    #[test]
    fn mixed_array_becomes_any_of() {
        let schema = infer(&json!([1, "two", {"y": true}, 4]));
        let variants = schema["items"]["anyOf"].as_array().unwrap();
        assert_eq!(variants.len(), 3);
        assert_eq!(variants[0], json!({"type": "number"}));
        assert_eq!(variants[1], json!({"type": "string"}));
        assert_eq!(variants[2]["type"], json!("object"));
    }

    #[test]
    fn nested_arrays_merge_items() {
        let schema = infer(&json!([[1], [], ["x"]]));
        assert_eq!(schema["items"]["type"], json!("array"));
        let variants = schema["items"]["items"]["anyOf"].as_array().unwrap();
        assert_eq!(variants.len(), 2);
    }
}
