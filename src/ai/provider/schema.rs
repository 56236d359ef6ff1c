//! Strict JSON-schema handling for structured output.
//!
//! Providers that enforce strict structured output reject object schemas that
//! allow extra keys or leave declared properties optional. Every object node is
//! rewritten to `additionalProperties: false` with `required` listing all of
//! its properties.

use serde_json::{Map, Value};

use crate::types::{ClarionError, Result};

/// Recursively make `schema` strict, in place.
///
/// Descends into `properties`, `items`, `anyOf` and `$defs`/`definitions`
/// regardless of the current node's type.
pub fn enforce_schema_compliance(schema: &mut Value) {
    let Some(node) = schema.as_object_mut() else {
        return;
    };

    if node.get("type").and_then(Value::as_str) == Some("object") {
        node.insert("additionalProperties".to_string(), Value::Bool(false));
        if let Some(props) = node.get("properties").and_then(Value::as_object) {
            let required: Vec<Value> = props.keys().cloned().map(Value::String).collect();
            node.insert("required".to_string(), Value::Array(required));
        }
    }

    if let Some(props) = node.get_mut("properties").and_then(Value::as_object_mut) {
        props.values_mut().for_each(enforce_schema_compliance);
    }

    match node.get_mut("items") {
        Some(Value::Array(items)) => items.iter_mut().for_each(enforce_schema_compliance),
        Some(items) => enforce_schema_compliance(items),
        None => {}
    }

    if let Some(Value::Array(branches)) = node.get_mut("anyOf") {
        branches.iter_mut().for_each(enforce_schema_compliance);
    }

    for key in ["$defs", "definitions"] {
        if let Some(defs) = node.get_mut(key).and_then(Value::as_object_mut) {
            defs.values_mut().for_each(enforce_schema_compliance);
        }
    }
}

/// Pull the schema out of a request's `output_schema` and make it strict.
///
/// Accepts `{"schema": {...}}` or a bare schema carrying `type`. Returns
/// `None` for an empty mapping or an empty nested schema. The input is never
/// modified.
pub fn extract_output_schema(output_schema: &Map<String, Value>) -> Result<Option<Value>> {
    if output_schema.is_empty() {
        return Ok(None);
    }

    let mut schema = match output_schema.get("schema") {
        Some(Value::Object(inner)) if inner.is_empty() => return Ok(None),
        Some(Value::Object(inner)) => Value::Object(inner.clone()),
        Some(other) => {
            return Err(ClarionError::InvalidSchema(format!(
                "expected 'schema' to be an object, got {}",
                json_kind(other)
            )));
        }
        None if output_schema.contains_key("type") => Value::Object(output_schema.clone()),
        None => {
            return Err(ClarionError::InvalidSchema(
                "expected a nested 'schema' object or a JSON schema with a 'type'".to_string(),
            ));
        }
    };

    enforce_schema_compliance(&mut schema);
    Ok(Some(schema))
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::BTreeSet;

    fn required_set(node: &Value) -> BTreeSet<String> {
        node["required"]
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_str().unwrap().to_string())
            .collect()
    }

    #[test]
    fn test_flat_object() {
        let mut schema = json!({"type": "object", "properties": {"x": {"type": "string"}}});
        enforce_schema_compliance(&mut schema);

        assert_eq!(schema["additionalProperties"], json!(false));
        assert_eq!(schema["required"], json!(["x"]));
    }

    #[test]
    fn test_overrides_partial_required() {
        let mut schema = json!({
            "type": "object",
            "properties": {"a": {"type": "string"}, "b": {"type": "number"}},
            "required": ["a"],
            "additionalProperties": true
        });
        enforce_schema_compliance(&mut schema);

        assert_eq!(schema["additionalProperties"], json!(false));
        assert_eq!(required_set(&schema), BTreeSet::from(["a".into(), "b".into()]));
    }

    #[test]
    fn test_array_items_one_level_deeper() {
        let mut schema = json!({
            "type": "array",
            "items": {"type": "object", "properties": {"path": {"type": "string"}}}
        });
        enforce_schema_compliance(&mut schema);

        assert!(schema.get("additionalProperties").is_none());
        assert_eq!(schema["items"]["additionalProperties"], json!(false));
        assert_eq!(schema["items"]["required"], json!(["path"]));
    }

    #[test]
    fn test_file_changes_schema() {
        let mut schema = json!({
            "type": "object",
            "properties": {
                "summary": {"type": "string"},
                "file_changes": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {
                            "action": {"type": "string", "enum": ["create", "modify", "delete"]},
                            "path": {"type": "string"},
                            "new_content": {"type": "string"}
                        }
                    }
                }
            }
        });
        enforce_schema_compliance(&mut schema);

        let item = &schema["properties"]["file_changes"]["items"];
        assert_eq!(item["additionalProperties"], json!(false));
        assert_eq!(
            required_set(item),
            BTreeSet::from(["action".into(), "path".into(), "new_content".into()])
        );
        assert_eq!(
            required_set(&schema),
            BTreeSet::from(["summary".into(), "file_changes".into()])
        );
    }

    #[test]
    fn test_object_without_properties_gets_no_required() {
        let mut schema = json!({"type": "object"});
        enforce_schema_compliance(&mut schema);
        assert_eq!(schema, json!({"type": "object", "additionalProperties": false}));
    }

    #[test]
    fn test_any_of_and_defs() {
        let mut schema = json!({
            "anyOf": [{"type": "object", "properties": {"a": {"type": "string"}}}],
            "$defs": {"Item": {"type": "object", "properties": {"b": {"type": "string"}}}}
        });
        enforce_schema_compliance(&mut schema);

        assert_eq!(schema["anyOf"][0]["required"], json!(["a"]));
        assert_eq!(schema["$defs"]["Item"]["additionalProperties"], json!(false));
    }

    #[test]
    fn test_extract_nested_schema_does_not_mutate_input() {
        let input = json!({"schema": {"type": "object", "properties": {"x": {"type": "string"}}}});
        let map = input.as_object().unwrap().clone();

        let schema = extract_output_schema(&map).unwrap().unwrap();
        assert_eq!(schema["required"], json!(["x"]));
        assert!(map["schema"].get("required").is_none());
    }

    #[test]
    fn test_extract_bare_schema() {
        let map = json!({"type": "object", "properties": {}}).as_object().cloned().unwrap();
        let schema = extract_output_schema(&map).unwrap().unwrap();
        assert_eq!(schema["additionalProperties"], json!(false));
    }

    #[test]
    fn test_extract_empty() {
        assert!(extract_output_schema(&Map::new()).unwrap().is_none());
        let map = json!({"schema": {}}).as_object().cloned().unwrap();
        assert!(extract_output_schema(&map).unwrap().is_none());
    }

    #[test]
    fn test_extract_rejects_unknown_shape() {
        let map = json!({"foo": 1}).as_object().cloned().unwrap();
        assert!(matches!(
            extract_output_schema(&map),
            Err(ClarionError::InvalidSchema(_))
        ));

        let map = json!({"schema": "nope"}).as_object().cloned().unwrap();
        let err = extract_output_schema(&map).unwrap_err();
        assert!(err.to_string().contains("string"));
    }
}
