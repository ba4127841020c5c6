//! Helpers for `async_graphql::Value`, the value type used for arguments,
//! default values, enum internal values and resolve results.

use async_graphql::{Name, Value};

/// Converts JSON into a GraphQL value.
pub fn json_to_graphql_value(json: serde_json::Value) -> Value {
    use serde_json::Value as Json;

    match json {
        Json::Null => Value::Null,
        Json::Bool(b) => Value::Boolean(b),
        Json::Number(n) => Value::Number(n),
        Json::String(s) => Value::String(s),
        Json::Array(items) => Value::List(items.into_iter().map(json_to_graphql_value).collect()),
        Json::Object(entries) => Value::Object(
            entries
                .into_iter()
                .map(|(key, value)| (Name::new(key), json_to_graphql_value(value)))
                .collect(),
        ),
    }
}

/// Converts a GraphQL value into JSON.
///
/// Enum values become strings; binary uploads become null.
pub fn graphql_value_to_json(value: &Value) -> serde_json::Value {
    match value {
        Value::Null | Value::Binary(_) => serde_json::Value::Null,
        Value::Boolean(b) => serde_json::Value::Bool(*b),
        Value::Number(n) => serde_json::Value::Number(n.clone()),
        Value::String(s) => serde_json::Value::String(s.clone()),
        Value::Enum(name) => serde_json::Value::String(name.to_string()),
        Value::List(items) => {
            serde_json::Value::Array(items.iter().map(graphql_value_to_json).collect())
        }
        Value::Object(obj) => serde_json::Value::Object(
            obj.iter()
                .map(|(k, v)| (k.to_string(), graphql_value_to_json(v)))
                .collect(),
        ),
    }
}

/// Reads `key` from an object value.
pub fn get_key<'a>(value: &'a Value, key: &str) -> Option<&'a Value> {
    match value {
        Value::Object(obj) => obj.get(key),
        _ => None,
    }
}

/// Sets `key` on an object value, turning any non-object into an empty object first.
pub fn set_key(value: &mut Value, key: &str, new_value: Value) {
    if !matches!(value, Value::Object(_)) {
        *value = Value::Object(Default::default());
    }
    if let Value::Object(obj) = value {
        obj.insert(Name::new(key), new_value);
    }
}

/// Shallow merge of two object values; keys of `patch` win.
///
/// A non-object `base` is replaced by `patch`.
pub fn merge_objects(base: &Value, patch: &Value) -> Value {
    match (base, patch) {
        (Value::Object(base), Value::Object(patch)) => {
            let mut merged = base.clone();
            for (k, v) in patch {
                merged.insert(k.clone(), v.clone());
            }
            Value::Object(merged)
        }
        _ => patch.clone(),
    }
}

/// Returns true for `Value::String` or `Value::Enum` carrying `text`.
pub fn is_name_value(value: &Value, text: &str) -> bool {
    match value {
        Value::String(s) => s == text,
        Value::Enum(name) => name.as_str() == text,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_json_to_graphql_value() {
        let value = json_to_graphql_value(json!({"name": "Ann", "age": 30, "tags": ["a"]}));
        assert_eq!(get_key(&value, "name"), Some(&Value::String("Ann".into())));
        assert_eq!(get_key(&value, "age"), Some(&Value::Number(30.into())));
        assert_eq!(
            graphql_value_to_json(&json_to_graphql_value(json!({"ratio": 0.5}))),
            json!({"ratio": 0.5})
        );
        assert!(matches!(get_key(&value, "tags"), Some(Value::List(items)) if items.len() == 1));
    }

    #[test]
    fn test_graphql_value_to_json() {
        let value = json_to_graphql_value(json!({"a": [1, true, null]}));
        assert_eq!(graphql_value_to_json(&value), json!({"a": [1, true, null]}));
    }

    #[test]
    fn test_merge_objects_later_wins() {
        let base = json_to_graphql_value(json!({"age": 20, "active": false}));
        let patch = json_to_graphql_value(json!({"active": true}));
        let merged = merge_objects(&base, &patch);
        assert_eq!(
            graphql_value_to_json(&merged),
            json!({"age": 20, "active": true})
        );
    }

    #[test]
    fn test_set_key_on_null() {
        let mut value = Value::Null;
        set_key(&mut value, "age", Value::Number(20.into()));
        assert_eq!(graphql_value_to_json(&value), json!({"age": 20}));
    }
}
