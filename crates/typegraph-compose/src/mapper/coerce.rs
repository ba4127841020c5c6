//! Checks constant input values (defaults, directive arguments) against
//! their declared input type.
//!
//! Enum names given as strings become `Value::Enum`, a single item given for
//! a list type becomes a one-element list, and omitted input object fields
//! receive their declared defaults. Deferred references that are not yet
//! resolved and types that are still empty shells are accepted unchecked.

use async_graphql::{Name, Value};
use indexmap::IndexMap;

use crate::Result;
use crate::composers::NamedTypeComposer;
use crate::error::ComposeError;
use crate::type_ref::TypeReference;

/// Coerces `value` to `type_`, failing with `MalformedDefinition` on a mismatch.
pub(crate) fn coerce_const_value(value: &Value, type_: &TypeReference) -> Result<Value> {
    match type_ {
        TypeReference::Thunk(thunk) => match thunk.resolved() {
            Some(resolved) => coerce_const_value(value, resolved),
            None => Ok(value.clone()),
        },
        TypeReference::NonNull(inner) => {
            if matches!(value, Value::Null) {
                return Err(ComposeError::malformed(format!(
                    "null given for non-null type {}",
                    describe(type_)
                )));
            }
            coerce_const_value(value, inner)
        }
        TypeReference::List(inner) => match value {
            Value::Null => Ok(Value::Null),
            Value::List(items) => items
                .iter()
                .enumerate()
                .map(|(i, item)| coerce_const_value(item, inner).map_err(|e| e.at_path(format!("[{i}]"))))
                .collect::<Result<Vec<_>>>()
                .map(Value::List),
            single => Ok(Value::List(vec![coerce_const_value(single, inner)?])),
        },
        TypeReference::Named(tc) => coerce_named(value, tc),
    }
}

fn coerce_named(value: &Value, tc: &NamedTypeComposer) -> Result<Value> {
    if matches!(value, Value::Null) {
        return Ok(Value::Null);
    }
    let type_name = tc.get_type_name();
    let mismatch = || {
        ComposeError::malformed(format!(
            "expected a value of type {type_name}, found {value}"
        ))
    };

    match tc {
        NamedTypeComposer::Scalar(_) => match (type_name.as_str(), value) {
            ("Int", Value::Number(n)) if n.as_i64().is_some_and(|i| i32::try_from(i).is_ok()) => {
                Ok(value.clone())
            }
            ("Float", Value::Number(_))
            | ("String", Value::String(_))
            | ("Boolean", Value::Boolean(_))
            | ("ID", Value::String(_)) => Ok(value.clone()),
            ("ID", Value::Number(n)) if n.is_i64() || n.is_u64() => Ok(Value::String(n.to_string())),
            ("Int" | "Float" | "String" | "Boolean" | "ID", _) => Err(mismatch()),
            _ => Ok(value.clone()),
        },
        NamedTypeComposer::Enum(etc) => {
            let name = match value {
                Value::Enum(name) => name.as_str(),
                Value::String(name) => name.as_str(),
                _ => return Err(mismatch()),
            };
            let known = etc.get_field_names();
            if known.is_empty() || known.iter().any(|v| v == name) {
                Ok(Value::Enum(Name::new(name)))
            } else {
                Err(ComposeError::malformed(format!(
                    "enum {type_name} has no value `{name}`"
                )))
            }
        }
        NamedTypeComposer::Input(itc) => {
            let Value::Object(object) = value else {
                return Err(mismatch());
            };
            if itc.get_field_names().is_empty() {
                return Ok(value.clone());
            }
            let fields = itc.get_fields()?;
            if let Some(unknown) = object.keys().find(|key| !fields.contains_key(key.as_str())) {
                return Err(ComposeError::malformed(format!(
                    "input {type_name} has no field `{unknown}`"
                )));
            }

            let mut out = IndexMap::with_capacity(fields.len());
            for (name, field) in &fields {
                let coerced = match (object.get(name.as_str()), &field.default_value) {
                    (Some(given), _) => coerce_const_value(given, &field.type_),
                    (None, Some(default)) => coerce_const_value(default, &field.type_),
                    (None, None) if field.type_.is_non_null()? => Err(ComposeError::malformed(
                        format!("missing required field `{name}`"),
                    )),
                    (None, None) => continue,
                };
                out.insert(
                    Name::new(name),
                    coerced.map_err(|e| e.at_path(format!("{type_name}.{name}")))?,
                );
            }
            Ok(Value::Object(out))
        }
        NamedTypeComposer::Object(_) | NamedTypeComposer::Interface(_) | NamedTypeComposer::Union(_) => {
            Err(ComposeError::wrong_kind(format!(
                "{} `{type_name}` cannot hold an input value",
                tc.kind()
            )))
        }
    }
}

fn describe(type_: &TypeReference) -> String {
    type_
        .type_string()
        .unwrap_or_else(|_| "<deferred>".to_string())
}
