//! Conversion of result values into plain JSON values.

use crate::query::{ObjectQuery, Query, QueryKind};
use crate::schema::{EnumType, ScalarKind, ScalarType};
use graphlayer_core::{GraphError, GraphResult, Object, Value};
use serde_json::{Map, Number, Value as JsonValue};

impl Query {
    /// Converts a result of this query into a JSON value.
    ///
    /// Object keys are emitted in the query's key order.
    pub fn to_json_value(&self, value: &Value) -> GraphResult<JsonValue> {
        match self.kind() {
            QueryKind::Scalar(scalar) => scalar.to_json_value(value),
            QueryKind::Enum(enum_type) => enum_to_json(enum_type, value),
            QueryKind::Object(query) => match value {
                Value::Object(object) => query.to_json_value(object),
                other => Err(mismatch(query.type_name(), other)),
            },
            QueryKind::List(element) => match value {
                Value::List(items) => items
                    .iter()
                    .map(|item| element.to_json_value(item))
                    .collect::<GraphResult<Vec<_>>>()
                    .map(JsonValue::Array),
                other => Err(mismatch("list", other)),
            },
            QueryKind::Nullable(element) => match value {
                Value::Null => Ok(JsonValue::Null),
                other => element.to_json_value(other),
            },
        }
    }
}

impl ObjectQuery {
    /// Projects an object result onto this query's keys.
    ///
    /// For interface queries, a field owned by an implementation is skipped
    /// when the object records another type. Objects without a recorded type
    /// emit every such field they hold.
    pub fn to_json_value(&self, object: &Object) -> GraphResult<JsonValue> {
        let mut map = Map::with_capacity(self.len());
        for (key, field_query) in self.fields() {
            let owner = field_query.owner();
            if owner != self.type_name() {
                match object.type_name() {
                    Some(type_name) if type_name != owner => continue,
                    None if !object.contains_key(key) => continue,
                    _ => {}
                }
            }
            let value = object.get(key).ok_or_else(|| GraphError::MissingObjectKey {
                key: key.to_string(),
            })?;
            map.insert(key.to_string(), field_query.type_query().to_json_value(value)?);
        }
        Ok(JsonValue::Object(map))
    }
}

impl ScalarType {
    /// Converts a scalar value. Conversion is the identity on legal values.
    pub fn to_json_value(&self, value: &Value) -> GraphResult<JsonValue> {
        match (self.kind, value) {
            (ScalarKind::Boolean, Value::Boolean(b)) => Ok(JsonValue::Bool(*b)),
            (ScalarKind::Int | ScalarKind::Id, Value::Int(i)) => Ok(JsonValue::from(*i)),
            (ScalarKind::Float, Value::Float(_) | Value::Int(_)) => float_to_json(value),
            (ScalarKind::String | ScalarKind::Id, Value::String(s)) => {
                Ok(JsonValue::String(s.clone()))
            }
            (ScalarKind::Custom, other) => structural(other),
            (_, other) => Err(mismatch(&self.name, other)),
        }
    }
}

fn enum_to_json(enum_type: &EnumType, value: &Value) -> GraphResult<JsonValue> {
    let domain = match value {
        Value::Enum(domain) | Value::String(domain) => domain,
        other => return Err(mismatch(enum_type.name(), other)),
    };
    enum_type
        .external_name(domain)
        .map(|name| JsonValue::String(name.to_string()))
        .ok_or_else(|| GraphError::InvalidEnumValue {
            type_name: enum_type.name().to_string(),
            value: domain.clone(),
        })
}

fn float_to_json(value: &Value) -> GraphResult<JsonValue> {
    let float = value.as_f64().unwrap_or_default();
    Number::from_f64(float)
        .map(JsonValue::Number)
        .ok_or_else(|| GraphError::TypeMismatch {
            expected: "finite float".to_string(),
            found: "non-finite float",
        })
}

/// Converts a value without type information.
fn structural(value: &Value) -> GraphResult<JsonValue> {
    Ok(match value {
        Value::Null => JsonValue::Null,
        Value::Boolean(b) => JsonValue::Bool(*b),
        Value::Int(i) => JsonValue::from(*i),
        Value::Float(_) => float_to_json(value)?,
        Value::String(s) | Value::Enum(s) => JsonValue::String(s.clone()),
        Value::List(items) => JsonValue::Array(
            items
                .iter()
                .map(structural)
                .collect::<GraphResult<Vec<_>>>()?,
        ),
        Value::Object(object) => JsonValue::Object(
            object
                .iter()
                .map(|(k, v)| Ok((k.to_string(), structural(v)?)))
                .collect::<GraphResult<Map<_, _>>>()?,
        ),
    })
}

fn mismatch(expected: &str, found: &Value) -> GraphError {
    GraphError::TypeMismatch {
        expected: expected.to_string(),
        found: found.kind(),
    }
}
