//! Response envelope normalization.
//!
//! The backend wraps the same resource differently depending on the
//! endpoint: a bare array, an array under `data` or a resource-named key,
//! or an object nested one or two levels deep. Each endpoint module decodes
//! through one of these helpers so call sites only ever see typed values.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::errors::ApiError;
use crate::models::Association;

/// A list found at the top level, under one of `keys`, or under
/// `data.<key>`. Anything else decodes as an empty list.
pub fn list<T: DeserializeOwned>(body: Value, keys: &[&str]) -> Result<Vec<T>, ApiError> {
    match find_array(body, keys) {
        Some(items) => Ok(serde_json::from_value(items)?),
        None => Ok(Vec::new()),
    }
}

fn find_array(body: Value, keys: &[&str]) -> Option<Value> {
    match body {
        Value::Array(_) => Some(body),
        Value::Object(mut map) => {
            for key in keys {
                if let Some(v) = map.get(*key) {
                    if v.is_array() {
                        return map.remove(*key);
                    }
                }
            }
            match map.remove("data") {
                Some(data @ Value::Object(_)) => find_array(data, keys),
                _ => None,
            }
        }
        _ => None,
    }
}

/// An object under the first of `keys` holding one, or the body itself.
pub fn object<T: DeserializeOwned>(body: Value, keys: &[&str]) -> Result<T, ApiError> {
    let inner = match body {
        Value::Object(mut map) => {
            let key = keys
                .iter()
                .find(|k| map.get(**k).map(Value::is_object).unwrap_or(false));
            match key {
                Some(k) => map.remove(*k).unwrap_or(Value::Null),
                None => Value::Object(map),
            }
        }
        other => other,
    };

    serde_json::from_value(inner).map_err(|e| ApiError::Decode(e.to_string()))
}

/// A numeric `id` under the first of `keys` holding an object with one, or
/// at the top level. Acknowledgement-only bodies have none.
pub fn id(body: &Value, keys: &[&str]) -> Option<i64> {
    keys.iter()
        .filter_map(|k| body.get(*k))
        .chain(std::iter::once(body))
        .find_map(|v| v.get("id").and_then(Value::as_i64))
}

/// `GET /my-association` and `PUT /my-association`: `data.association`,
/// `association`, `user`, or the body.
pub fn association(body: Value) -> Result<Association, ApiError> {
    let nested = body
        .get("data")
        .and_then(|d| d.get("association"))
        .filter(|v| v.is_object())
        .cloned();
    match nested {
        Some(inner) => object(inner, &[]),
        None => object(body, &["association", "user"]),
    }
}
