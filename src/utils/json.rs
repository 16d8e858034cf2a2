// Total accessors over untyped JSON documents. Every read returns an Option so
// a missing key and a type mismatch are handled the same way by the caller.

use serde_json::{Map, Value};

pub type Object = Map<String, Value>;

pub fn get_str<'a>(object: &'a Object, key: &str) -> Option<&'a str> {
    object.get(key).and_then(Value::as_str)
}

/// String field, or the empty string when absent or not a string.
pub fn str_or_empty(object: &Object, key: &str) -> String {
    get_str(object, key).unwrap_or_default().to_string()
}

/// Integer field. Floats are truncated toward zero, matching how the API
/// occasionally encodes whole numbers as `12.0`.
pub fn get_i64(object: &Object, key: &str) -> Option<i64> {
    object.get(key).and_then(value_as_i64)
}

pub fn i64_or_zero(object: &Object, key: &str) -> i64 {
    get_i64(object, key).unwrap_or(0)
}

pub fn get_u64(object: &Object, key: &str) -> Option<u64> {
    let value = object.get(key)?;
    if let Some(n) = value.as_u64() {
        return Some(n);
    }
    value
        .as_f64()
        .filter(|f| f.is_finite() && *f >= 0.0 && f.fract() == 0.0 && *f <= u64::MAX as f64)
        .map(|f| f as u64)
}

pub fn get_f64(object: &Object, key: &str) -> Option<f64> {
    object.get(key).and_then(Value::as_f64)
}

pub fn get_array<'a>(object: &'a Object, key: &str) -> Option<&'a Vec<Value>> {
    object.get(key).and_then(Value::as_array)
}

pub fn get_object<'a>(object: &'a Object, key: &str) -> Option<&'a Object> {
    object.get(key).and_then(Value::as_object)
}

fn value_as_i64(value: &Value) -> Option<i64> {
    if let Some(n) = value.as_i64() {
        return Some(n);
    }
    value
        .as_f64()
        .filter(|f| f.is_finite() && *f >= i64::MIN as f64 && *f <= i64::MAX as f64)
        .map(|f| f.trunc() as i64)
}
