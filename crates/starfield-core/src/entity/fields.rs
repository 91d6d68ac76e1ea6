//! Static field lists and the generic merge routine.
//!
//! Each entity variant names its replicated fields once. Snapshots, partial
//! merges and change registration all go through the same list, so a field
//! cannot be serialized without also being mergeable.

use serde_json::{json, Map, Value};

use crate::vector::Vec3;

/// Named-field access for a replicated record.
pub trait FieldAccess {
    /// Every replicated field name, in serialization order.
    fn fields(&self) -> &'static [&'static str];

    /// Current value of `name` in wire form.
    fn field(&self, name: &str) -> Option<Value>;

    /// Apply a wire value to `name`. Returns false if the name is unknown
    /// or the value is unusable; the field is left unchanged in that case.
    fn set_field(&mut self, name: &str, value: &Value) -> bool;
}

/// Copy every listed field present in `partial` onto `target`.
/// Returns the names that were applied.
pub fn merge_fields<T: FieldAccess + ?Sized>(
    target: &mut T,
    partial: &Map<String, Value>,
) -> Vec<&'static str> {
    let mut applied = Vec::new();
    for &name in target.fields() {
        if let Some(value) = partial.get(name) {
            if target.set_field(name, value) {
                applied.push(name);
            }
        }
    }
    applied
}

/// Full record of every listed field.
pub fn fields_to_map<T: FieldAccess + ?Sized>(source: &T) -> Map<String, Value> {
    let mut out = Map::new();
    for &name in source.fields() {
        if let Some(value) = source.field(name) {
            out.insert(name.to_owned(), value);
        }
    }
    out
}

pub fn vec3_value(v: Vec3) -> Value {
    json!([v.x, v.y, v.z])
}

/// Accepts `[x, y]` or `[x, y, z]` with finite numbers.
pub fn decode_vec3(value: &Value) -> Option<Vec3> {
    let arr = value.as_array()?;
    if arr.len() < 2 || arr.len() > 3 {
        return None;
    }
    let x = decode_f64(&arr[0])?;
    let y = decode_f64(&arr[1])?;
    let z = match arr.get(2) {
        Some(v) => decode_f64(v)?,
        None => 0.0,
    };
    Some(Vec3::new(x, y, z))
}

pub fn decode_f64(value: &Value) -> Option<f64> {
    value.as_f64().filter(|f| f.is_finite())
}

/// Booleans, or numbers read as non-zero.
pub fn decode_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(_) => decode_f64(value).map(|f| f != 0.0),
        _ => None,
    }
}

pub fn decode_string(value: &Value) -> Option<String> {
    value.as_str().map(str::to_owned)
}

/// Assign through `decode` if the value is usable.
pub fn assign<T>(slot: &mut T, value: &Value, decode: impl Fn(&Value) -> Option<T>) -> bool {
    match decode(value) {
        Some(v) => {
            *slot = v;
            true
        }
        None => false,
    }
}
