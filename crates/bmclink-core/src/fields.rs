// Candidate-key lookup.
//
// Vendors spell the same attribute differently. Each canonical attribute
// carries an ordered list of candidate keys; the first key holding a
// usable value wins, regardless of what later candidates contain.

use serde_json::Value;

use crate::model::Record;

/// First non-null value among `candidates`, in order.
pub fn first_present<'a>(record: &'a Record, candidates: &[&str]) -> Option<&'a Value> {
    candidates
        .iter()
        .filter_map(|key| record.get(*key))
        .find(|value| !value.is_null())
}

/// Like [`first_present`], cloned.
pub fn first_value(record: &Record, candidates: &[&str]) -> Option<Value> {
    first_present(record, candidates).cloned()
}

/// First candidate whose value `convert` accepts. Null values and values
/// of the wrong shape (say, an object where a string is wanted) fall
/// through to the next candidate.
fn first_with<T>(
    record: &Record,
    candidates: &[&str],
    convert: impl Fn(&Value) -> Option<T>,
) -> Option<T> {
    candidates
        .iter()
        .filter_map(|key| record.get(*key))
        .filter(|value| !value.is_null())
        .find_map(convert)
}

/// A string rendering of the first scalar candidate. Numbers and booleans
/// are stringified.
pub fn first_string(record: &Record, candidates: &[&str]) -> Option<String> {
    first_with(record, candidates, scalar_to_string)
}

/// The first candidate readable as a float. Numeric strings are parsed.
pub fn first_f64(record: &Record, candidates: &[&str]) -> Option<f64> {
    first_with(record, candidates, |value| match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

/// The first candidate readable as an unsigned integer.
pub fn first_u64(record: &Record, candidates: &[&str]) -> Option<u64> {
    first_with(record, candidates, |value| match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

/// The first candidate readable as a boolean.
pub fn first_bool(record: &Record, candidates: &[&str]) -> Option<bool> {
    first_with(record, candidates, |value| match value {
        Value::Bool(b) => Some(*b),
        Value::String(s) => match s.to_ascii_lowercase().as_str() {
            "true" | "yes" | "enabled" => Some(true),
            "false" | "no" | "disabled" => Some(false),
            _ => None,
        },
        _ => None,
    })
}

pub(crate) fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// View a JSON value as a record. Non-objects become an empty record.
pub(crate) fn as_record(value: &Value) -> Record {
    value.as_object().cloned().unwrap_or_default()
}

/// Insert `value` under `key` unless it is absent.
pub(crate) fn insert_opt(out: &mut Record, key: &str, value: Option<impl Into<Value>>) {
    if let Some(v) = value {
        out.insert(key.to_owned(), v.into());
    }
}
