//! Records and key handling
//!
//! A [`Record`] is an insertion-ordered map of field name to JSON value.
//! Stages never share mutable records: every stage that needs to change a
//! record works on its own copy.

use crate::error::{GraphError, Result};
use serde_json::{Map, Number, Value};
use std::cmp::Ordering;

/// One row of structured data
pub type Record = Map<String, Value>;

/// Build a record from a JSON value, failing unless it is an object
pub fn from_value(value: Value) -> Result<Record> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(GraphError::NotAnObject {
            context: format!("expected a JSON object, found {other}"),
        }),
    }
}

/// Build a record from field/value pairs, keeping their order
pub fn from_pairs<I, K>(pairs: I) -> Record
where
    I: IntoIterator<Item = (K, Value)>,
    K: Into<String>,
{
    pairs.into_iter().map(|(k, v)| (k.into(), v)).collect()
}

/// Look up a field, failing with [`GraphError::MissingField`] when absent
pub fn field<'a>(record: &'a Record, name: &str) -> Result<&'a Value> {
    record.get(name).ok_or_else(|| GraphError::MissingField {
        field: name.to_string(),
    })
}

/// Extract the values of `keys` from a record, in key order
pub fn key_of(record: &Record, keys: &[String]) -> Result<Vec<Value>> {
    keys.iter()
        .map(|key| field(record, key).cloned())
        .collect()
}

/// Re-order a record's fields alphabetically by name
pub fn sorted_fields(record: Record) -> Record {
    let mut fields: Vec<(String, Value)> = record.into_iter().collect();
    fields.sort_by(|a, b| a.0.cmp(&b.0));
    fields.into_iter().collect()
}

/// Compare two records field by field over `keys`
///
/// Absent fields order after present ones; callers that require the keys
/// validate their presence first.
pub fn compare_by_keys(a: &Record, b: &Record, keys: &[String]) -> Ordering {
    for key in keys {
        let ordering = match (a.get(key), b.get(key)) {
            (Some(x), Some(y)) => compare_values(x, y),
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Greater,
            (Some(_), None) => Ordering::Less,
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}

/// Total order over JSON values
///
/// Values of the same kind compare naturally: numbers by exact numeric value
/// (so `1` equals `1.0`, and integers beyond 2^53 stay distinct), arrays
/// element-wise, objects entry-wise in field-name order. Values of different
/// kinds order by kind: null < bool < number < string < array < object.
///
/// Sorting and grouping both use this order, so two values are the same key
/// exactly when this returns [`Ordering::Equal`].
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
        (Value::Number(a), Value::Number(b)) => compare_numbers(a, b),
        (Value::String(a), Value::String(b)) => a.cmp(b),
        (Value::Array(a), Value::Array(b)) => {
            for (x, y) in a.iter().zip(b.iter()) {
                let ordering = compare_values(x, y);
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
            a.len().cmp(&b.len())
        }
        (Value::Object(a), Value::Object(b)) => compare_objects(a, b),
        _ => kind_rank(a).cmp(&kind_rank(b)),
    }
}

/// Compare two key tuples with [`compare_values`]
pub fn compare_keys(a: &[Value], b: &[Value]) -> Ordering {
    for (x, y) in a.iter().zip(b.iter()) {
        let ordering = compare_values(x, y);
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    a.len().cmp(&b.len())
}

fn compare_numbers(a: &Number, b: &Number) -> Ordering {
    match (integer(a), integer(b)) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(a), None) => compare_integer_float(a, b.as_f64().unwrap_or(0.0)),
        (None, Some(b)) => compare_integer_float(b, a.as_f64().unwrap_or(0.0)).reverse(),
        (None, None) => {
            let (a, b) = (a.as_f64().unwrap_or(0.0), b.as_f64().unwrap_or(0.0));
            a.partial_cmp(&b).unwrap_or(Ordering::Equal)
        }
    }
}

fn integer(number: &Number) -> Option<i128> {
    number
        .as_i64()
        .map(i128::from)
        .or_else(|| number.as_u64().map(i128::from))
}

/// Exact comparison of an integer against a float
fn compare_integer_float(integer: i128, float: f64) -> Ordering {
    if float >= i128::MAX as f64 {
        return Ordering::Less;
    }
    if float < i128::MIN as f64 {
        return Ordering::Greater;
    }
    let floor = float.floor();
    match integer.cmp(&(floor as i128)) {
        Ordering::Equal if float > floor => Ordering::Less,
        ordering => ordering,
    }
}

fn compare_objects(a: &Map<String, Value>, b: &Map<String, Value>) -> Ordering {
    let mut a_entries: Vec<(&String, &Value)> = a.iter().collect();
    let mut b_entries: Vec<(&String, &Value)> = b.iter().collect();
    a_entries.sort_by(|x, y| x.0.cmp(y.0));
    b_entries.sort_by(|x, y| x.0.cmp(y.0));

    for ((a_name, a_value), (b_name, b_value)) in a_entries.iter().zip(b_entries.iter()) {
        let ordering = a_name
            .cmp(b_name)
            .then_with(|| compare_values(a_value, b_value));
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    a_entries.len().cmp(&b_entries.len())
}

fn kind_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}

/// An ordered set of key names used by sort, group and join stages
///
/// An empty set is meaningful: a group stage with no keys treats the whole
/// stream as one group, and an outer join with no keys becomes a cross join.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeySet(Vec<String>);

impl KeySet {
    /// The empty key set
    pub fn none() -> Self {
        Self(Vec::new())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn into_vec(self) -> Vec<String> {
        self.0
    }
}

impl From<&str> for KeySet {
    fn from(key: &str) -> Self {
        Self(vec![key.to_string()])
    }
}

impl From<String> for KeySet {
    fn from(key: String) -> Self {
        Self(vec![key])
    }
}

impl From<Vec<String>> for KeySet {
    fn from(keys: Vec<String>) -> Self {
        Self(keys)
    }
}

impl From<Vec<&str>> for KeySet {
    fn from(keys: Vec<&str>) -> Self {
        Self(keys.into_iter().map(str::to_string).collect())
    }
}

impl From<&[&str]> for KeySet {
    fn from(keys: &[&str]) -> Self {
        Self(keys.iter().map(|k| k.to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for KeySet {
    fn from(keys: [&str; N]) -> Self {
        Self(keys.iter().map(|k| k.to_string()).collect())
    }
}
