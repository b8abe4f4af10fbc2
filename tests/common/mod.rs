//! Shared fixtures for integration tests
#![allow(dead_code)]

use graphflow::record::{self, Record};
use serde_json::{json, Value};

pub fn rec(value: Value) -> Record {
    record::from_value(value).unwrap()
}

pub fn recs(value: Value) -> Vec<Record> {
    match value {
        Value::Array(items) => items.into_iter().map(rec).collect(),
        other => panic!("expected an array of records, got {other}"),
    }
}

pub fn persons() -> Vec<Record> {
    recs(json!([
        {"name": "Andrey", "id": 1},
        {"name": "Leonid", "id": 2},
        {"name": "Sergey", "id": 1},
        {"name": "Grigoroy", "id": 4},
        {"name": "Maxim", "id": 5},
    ]))
}

pub fn advanced_persons() -> Vec<Record> {
    recs(json!([
        {"name": "Andrey", "id": 1, "age": 38},
        {"name": "Leonid", "id": 2, "age": 20},
        {"name": "Sergey", "id": 1, "age": 25},
        {"name": "Grigoroy", "id": 4, "age": 64},
        {"name": "Misha", "id": 1, "age": 5},
        {"name": "Roma", "id": 1, "age": 10},
        {"name": "Rishat", "id": 2, "age": 17},
        {"name": "Maxim", "id": 5, "age": 28},
        {"name": "Stepan", "id": 10, "age": 14},
    ]))
}

pub fn cities() -> Vec<Record> {
    recs(json!([
        {"id": 1, "name": "Mocsow"},
        {"id": 2, "name": "SPb"},
        {"id": 3, "name": "Kazan"},
        {"id": 7, "name": "Novgorod"},
        {"id": 10, "name": "Kaluga"},
        {"id": 12, "name": "Tula"},
    ]))
}

pub fn advanced_cities() -> Vec<Record> {
    recs(json!([
        {"id": 1, "city": "Mocsow"},
        {"id": 2, "city": "SPb"},
        {"id": 3, "city": "Kazan"},
        {"id": 7, "city": "Novgorod"},
        {"id": 10, "city": "Kaluga"},
        {"id": 12, "city": "Tula"},
    ]))
}

pub fn numbers() -> Vec<Record> {
    (1..=5).map(|a| rec(json!({ "a": a }))).collect()
}

/// Field names of a record, in stored order
pub fn field_names(record: &Record) -> Vec<&str> {
    record.keys().map(String::as_str).collect()
}
