//! Sort stage
//!
//! Provides stable multi-key sorting with per-key ascending/descending order.
//! The whole upstream is materialized before the first record is yielded.

use super::stream::{materialize_then, RecordStream};
use crate::error::{GraphError, Result};
use crate::record::{self, KeySet, Record};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use tracing::trace;

/// Sorting configuration
#[derive(Debug, Clone, PartialEq)]
pub struct Sorter {
    /// Keys to sort by, highest priority first
    pub keys: Vec<SortKey>,
}

impl Sorter {
    /// Sort ascending by each key in turn
    pub fn new(keys: impl Into<KeySet>) -> Result<Self> {
        let keys: Vec<SortKey> = keys
            .into()
            .into_vec()
            .into_iter()
            .map(|field| SortKey {
                field,
                order: SortOrder::Ascending,
            })
            .collect();

        if keys.is_empty() {
            return Err(GraphError::EmptySortKeys);
        }
        Ok(Self { keys })
    }

    /// Parse a sort specification string
    pub fn parse(spec: &str) -> Result<Self> {
        let mut keys = Vec::new();

        // Format: "field1 DESC, field2 ASC" or just "field1"
        for key_spec in spec.split(',') {
            let parts: Vec<&str> = key_spec.split_whitespace().collect();

            let order = match parts.as_slice() {
                [] => continue,
                [_] => SortOrder::Ascending,
                [_, order] => match order.to_uppercase().as_str() {
                    "ASC" | "ASCENDING" => SortOrder::Ascending,
                    "DESC" | "DESCENDING" => SortOrder::Descending,
                    other => {
                        return Err(GraphError::InvalidSortSpec(format!(
                            "unknown sort order '{other}' for field '{}'",
                            parts[0]
                        )))
                    }
                },
                _ => {
                    return Err(GraphError::InvalidSortSpec(format!(
                        "expected 'field [ASC|DESC]', found '{}'",
                        key_spec.trim()
                    )))
                }
            };

            keys.push(SortKey {
                field: parts[0].to_string(),
                order,
            });
        }

        if keys.is_empty() {
            return Err(GraphError::EmptySortKeys);
        }
        Ok(Self { keys })
    }

    /// Names of the sort keys, in priority order
    pub fn key_names(&self) -> Vec<String> {
        self.keys.iter().map(|k| k.field.clone()).collect()
    }

    /// Sort records in place; the sort is stable
    pub fn sort(&self, records: &mut [Record]) -> Result<()> {
        for record in records.iter() {
            for key in &self.keys {
                record::field(record, &key.field)?;
            }
        }
        records.sort_by(|a, b| self.compare_records(a, b));
        Ok(())
    }

    fn compare_records(&self, a: &Record, b: &Record) -> Ordering {
        for key in &self.keys {
            let ordering = match (a.get(&key.field), b.get(&key.field)) {
                (Some(x), Some(y)) => record::compare_values(x, y),
                _ => Ordering::Equal,
            };
            let ordering = match key.order {
                SortOrder::Ascending => ordering,
                SortOrder::Descending => ordering.reverse(),
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }

        Ordering::Equal
    }

    pub(crate) fn apply<'a>(&'a self, upstream: RecordStream<'a>) -> RecordStream<'a> {
        materialize_then(upstream, move |mut records| {
            self.sort(&mut records)?;
            trace!("Sorted {} records by {:?}", records.len(), self.key_names());
            Ok(records)
        })
    }
}

/// One sort key
#[derive(Debug, Clone, PartialEq)]
pub struct SortKey {
    /// Field to sort by
    pub field: String,
    /// Sort order
    pub order: SortOrder,
}

/// Sort order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortOrder {
    Ascending,
    Descending,
}
