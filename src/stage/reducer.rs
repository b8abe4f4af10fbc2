//! Grouped reduce stage
//!
//! The upstream must already be ordered by the grouping keys; consecutive
//! records with equal key values form one group. The stage never re-sorts.

use super::stream::{materialize_then, RecordStream};
use super::ReduceFn;
use crate::error::{GraphError, Result};
use crate::record::{self, Record};
use serde_json::Value;
use std::cmp::Ordering;
use tracing::trace;

#[derive(Clone)]
pub struct GroupReducer {
    keys: Vec<String>,
    operation: ReduceFn,
}

impl GroupReducer {
    pub fn new(keys: Vec<String>, operation: ReduceFn) -> Self {
        Self { keys, operation }
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    pub(crate) fn apply<'a>(&'a self, upstream: RecordStream<'a>, label: String) -> RecordStream<'a> {
        if self.keys.is_empty() {
            return materialize_then(upstream, move |records| {
                trace!("{} reducing whole stream of {} records", label, records.len());
                reduce_group(&self.operation, &records, &label)
            });
        }

        Box::new(Groups {
            upstream,
            keys: &self.keys,
            operation: &self.operation,
            label,
            buffer: Vec::new(),
            current_key: None,
            pending: Vec::new().into_iter(),
            finished: false,
        })
    }
}

fn reduce_group(operation: &ReduceFn, group: &[Record], label: &str) -> Result<Vec<Record>> {
    operation(group).map_err(|source| GraphError::Operation {
        stage: label.to_string(),
        source,
    })
}

/// Streams groups of key-equal consecutive records through the reduce callback
struct Groups<'a> {
    upstream: RecordStream<'a>,
    keys: &'a [String],
    operation: &'a ReduceFn,
    label: String,
    buffer: Vec<Record>,
    current_key: Option<Vec<Value>>,
    pending: std::vec::IntoIter<Record>,
    finished: bool,
}

impl Groups<'_> {
    fn flush(&mut self) -> Result<()> {
        let group = std::mem::take(&mut self.buffer);
        if group.is_empty() {
            return Ok(());
        }
        trace!("{} reducing group of {} records", self.label, group.len());
        self.pending = reduce_group(self.operation, &group, &self.label)?.into_iter();
        Ok(())
    }

    fn fail(&mut self, error: GraphError) -> Option<Result<Record>> {
        self.finished = true;
        self.buffer.clear();
        Some(Err(error))
    }
}

impl Iterator for Groups<'_> {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(record) = self.pending.next() {
                return Some(Ok(record));
            }
            if self.finished {
                return None;
            }

            match self.upstream.next() {
                Some(Ok(record)) => {
                    let key = match record::key_of(&record, self.keys) {
                        Ok(key) => key,
                        Err(e) => return self.fail(e),
                    };
                    let same_group = self
                        .current_key
                        .as_deref()
                        .is_some_and(|current| {
                            record::compare_keys(current, &key) == Ordering::Equal
                        });
                    if !same_group {
                        if let Err(e) = self.flush() {
                            return self.fail(e);
                        }
                        self.current_key = Some(key);
                    }
                    self.buffer.push(record);
                }
                Some(Err(e)) => return self.fail(e),
                None => {
                    self.finished = true;
                    if let Err(e) = self.flush() {
                        return Some(Err(e));
                    }
                }
            }
        }
    }
}
