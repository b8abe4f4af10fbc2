//! Sort-merge join
//!
//! A [`Joiner`] stage joins its upstream (the right side) against the cached
//! result of another pipeline (always the left side). Both sides are
//! materialized, concatenated left-then-right, stably sorted by the join key
//! and split into runs of equal keys. Every buffered record carries an
//! explicit side tag, so a run is classified by which sides it contains
//! rather than by the shape of its records.
//!
//! Fields present on both sides (other than the join keys) are renamed to
//! `left_<field>` and `right_<field>` before merging. Output records always
//! list their fields alphabetically.

use crate::error::{GraphError, Result};
use crate::pipeline::Pipeline;
use crate::record::{self, KeySet, Record};
use crate::stage::stream::{materialize_then, RecordStream};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use tracing::{debug, trace};

/// Which unmatched records a join emits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JoinStrategy {
    /// Only keys present on both sides
    Inner,
    /// Every left record, padded with nulls when unmatched
    Left,
    /// Every right record, padded with nulls when unmatched
    Right,
    /// Every record from both sides
    Outer,
    /// Cartesian product, keys ignored
    Cross,
}

impl JoinStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Inner => "inner",
            Self::Left => "left",
            Self::Right => "right",
            Self::Outer => "outer",
            Self::Cross => "cross",
        }
    }

    fn keeps_unmatched(&self, side: Side) -> bool {
        matches!(
            (self, side),
            (Self::Left, Side::Left) | (Self::Right, Side::Right) | (Self::Outer, _)
        )
    }
}

impl fmt::Display for JoinStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JoinStrategy {
    type Err = GraphError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "inner" => Ok(Self::Inner),
            "left" => Ok(Self::Left),
            "right" => Ok(Self::Right),
            "outer" => Ok(Self::Outer),
            "cross" => Ok(Self::Cross),
            other => Err(GraphError::UnknownStrategy(other.to_string())),
        }
    }
}

/// Join stage configuration
#[derive(Debug, Clone)]
pub struct Joiner {
    left: Pipeline,
    keys: Vec<String>,
    strategy: JoinStrategy,
}

impl Joiner {
    /// An outer join with no keys becomes a cross join.
    pub fn new(left: &Pipeline, keys: impl Into<KeySet>, strategy: JoinStrategy) -> Self {
        let keys = keys.into().into_vec();
        let strategy = if keys.is_empty() && strategy == JoinStrategy::Outer {
            debug!("Outer join without keys against {} runs as cross join", left.label());
            JoinStrategy::Cross
        } else {
            strategy
        };

        Self {
            left: left.clone(),
            keys,
            strategy,
        }
    }

    pub fn left(&self) -> &Pipeline {
        &self.left
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    /// The strategy actually used, after the outer-to-cross rule
    pub fn strategy(&self) -> JoinStrategy {
        self.strategy
    }

    pub(crate) fn apply<'a>(&'a self, upstream: RecordStream<'a>) -> RecordStream<'a> {
        materialize_then(upstream, move |right| {
            let left = self.left.result().ok_or_else(|| GraphError::NotComputed {
                pipeline: self.left.label(),
            })?;
            join_records(&left, right, &self.keys, self.strategy)
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Left,
    Right,
}

/// Join two record lists
///
/// `left` is borrowed and copied, never modified; `right` is consumed.
pub fn join_records(
    left: &[Record],
    right: Vec<Record>,
    keys: &[String],
    strategy: JoinStrategy,
) -> Result<Vec<Record>> {
    let mut left = left.to_vec();
    let mut right = right;

    let common: BTreeSet<String> = schema(&left)
        .intersection(&schema(&right))
        .filter(|field| !keys.contains(field))
        .cloned()
        .collect();
    if !common.is_empty() {
        debug!("Renaming columns present on both join sides: {:?}", common);
        rename_fields(&mut left, &common, "left_");
        rename_fields(&mut right, &common, "right_");
    }

    let left_schema = schema(&left);
    let right_schema = schema(&right);
    let right_only: Vec<String> = right_schema.difference(&left_schema).cloned().collect();
    let left_only: Vec<String> = left_schema.difference(&right_schema).cloned().collect();

    let joined = if strategy == JoinStrategy::Cross {
        cross_product(&left, &right)
    } else {
        merge_join(left, right, keys, strategy, &left_only, &right_only)?
    };
    trace!("{} join produced {} records", strategy, joined.len());
    Ok(joined)
}

fn merge_join(
    left: Vec<Record>,
    right: Vec<Record>,
    keys: &[String],
    strategy: JoinStrategy,
    left_only: &[String],
    right_only: &[String],
) -> Result<Vec<Record>> {
    for record in left.iter().chain(right.iter()) {
        record::key_of(record, keys)?;
    }

    let mut tagged: Vec<(Side, Record)> = left
        .into_iter()
        .map(|r| (Side::Left, r))
        .chain(right.into_iter().map(|r| (Side::Right, r)))
        .collect();
    tagged.sort_by(|a, b| record::compare_by_keys(&a.1, &b.1, keys));

    let mut output = Vec::new();
    for group in tagged.chunk_by(|a, b| same_key(&a.1, &b.1, keys)) {
        let lefts: Vec<&Record> = side_records(group, Side::Left);
        let rights: Vec<&Record> = side_records(group, Side::Right);

        match (lefts.is_empty(), rights.is_empty()) {
            (false, false) => {
                for l in &lefts {
                    for r in &rights {
                        output.push(merge(l, r));
                    }
                }
            }
            (false, true) if strategy.keeps_unmatched(Side::Left) => {
                output.extend(lefts.into_iter().map(|l| pad(l, right_only)));
            }
            (true, false) if strategy.keeps_unmatched(Side::Right) => {
                output.extend(rights.into_iter().map(|r| pad(r, left_only)));
            }
            _ => {}
        }
    }
    Ok(output)
}

fn cross_product(left: &[Record], right: &[Record]) -> Vec<Record> {
    left.iter()
        .flat_map(|l| right.iter().map(move |r| merge(l, r)))
        .collect()
}

fn side_records(group: &[(Side, Record)], side: Side) -> Vec<&Record> {
    group
        .iter()
        .filter(|(s, _)| *s == side)
        .map(|(_, r)| r)
        .collect()
}

fn same_key(a: &Record, b: &Record, keys: &[String]) -> bool {
    record::compare_by_keys(a, b, keys) == Ordering::Equal
}

/// Right fields extend and overwrite the left record
fn merge(left: &Record, right: &Record) -> Record {
    let mut merged = left.clone();
    for (field, value) in right {
        merged.insert(field.clone(), value.clone());
    }
    record::sorted_fields(merged)
}

fn pad(record: &Record, missing: &[String]) -> Record {
    let mut padded = record.clone();
    for field in missing {
        padded.entry(field.clone()).or_insert(Value::Null);
    }
    record::sorted_fields(padded)
}

fn schema(records: &[Record]) -> BTreeSet<String> {
    records
        .iter()
        .flat_map(|r| r.keys().cloned())
        .collect()
}

fn rename_fields(records: &mut [Record], fields: &BTreeSet<String>, prefix: &str) {
    for record in records.iter_mut() {
        let original = std::mem::take(record);
        *record = original
            .into_iter()
            .map(|(name, value)| {
                if fields.contains(&name) {
                    (format!("{prefix}{name}"), value)
                } else {
                    (name, value)
                }
            })
            .collect();
    }
}
