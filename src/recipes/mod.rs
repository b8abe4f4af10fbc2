//! Text-processing pipelines built on the public API
//!
//! Every recipe reads documents shaped like `{"doc_id": ..., "text": "..."}`
//! from a file supplied at run time.

mod pmi;
mod tf_idf;
mod word_count;

pub use pmi::pmi;
pub use tf_idf::TfIdf;
pub use word_count::word_count;

use crate::record::{self, from_pairs, Record};
use anyhow::{anyhow, Context};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{json, Value};

static NON_LETTERS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^A-Za-z]+").expect("Invalid tokenizer pattern"));

/// Split text into lowercase words made of ASCII letters only
pub fn tokenize(text: &str) -> Vec<String> {
    NON_LETTERS
        .replace_all(text, " ")
        .split_whitespace()
        .map(str::to_lowercase)
        .collect()
}

/// One `{doc_id, word}` record per token of the document's `text` field
pub fn split_words(document: &Record) -> anyhow::Result<Vec<Record>> {
    let doc_id = field(document, "doc_id")?;
    Ok(tokenize(text(document)?)
        .into_iter()
        .map(|word| from_pairs([("doc_id", doc_id.clone()), ("word", json!(word))]))
        .collect())
}

fn field(record: &Record, name: &str) -> anyhow::Result<Value> {
    Ok(record::field(record, name)?.clone())
}

fn text(record: &Record) -> anyhow::Result<&str> {
    record::field(record, "text")?
        .as_str()
        .ok_or_else(|| anyhow!("field 'text' is not a string"))
}

fn number(record: &Record, name: &str) -> anyhow::Result<f64> {
    record::field(record, name)?
        .as_f64()
        .with_context(|| format!("field '{name}' is not a number"))
}

fn first(records: &[Record]) -> anyhow::Result<&Record> {
    records.first().context("empty group")
}

/// Descending by score, keeping the first `top` entries
fn top_scored(mut scored: Vec<(Value, f64)>, top: usize) -> Value {
    scored.sort_by(|a, b| b.1.total_cmp(&a.1));
    scored.truncate(top);
    Value::Array(
        scored
            .into_iter()
            .map(|(label, score)| json!([label, score]))
            .collect(),
    )
}
