use super::{field, first, number, text, tokenize, top_scored};
use crate::error::Result;
use crate::pipeline::{Pipeline, PipelineBuilder};
use crate::record::{from_pairs, KeySet, Record};
use crate::stage::Stage;
use serde_json::json;

/// Top words of every document by pointwise mutual information
///
/// Only words of at least `min_word_length` letters that occur at least
/// twice in every document are scored. Output: one
/// `{doc_id, top_words: [[word, pmi], ...]}` record per document, at most
/// `top` words each, best first.
pub fn pmi(top: usize, min_word_length: usize) -> Result<Pipeline> {
    PipelineBuilder::deferred()
        .name("pmi")
        .reduce(KeySet::none(), |rows: &[Record]| {
            Ok(annotate(rows, "number_of_docs", json!(rows.len())))
        })
        .then(
            Stage::map(move |row: &Record| -> anyhow::Result<Vec<Record>> {
                let doc_id = field(row, "doc_id")?;
                let number_of_docs = field(row, "number_of_docs")?;
                Ok(tokenize(text(row)?)
                    .into_iter()
                    .filter(|word| word.len() >= min_word_length)
                    .map(|word| {
                        from_pairs([
                            ("doc_id", doc_id.clone()),
                            ("number_of_docs", number_of_docs.clone()),
                            ("word", json!(word)),
                        ])
                    })
                    .collect())
            })
            .named("tokenizer"),
        )
        .sort(["word", "doc_id"])
        .reduce(["word", "doc_id"], |rows: &[Record]| {
            let mut row = first(rows)?.clone();
            row.insert("number_in_doc".to_string(), json!(rows.len()));
            Ok(vec![row])
        })
        .reduce("word", |rows: &[Record]| {
            let number_of_docs = number(first(rows)?, "number_of_docs")?;
            let mut sum_of_docs = 0.0;
            for row in rows {
                let in_doc = number(row, "number_in_doc")?;
                if in_doc < 2.0 {
                    return Ok(Vec::new());
                }
                sum_of_docs += in_doc;
            }
            if (rows.len() as f64) < number_of_docs {
                return Ok(Vec::new());
            }
            Ok(annotate(rows, "sum_of_docs", json!(sum_of_docs as u64)))
        })
        .sort("doc_id")
        .reduce("doc_id", |rows: &[Record]| {
            let words_in_doc = sum(rows, "number_in_doc")?;
            Ok(annotate(rows, "words_in_doc", json!(words_in_doc as u64)))
        })
        .reduce(KeySet::none(), |rows: &[Record]| {
            let words_in_total = sum(rows, "words_in_doc")?;
            Ok(annotate(rows, "words_in_total", json!(words_in_total as u64)))
        })
        .reduce("doc_id", move |rows: &[Record]| {
            let doc_id = field(first(rows)?, "doc_id")?;
            let mut scored = Vec::with_capacity(rows.len());
            for row in rows {
                let score = (number(row, "number_in_doc")? * number(row, "words_in_total")?
                    / number(row, "sum_of_docs")?
                    / number(row, "words_in_doc")?)
                    .ln();
                scored.push((field(row, "word")?, score));
            }
            Ok(vec![from_pairs([
                ("doc_id", doc_id),
                ("top_words", top_scored(scored, top)),
            ])])
        })
        .build()
}

/// Copy of `rows` with `name` set to `value` on each
fn annotate(rows: &[Record], name: &str, value: serde_json::Value) -> Vec<Record> {
    rows.iter()
        .map(|row| {
            let mut row = row.clone();
            row.insert(name.to_string(), value.clone());
            row
        })
        .collect()
}

fn sum(rows: &[Record], name: &str) -> anyhow::Result<f64> {
    rows.iter().map(|row| number(row, name)).sum()
}
