use super::{field, first, number, split_words, top_scored};
use crate::error::Result;
use crate::join::JoinStrategy;
use crate::pipeline::{Pipeline, PipelineBuilder, RunOptions};
use crate::record::{from_pairs, KeySet, Record};
use crate::stage::Stage;
use serde_json::json;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

/// TF-IDF inverted index
///
/// Four pipelines: `split_words` and `count_docs` read the documents,
/// `count_idf` counts the documents each word occurs in, and `index` joins
/// per-document term frequencies against those counts. The output has one
/// `{word, index: [[doc_id, tf_idf], ...]}` record per word.
///
/// All four pipelines memoize their results, so a `TfIdf` instance indexes
/// one corpus; build a new one for another input.
#[derive(Debug, Clone)]
pub struct TfIdf {
    pub split_words: Pipeline,
    pub count_docs: Pipeline,
    pub count_idf: Pipeline,
    pub index: Pipeline,
}

impl TfIdf {
    /// `top` is the number of documents kept per word
    pub fn build(top: usize) -> Result<Self> {
        let split_words = PipelineBuilder::deferred()
            .name("split_words")
            .then(Stage::map(split_words).named("tokenizer"))
            .build()?;

        let count_docs = PipelineBuilder::deferred()
            .name("count_docs")
            .fold(from_pairs([("docs_count", json!(0))]), |state: Record, _: &Record| {
                let count = number(&state, "docs_count")? as u64;
                Ok(from_pairs([("docs_count", json!(count + 1))]))
            })
            .build()?;

        let count_idf = PipelineBuilder::from_pipeline(&split_words)
            .name("count_idf")
            .sort(["doc_id", "word"])
            .reduce(["doc_id", "word"], |rows: &[Record]| Ok(vec![first(rows)?.clone()]))
            .join(&count_docs, KeySet::none(), JoinStrategy::Outer)
            .sort("word")
            .reduce("word", |rows: &[Record]| {
                let row = first(rows)?;
                Ok(vec![from_pairs([
                    ("word", field(row, "word")?),
                    ("count_idf", json!(rows.len())),
                    ("docs_count", field(row, "docs_count")?),
                ])])
            })
            .build()?;

        let index = PipelineBuilder::from_pipeline(&split_words)
            .name("tf_idf")
            .sort("doc_id")
            .reduce("doc_id", term_frequency)
            .join(&count_idf, "word", JoinStrategy::Left)
            .reduce("word", move |rows: &[Record]| invert_index(rows, top))
            .build()?;

        Ok(Self {
            split_words,
            count_docs,
            count_idf,
            index,
        })
    }

    /// Run options feeding `input` to both document readers
    pub fn options(&self, input: &Path) -> RunOptions {
        RunOptions::new()
            .with_dependency_input(&self.split_words, input)
            .with_dependency_input(&self.count_docs, input)
    }

    pub fn run(&self, input: &Path) -> Result<Arc<Vec<Record>>> {
        self.index.run_with(&self.options(input))
    }
}

/// `{doc_id, word, tf}` for every distinct word of one document
fn term_frequency(rows: &[Record]) -> anyhow::Result<Vec<Record>> {
    let doc_id = field(first(rows)?, "doc_id")?;
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for row in rows {
        let word = field(row, "word")?;
        *counts.entry(word.as_str().unwrap_or_default().to_string()).or_default() += 1;
    }

    let total = rows.len() as f64;
    Ok(counts
        .into_iter()
        .map(|(word, count)| {
            from_pairs([
                ("doc_id", doc_id.clone()),
                ("word", json!(word)),
                ("tf", json!(count as f64 / total)),
            ])
        })
        .collect())
}

fn invert_index(rows: &[Record], top: usize) -> anyhow::Result<Vec<Record>> {
    let word = field(first(rows)?, "word")?;
    let mut scored = Vec::with_capacity(rows.len());
    for row in rows {
        let idf = (number(row, "docs_count")? / number(row, "count_idf")?).ln();
        scored.push((field(row, "doc_id")?, number(row, "tf")? * idf));
    }
    Ok(vec![from_pairs([("word", word), ("index", top_scored(scored, top))])])
}
