use super::{field, first, split_words};
use crate::error::Result;
use crate::pipeline::{Pipeline, PipelineBuilder};
use crate::record::{from_pairs, Record};
use crate::stage::Stage;
use serde_json::json;

/// Count occurrences of every word across all documents
///
/// Output: `{word, count}` sorted by word.
pub fn word_count() -> Result<Pipeline> {
    PipelineBuilder::deferred()
        .name("word_count")
        .then(Stage::map(split_words).named("tokenizer"))
        .sort("word")
        .reduce("word", |rows: &[Record]| {
            let word = field(first(rows)?, "word")?;
            Ok(vec![from_pairs([("word", word), ("count", json!(rows.len()))])])
        })
        .build()
}
