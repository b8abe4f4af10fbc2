use super::{Pipeline, StageChain, StageId};
use crate::error::{GraphError, Result};
use crate::join::JoinStrategy;
use crate::record::{KeySet, Record};
use crate::stage::{Sorter, Source, Stage};
use std::path::PathBuf;

/// Fluent builder for linear pipelines
///
/// Each call appends one stage after the current tail. The first failure is
/// remembered and returned from [`PipelineBuilder::build`]; later calls are
/// ignored once a failure has been recorded.
///
/// ```
/// use graphflow::pipeline::PipelineBuilder;
/// use graphflow::record::from_pairs;
/// use serde_json::json;
///
/// let pipeline = PipelineBuilder::from_records(vec![
///     from_pairs([("word", json!("b"))]),
///     from_pairs([("word", json!("a"))]),
/// ])
/// .sort("word")
/// .build()
/// .unwrap();
///
/// let output = pipeline.run().unwrap();
/// assert_eq!(output[0]["word"], json!("a"));
/// ```
#[derive(Debug)]
pub struct PipelineBuilder {
    chain: StageChain,
    source: StageId,
    tail: StageId,
    name: Option<String>,
    error: Option<GraphError>,
}

impl PipelineBuilder {
    pub fn new(source: Source) -> Self {
        let mut chain = StageChain::new();
        let source = chain.add(Stage::source(source));
        Self {
            chain,
            source,
            tail: source,
            name: None,
            error: None,
        }
    }

    pub fn from_records(records: Vec<Record>) -> Self {
        Self::new(Source::records(records))
    }

    pub fn from_file(path: impl Into<PathBuf>) -> Self {
        Self::new(Source::file(path))
    }

    /// Replay the result of another pipeline
    pub fn from_pipeline(pipeline: &Pipeline) -> Self {
        Self::new(Source::pipeline(pipeline))
    }

    /// Read from a file given at run time
    pub fn deferred() -> Self {
        Self::new(Source::deferred())
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Append any stage
    pub fn then(mut self, stage: Stage) -> Self {
        if self.error.is_some() {
            return self;
        }
        match self.chain.attach(self.tail, stage) {
            Ok(id) => self.tail = id,
            Err(e) => self.error = Some(e),
        }
        self
    }

    pub fn map<F>(self, operation: F) -> Self
    where
        F: Fn(&Record) -> anyhow::Result<Vec<Record>> + Send + Sync + 'static,
    {
        self.then(Stage::map(operation))
    }

    pub fn sort(self, keys: impl Into<KeySet>) -> Self {
        self.then_result(Stage::sort(keys))
    }

    /// Sort by a specification like `"id, age DESC"`
    pub fn sort_by_spec(self, spec: &str) -> Self {
        self.then_result(Sorter::parse(spec).map(Stage::sorter))
    }

    pub fn reduce<F>(self, keys: impl Into<KeySet>, operation: F) -> Self
    where
        F: Fn(&[Record]) -> anyhow::Result<Vec<Record>> + Send + Sync + 'static,
    {
        self.then(Stage::reduce(keys, operation))
    }

    pub fn fold<F>(self, initial: Record, operation: F) -> Self
    where
        F: Fn(Record, &Record) -> anyhow::Result<Record> + Send + Sync + 'static,
    {
        self.then(Stage::fold(initial, operation))
    }

    /// Join the records built so far (right side) against `left`
    pub fn join(self, left: &Pipeline, keys: impl Into<KeySet>, strategy: JoinStrategy) -> Self {
        self.then(Stage::join(left, keys, strategy))
    }

    pub fn build(self) -> Result<Pipeline> {
        if let Some(error) = self.error {
            return Err(error);
        }
        Pipeline::from_chain(self.chain, self.source, self.tail, self.name)
    }

    fn then_result(mut self, stage: Result<Stage>) -> Self {
        match stage {
            Ok(stage) => self.then(stage),
            Err(e) => {
                self.error.get_or_insert(e);
                self
            }
        }
    }
}
