//! Stages of a processing chain
//!
//! A [`Stage`] is one step of a pipeline: a source, a per-record map, a sort,
//! a grouped reduce, a fold, or a join against another pipeline. Every
//! non-source stage turns its upstream [`RecordStream`] into a new lazy
//! stream; stages that need their whole input wait until the first pull.

mod accumulator;
mod reducer;
mod sorter;
mod source;
pub mod stream;
mod transform;

pub use accumulator::Accumulator;
pub use reducer::GroupReducer;
pub use sorter::{SortKey, SortOrder, Sorter};
pub use source::Source;
pub use stream::RecordStream;
pub use transform::Transform;

use crate::error::{GraphError, Result};
use crate::join::{JoinStrategy, Joiner};
use crate::pipeline::Pipeline;
use crate::record::{KeySet, Record};
use std::fmt;
use std::sync::Arc;

/// Per-record map callback
pub type MapFn = Arc<dyn Fn(&Record) -> anyhow::Result<Vec<Record>> + Send + Sync>;

/// Group callback, called once per group of key-equal records
pub type ReduceFn = Arc<dyn Fn(&[Record]) -> anyhow::Result<Vec<Record>> + Send + Sync>;

/// Fold callback producing the next state from the current state and a record
pub type FoldFn = Arc<dyn Fn(Record, &Record) -> anyhow::Result<Record> + Send + Sync>;

/// The closed set of stage variants
#[derive(Debug, Clone)]
pub enum StageKind {
    Source(Source),
    Transform(Transform),
    Sorter(Sorter),
    GroupReducer(GroupReducer),
    Accumulator(Accumulator),
    Joiner(Joiner),
}

impl StageKind {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Source(_) => "source",
            Self::Transform(_) => "map",
            Self::Sorter(_) => "sort",
            Self::GroupReducer(_) => "reduce",
            Self::Accumulator(_) => "fold",
            Self::Joiner(_) => "join",
        }
    }
}

/// One step of a processing chain, optionally named
#[derive(Debug, Clone)]
pub struct Stage {
    name: Option<String>,
    kind: StageKind,
}

impl Stage {
    pub fn new(kind: StageKind) -> Self {
        Self { name: None, kind }
    }

    pub fn source(source: Source) -> Self {
        Self::new(StageKind::Source(source))
    }

    pub fn map<F>(operation: F) -> Self
    where
        F: Fn(&Record) -> anyhow::Result<Vec<Record>> + Send + Sync + 'static,
    {
        Self::new(StageKind::Transform(Transform::new(Arc::new(operation))))
    }

    /// Ascending sort by one or more keys; an empty key set is rejected
    pub fn sort(keys: impl Into<KeySet>) -> Result<Self> {
        Ok(Self::new(StageKind::Sorter(Sorter::new(keys)?)))
    }

    pub fn sorter(sorter: Sorter) -> Self {
        Self::new(StageKind::Sorter(sorter))
    }

    /// Grouped reduce over input already sorted by `keys`
    ///
    /// With no keys the whole stream is passed to `operation` as one group.
    pub fn reduce<F>(keys: impl Into<KeySet>, operation: F) -> Self
    where
        F: Fn(&[Record]) -> anyhow::Result<Vec<Record>> + Send + Sync + 'static,
    {
        Self::new(StageKind::GroupReducer(GroupReducer::new(
            keys.into().into_vec(),
            Arc::new(operation),
        )))
    }

    pub fn fold<F>(initial: Record, operation: F) -> Self
    where
        F: Fn(Record, &Record) -> anyhow::Result<Record> + Send + Sync + 'static,
    {
        Self::new(StageKind::Accumulator(Accumulator::new(
            initial,
            Arc::new(operation),
        )))
    }

    /// Join the upstream (right side) against the result of `left`
    pub fn join(left: &Pipeline, keys: impl Into<KeySet>, strategy: JoinStrategy) -> Self {
        Self::new(StageKind::Joiner(Joiner::new(left, keys, strategy)))
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn kind(&self) -> &StageKind {
        &self.kind
    }

    pub fn is_source(&self) -> bool {
        matches!(self.kind, StageKind::Source(_))
    }

    /// Human-readable description used in logs and errors
    pub fn label(&self) -> String {
        match &self.name {
            Some(name) => format!("{} '{}'", self.kind.kind_name(), name),
            None => format!("{} stage", self.kind.kind_name()),
        }
    }

    /// The pipeline whose cached result this stage reads, if any
    pub fn dependency(&self) -> Option<&Pipeline> {
        match &self.kind {
            StageKind::Source(source) => source.upstream_pipeline(),
            StageKind::Joiner(joiner) => Some(joiner.left()),
            _ => None,
        }
    }

    /// Wrap the upstream stream with this stage's processing
    pub(crate) fn apply<'a>(&'a self, upstream: RecordStream<'a>) -> Result<RecordStream<'a>> {
        let label = self.label();
        match &self.kind {
            StageKind::Source(_) => Err(GraphError::SourceNotFirst { upstream: label }),
            StageKind::Transform(transform) => Ok(transform.apply(upstream, label)),
            StageKind::Sorter(sorter) => Ok(sorter.apply(upstream)),
            StageKind::GroupReducer(reducer) => Ok(reducer.apply(upstream, label)),
            StageKind::Accumulator(accumulator) => Ok(accumulator.apply(upstream, label)),
            StageKind::Joiner(joiner) => Ok(joiner.apply(upstream)),
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

impl fmt::Debug for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transform").finish_non_exhaustive()
    }
}

impl fmt::Debug for GroupReducer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GroupReducer")
            .field("keys", &self.keys())
            .finish_non_exhaustive()
    }
}

impl fmt::Debug for Accumulator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Accumulator")
            .field("initial", self.initial_state())
            .finish_non_exhaustive()
    }
}
