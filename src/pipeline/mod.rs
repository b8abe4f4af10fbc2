//! Runnable pipelines
//!
//! A [`Pipeline`] is an immutable chain of stages from one source to one
//! terminal stage, plus the pipelines it depends on and a memoized result.
//! Pipelines are cheap to clone: every clone is a handle to the same chain
//! and the same cache, and identity is a [`PipelineId`].
//!
//! Pipelines are assembled with a [`PipelineBuilder`] for the common linear
//! case, or from an explicit [`StageChain`] with [`Pipeline::from_chain`].

mod builder;
mod chain;
mod run;

pub use builder::PipelineBuilder;
pub use chain::{StageChain, StageId};
pub use run::RunOptions;

use crate::error::{GraphError, Result};
use crate::record::Record;
use crate::scheduler;
use crate::stage::{Source, Stage, StageKind};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::debug;

static NEXT_PIPELINE_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of a pipeline, shared by all of its handles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PipelineId(u64);

impl PipelineId {
    fn next() -> Self {
        Self(NEXT_PIPELINE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for PipelineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Clone)]
pub struct Pipeline {
    inner: Arc<Inner>,
}

struct Inner {
    id: PipelineId,
    name: Option<String>,
    /// Source first, terminal last
    stages: Vec<Stage>,
    dependencies: Vec<Pipeline>,
    order: Vec<Pipeline>,
    result: RwLock<Option<Arc<Vec<Record>>>>,
}

impl Pipeline {
    /// Start a linear pipeline from `source`
    pub fn builder(source: Source) -> PipelineBuilder {
        PipelineBuilder::new(source)
    }

    /// Build a pipeline from the stages between `source` and `terminal`
    ///
    /// Walks input links back from `terminal`; every stage on the way must
    /// have an input until `source` is reached. Stages of `chain` that are not
    /// on that path are dropped.
    pub fn from_chain(
        chain: StageChain,
        source: StageId,
        terminal: StageId,
        name: Option<String>,
    ) -> Result<Self> {
        let first = chain.stage(source)?;
        if !first.is_source() {
            return Err(GraphError::NotASource {
                stage: first.label(),
            });
        }

        let path = chain.path_to(source, terminal)?;
        let stages = chain.into_stages(&path);

        let mut dependencies: Vec<Pipeline> = Vec::new();
        for dependency in stages.iter().filter_map(Stage::dependency) {
            if !dependencies.iter().any(|known| known.id() == dependency.id()) {
                dependencies.push(dependency.clone());
            }
        }
        let order = scheduler::dependency_order(&dependencies)?;

        let pipeline = Self {
            inner: Arc::new(Inner {
                id: PipelineId::next(),
                name,
                stages,
                dependencies,
                order,
                result: RwLock::new(None),
            }),
        };
        debug!(
            "Built {} with {} stages and {} dependencies",
            pipeline.label(),
            pipeline.inner.stages.len(),
            pipeline.inner.order.len()
        );
        Ok(pipeline)
    }

    pub fn id(&self) -> PipelineId {
        self.inner.id
    }

    pub fn name(&self) -> Option<&str> {
        self.inner.name.as_deref()
    }

    /// The name, or the id when unnamed
    pub fn label(&self) -> String {
        match &self.inner.name {
            Some(name) => name.clone(),
            None => format!("pipeline {}", self.inner.id),
        }
    }

    /// Stages in execution order, source first
    pub fn stages(&self) -> &[Stage] {
        &self.inner.stages
    }

    pub fn source(&self) -> Option<&Source> {
        match self.inner.stages.first().map(Stage::kind) {
            Some(StageKind::Source(source)) => Some(source),
            _ => None,
        }
    }

    /// Pipelines read directly by this pipeline's stages
    pub fn dependencies(&self) -> &[Pipeline] {
        &self.inner.dependencies
    }

    /// All transitive dependencies, in a safe compute order
    pub fn execution_order(&self) -> &[Pipeline] {
        &self.inner.order
    }

    /// The memoized result, if this pipeline has been run
    pub fn result(&self) -> Option<Arc<Vec<Record>>> {
        self.inner
            .result
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn is_computed(&self) -> bool {
        self.inner
            .result
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    pub(crate) fn publish(&self, records: Vec<Record>) -> Arc<Vec<Record>> {
        let records = Arc::new(records);
        *self
            .inner
            .result
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(Arc::clone(&records));
        records
    }
}

impl PartialEq for Pipeline {
    fn eq(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}

impl Eq for Pipeline {}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("id", &self.inner.id)
            .field("name", &self.inner.name)
            .field(
                "stages",
                &self.inner.stages.iter().map(Stage::label).collect::<Vec<_>>(),
            )
            .field(
                "dependencies",
                &self.inner.dependencies.iter().map(Pipeline::id).collect::<Vec<_>>(),
            )
            .field("computed", &self.is_computed())
            .finish()
    }
}

impl fmt::Display for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}
