//! Dependency scheduling between pipelines
//!
//! A pipeline depends on every pipeline its join stages read from and on the
//! pipeline its source replays. Dependencies have to be computed before the
//! pipeline that consumes them; [`dependency_order`] gives that order.

use crate::error::{GraphError, Result};
use crate::pipeline::{Pipeline, PipelineId};
use std::collections::HashSet;
use tracing::debug;

/// Order the transitive dependencies of a pipeline so that every pipeline
/// appears after all pipelines it depends on
///
/// Depth-first post-order over `direct`. A pipeline shared by several
/// branches is listed once, at its first completed visit.
pub fn dependency_order(direct: &[Pipeline]) -> Result<Vec<Pipeline>> {
    let mut visited = HashSet::new();
    let mut in_progress = HashSet::new();
    let mut order = Vec::new();

    for pipeline in direct {
        visit(pipeline, &mut visited, &mut in_progress, &mut order)?;
    }

    debug!(
        "Dependency order: [{}]",
        order
            .iter()
            .map(Pipeline::label)
            .collect::<Vec<_>>()
            .join(", ")
    );
    Ok(order)
}

fn visit(
    pipeline: &Pipeline,
    visited: &mut HashSet<PipelineId>,
    in_progress: &mut HashSet<PipelineId>,
    order: &mut Vec<Pipeline>,
) -> Result<()> {
    let id = pipeline.id();
    if in_progress.contains(&id) {
        return Err(GraphError::CircularDependency(pipeline.label()));
    }
    if visited.contains(&id) {
        return Ok(());
    }

    in_progress.insert(id);
    for dependency in pipeline.dependencies() {
        visit(dependency, visited, in_progress, order)?;
    }
    in_progress.remove(&id);

    visited.insert(id);
    order.push(pipeline.clone());
    Ok(())
}
