//! Stage wiring
//!
//! A [`StageChain`] is an arena of stages linked by input/output edges. Each
//! stage has at most one input and one output, so a connected component is
//! a simple chain. Links are only editable until the chain is turned into a
//! [`super::Pipeline`], which takes ownership of the stages on the path from
//! the source to the terminal stage.

use crate::error::{GraphError, Result};
use crate::stage::Stage;
use std::fmt;
use tracing::trace;

/// Handle to a stage inside a [`StageChain`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StageId(usize);

impl StageId {
    pub fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Display for StageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug)]
struct Node {
    stage: Stage,
    input: Option<StageId>,
    output: Option<StageId>,
}

#[derive(Debug, Default)]
pub struct StageChain {
    nodes: Vec<Node>,
}

impl StageChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an unconnected stage
    pub fn add(&mut self, stage: Stage) -> StageId {
        let id = StageId(self.nodes.len());
        trace!("Added {} as stage {}", stage.label(), id);
        self.nodes.push(Node {
            stage,
            input: None,
            output: None,
        });
        id
    }

    /// Add `stage` and connect it downstream of `upstream`, returning the new id
    pub fn attach(&mut self, upstream: StageId, stage: Stage) -> Result<StageId> {
        let upstream_node = self.node(upstream)?;
        if stage.is_source() {
            return Err(GraphError::SourceNotFirst {
                upstream: upstream_node.stage.label(),
            });
        }
        if upstream_node.output.is_some() {
            return Err(GraphError::AlreadyConnected {
                stage: upstream_node.stage.label(),
            });
        }

        let id = self.add(stage);
        self.link(upstream, id);
        Ok(id)
    }

    /// Connect two stages already in the chain
    pub fn connect(&mut self, upstream: StageId, downstream: StageId) -> Result<()> {
        let up = self.node(upstream)?;
        let down = self.node(downstream)?;

        if down.stage.is_source() {
            return Err(GraphError::SourceNotFirst {
                upstream: up.stage.label(),
            });
        }
        if up.output.is_some() {
            return Err(GraphError::AlreadyConnected {
                stage: up.stage.label(),
            });
        }
        if down.input.is_some() {
            return Err(GraphError::AlreadyConnected {
                stage: down.stage.label(),
            });
        }
        if self.ancestors(upstream).any(|id| id == downstream) {
            return Err(GraphError::ChainCycle {
                upstream: up.stage.label(),
                downstream: down.stage.label(),
            });
        }

        self.link(upstream, downstream);
        Ok(())
    }

    pub fn input_of(&self, id: StageId) -> Result<Option<StageId>> {
        Ok(self.node(id)?.input)
    }

    pub fn output_of(&self, id: StageId) -> Result<Option<StageId>> {
        Ok(self.node(id)?.output)
    }

    pub fn stage(&self, id: StageId) -> Result<&Stage> {
        Ok(&self.node(id)?.stage)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Walk input links back from `terminal` until `source` is reached
    ///
    /// Returns the path in execution order, source first.
    pub(crate) fn path_to(&self, source: StageId, terminal: StageId) -> Result<Vec<StageId>> {
        self.node(source)?;
        let mut path = vec![terminal];
        let mut current = terminal;

        while current != source {
            let node = self.node(current)?;
            match node.input {
                Some(input) if path.len() <= self.nodes.len() => {
                    path.push(input);
                    current = input;
                }
                _ => {
                    return Err(GraphError::BrokenChain {
                        stage: node.stage.label(),
                    })
                }
            }
        }

        path.reverse();
        Ok(path)
    }

    /// Take the stages on `path`, in order
    pub(crate) fn into_stages(self, path: &[StageId]) -> Vec<Stage> {
        let mut slots: Vec<Option<Stage>> = self.nodes.into_iter().map(|n| Some(n.stage)).collect();
        path.iter()
            .filter_map(|id| slots.get_mut(id.0).and_then(Option::take))
            .collect()
    }

    fn node(&self, id: StageId) -> Result<&Node> {
        self.nodes.get(id.0).ok_or(GraphError::UnknownStage(id.0))
    }

    fn link(&mut self, upstream: StageId, downstream: StageId) {
        self.nodes[upstream.0].output = Some(downstream);
        self.nodes[downstream.0].input = Some(upstream);
        trace!("Connected stage {} -> {}", upstream, downstream);
    }

    fn ancestors(&self, id: StageId) -> impl Iterator<Item = StageId> + '_ {
        let mut current = Some(id);
        let mut steps = 0;
        std::iter::from_fn(move || {
            let id = current?;
            steps += 1;
            current = if steps > self.nodes.len() {
                None
            } else {
                self.nodes.get(id.0).and_then(|n| n.input)
            };
            Some(id)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Record;
    use crate::stage::Source;

    fn identity() -> Stage {
        Stage::map(|r: &Record| Ok(vec![r.clone()]))
    }

    #[test]
    fn test_attach_builds_linear_chain() {
        let mut chain = StageChain::new();
        let source = chain.add(Stage::source(Source::records(Vec::new())));
        let a = chain.attach(source, identity()).unwrap();
        let b = chain.attach(a, identity()).unwrap();

        assert_eq!(chain.input_of(b).unwrap(), Some(a));
        assert_eq!(chain.output_of(source).unwrap(), Some(a));
        assert_eq!(chain.path_to(source, b).unwrap(), vec![source, a, b]);
    }

    #[test]
    fn test_attach_twice_to_same_stage_fails() {
        let mut chain = StageChain::new();
        let source = chain.add(Stage::source(Source::records(Vec::new())));
        chain.attach(source, identity()).unwrap();
        assert!(matches!(
            chain.attach(source, identity()),
            Err(GraphError::AlreadyConnected { .. })
        ));
    }

    #[test]
    fn test_source_cannot_be_downstream() {
        let mut chain = StageChain::new();
        let source = chain.add(Stage::source(Source::records(Vec::new())));
        let other = chain.add(Stage::source(Source::records(Vec::new())));
        assert!(matches!(
            chain.connect(source, other),
            Err(GraphError::SourceNotFirst { .. })
        ));
        assert!(matches!(
            chain.attach(source, Stage::source(Source::deferred())),
            Err(GraphError::SourceNotFirst { .. })
        ));
    }

    #[test]
    fn test_connect_rejects_cycles() {
        let mut chain = StageChain::new();
        let a = chain.add(identity());
        let b = chain.add(identity());
        chain.connect(a, b).unwrap();
        assert!(matches!(
            chain.connect(b, a),
            Err(GraphError::AlreadyConnected { .. }) | Err(GraphError::ChainCycle { .. })
        ));

        let c = chain.add(identity());
        assert!(matches!(
            chain.connect(c, c),
            Err(GraphError::ChainCycle { .. })
        ));
    }

    #[test]
    fn test_broken_chain_is_reported() {
        let mut chain = StageChain::new();
        let source = chain.add(Stage::source(Source::records(Vec::new())));
        let orphan = chain.add(identity().named("orphan"));
        let tail = chain.attach(orphan, identity()).unwrap();

        let err = chain.path_to(source, tail).unwrap_err();
        assert!(matches!(err, GraphError::BrokenChain { ref stage } if stage == "map 'orphan'"));
    }

    #[test]
    fn test_unknown_stage_id() {
        let chain = StageChain::new();
        assert!(matches!(
            chain.stage(StageId(3)),
            Err(GraphError::UnknownStage(3))
        ));
    }

    #[test]
    fn test_into_stages_follows_path() {
        let mut chain = StageChain::new();
        let source = chain.add(Stage::source(Source::records(Vec::new())));
        let _unused = chain.add(identity().named("unused"));
        let a = chain.attach(source, identity().named("a")).unwrap();
        let path = chain.path_to(source, a).unwrap();
        let stages = chain.into_stages(&path);
        assert_eq!(stages.len(), 2);
        assert!(stages[0].is_source());
        assert_eq!(stages[1].name(), Some("a"));
    }
}
