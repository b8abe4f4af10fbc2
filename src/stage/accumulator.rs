use super::stream::RecordStream;
use super::FoldFn;
use crate::error::{GraphError, Result};
use crate::record::Record;

/// Fold stage: threads a state record through every upstream record and
/// yields the final state once
///
/// The initial state is cloned at the start of every run, so re-running a
/// pipeline never sees state left over from a previous run.
#[derive(Clone)]
pub struct Accumulator {
    initial: Record,
    operation: FoldFn,
}

impl Accumulator {
    pub fn new(initial: Record, operation: FoldFn) -> Self {
        Self { initial, operation }
    }

    pub fn initial_state(&self) -> &Record {
        &self.initial
    }

    pub(crate) fn apply<'a>(&'a self, upstream: RecordStream<'a>, label: String) -> RecordStream<'a> {
        let mut upstream = Some(upstream);
        Box::new(std::iter::from_fn(move || {
            let upstream = upstream.take()?;
            Some(self.fold(upstream, &label))
        }))
    }

    fn fold(&self, upstream: RecordStream<'_>, label: &str) -> Result<Record> {
        let mut state = self.initial.clone();
        for record in upstream {
            let record = record?;
            state = (self.operation)(state, &record).map_err(|source| GraphError::Operation {
                stage: label.to_string(),
                source,
            })?;
        }
        Ok(state)
    }
}
