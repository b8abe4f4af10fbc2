use super::stream::RecordStream;
use super::MapFn;
use crate::error::GraphError;
use crate::record::Record;

/// Per-record map stage: each input record yields zero or more output records
#[derive(Clone)]
pub struct Transform {
    operation: MapFn,
}

impl Transform {
    pub fn new(operation: MapFn) -> Self {
        Self { operation }
    }

    pub(crate) fn apply<'a>(&'a self, upstream: RecordStream<'a>, label: String) -> RecordStream<'a> {
        Box::new(upstream.flat_map(move |item| {
            let produced = item.and_then(|record: Record| {
                (self.operation)(&record).map_err(|source| GraphError::Operation {
                    stage: label.clone(),
                    source,
                })
            });
            match produced {
                Ok(records) => records.into_iter().map(Ok).collect::<Vec<_>>(),
                Err(e) => vec![Err(e)],
            }
        }))
    }
}
