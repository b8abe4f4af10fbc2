//! Source stage: static records, an NDJSON file, or another pipeline's result

use super::stream::RecordStream;
use crate::error::{GraphError, Result};
use crate::io::RecordReader;
use crate::pipeline::Pipeline;
use crate::record::Record;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Where a pipeline's records come from
///
/// A file source may be created without a path and receive one at run time
/// through [`crate::pipeline::RunOptions`].
#[derive(Debug, Clone)]
pub enum Source {
    /// A fixed list of records
    Records(Vec<Record>),
    /// Newline-delimited JSON, one record per line
    File(Option<PathBuf>),
    /// The cached result of another pipeline
    Pipeline(Pipeline),
}

impl Source {
    pub fn records(records: Vec<Record>) -> Self {
        Self::Records(records)
    }

    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::File(Some(path.into()))
    }

    /// A file source whose path is supplied when the pipeline runs
    pub fn deferred() -> Self {
        Self::File(None)
    }

    pub fn pipeline(pipeline: &Pipeline) -> Self {
        Self::Pipeline(pipeline.clone())
    }

    /// The pipeline this source replays, if any
    pub fn upstream_pipeline(&self) -> Option<&Pipeline> {
        match self {
            Self::Pipeline(pipeline) => Some(pipeline),
            _ => None,
        }
    }

    pub(crate) fn open<'a>(
        &'a self,
        input_override: Option<&Path>,
        label: &str,
    ) -> Result<RecordStream<'a>> {
        if let Some(path) = input_override {
            if let Self::File(_) = self {
                debug!("{} reading overridden input {}", label, path.display());
                return Ok(Box::new(RecordReader::open(path)?));
            }
            warn!(
                "Ignoring input override {} for {}: source is not file-backed",
                path.display(),
                label
            );
        }

        match self {
            Self::Records(records) => Ok(Box::new(records.iter().cloned().map(Ok))),
            Self::File(Some(path)) => Ok(Box::new(RecordReader::open(path)?)),
            Self::File(None) => Err(GraphError::MissingInput {
                stage: label.to_string(),
            }),
            Self::Pipeline(pipeline) => {
                let records = pipeline.result().ok_or_else(|| GraphError::NotComputed {
                    pipeline: pipeline.label(),
                })?;
                Ok(Box::new(
                    (0..records.len()).map(move |i| Ok(records[i].clone())),
                ))
            }
        }
    }
}
