//! Newline-delimited JSON record files
//!
//! Sources read one record per line, lazily; sinks write the fully
//! materialized output of a pipeline, one record per line.

use crate::error::{GraphError, Result};
use crate::record::Record;
use serde_json::Value;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Lines, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Lazy reader over an NDJSON file
///
/// Blank lines are skipped. Line numbers in errors are 1-based.
pub struct RecordReader {
    path: PathBuf,
    lines: Lines<BufReader<File>>,
    line: usize,
}

impl RecordReader {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path).map_err(|e| GraphError::io(&path, e))?;
        debug!("Reading records from {}", path.display());
        Ok(Self {
            path,
            lines: BufReader::new(file).lines(),
            line: 0,
        })
    }

    fn parse(&self, text: &str) -> Result<Record> {
        let value: Value =
            serde_json::from_str(text).map_err(|source| GraphError::MalformedRecord {
                path: self.path.clone(),
                line: self.line,
                source,
            })?;
        match value {
            Value::Object(map) => Ok(map),
            _ => Err(GraphError::NotAnObject {
                context: format!("{}:{}", self.path.display(), self.line),
            }),
        }
    }
}

impl Iterator for RecordReader {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let text = match self.lines.next()? {
                Ok(text) => text,
                Err(e) => return Some(Err(GraphError::io(&self.path, e))),
            };
            self.line += 1;
            if text.trim().is_empty() {
                continue;
            }
            return Some(self.parse(&text));
        }
    }
}

/// Read every record of an NDJSON file
pub fn read_records(path: impl AsRef<Path>) -> Result<Vec<Record>> {
    RecordReader::open(path)?.collect()
}

/// Write records as NDJSON to any writer
pub fn write_records_to<W: Write>(writer: W, records: &[Record]) -> Result<()> {
    let mut writer = BufWriter::new(writer);
    for record in records {
        serde_json::to_writer(&mut writer, record)?;
        writer
            .write_all(b"\n")
            .map_err(|e| GraphError::io("<output>", e))?;
    }
    writer.flush().map_err(|e| GraphError::io("<output>", e))
}

/// Write records as NDJSON to a file, replacing it
pub fn write_records(path: impl AsRef<Path>, records: &[Record]) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path).map_err(|e| GraphError::io(path, e))?;
    write_records_to(file, records).map_err(|e| match e {
        GraphError::Io { source, .. } => GraphError::io(path, source),
        other => other,
    })?;
    debug!("Wrote {} records to {}", records.len(), path.display());
    Ok(())
}
