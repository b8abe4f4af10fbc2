//! # graphflow
//!
//! A small dataflow-graph engine for batch record processing.
//!
//! Records are JSON objects. Stages (source, map, sort, grouped reduce, fold
//! and sort-merge join) are wired into pipelines; running a pipeline first
//! computes the pipelines it depends on, then pulls records lazily through
//! its own stages and memoizes the result.
//!
//! ## Usage
//!
//! ```bash
//! graphflow word-count --input corpus.jsonl
//! graphflow sort --input people.jsonl --by "id, age DESC" --output sorted.jsonl
//! ```
//!
//! ## Modules
//!
//! - `record` - The record type, key extraction and value ordering
//! - `stage` - Stage variants and lazy record streams
//! - `join` - Sort-merge join strategies
//! - `pipeline` - Stage wiring, pipeline construction and execution
//! - `scheduler` - Dependency ordering between pipelines
//! - `io` - Newline-delimited JSON sources and sinks
//! - `recipes` - Word count, TF-IDF and PMI pipelines
//! - `config` - Layered configuration for the binary
//! - `app` / `cli` - Binary entry points
pub mod app;
pub mod cli;
pub mod config;
pub mod error;
pub mod io;
pub mod join;
pub mod pipeline;
pub mod recipes;
pub mod record;
pub mod scheduler;
pub mod stage;

pub use error::{GraphError, Result};
pub use join::JoinStrategy;
pub use pipeline::{Pipeline, PipelineBuilder, RunOptions};
pub use record::Record;
pub use stage::{Source, Stage};
