//! CLI argument structures

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Run dataflow pipelines over newline-delimited JSON records
#[derive(Parser, Debug)]
#[command(name = "graphflow")]
#[command(about = "graphflow - batch record pipelines over NDJSON files", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Enable verbose output (-v for debug, -vv for trace, -vvv for all)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Configuration file (defaults to ./graphflow.toml when present)
    #[arg(short = 'c', long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Count occurrences of every word
    #[command(name = "word-count")]
    WordCount(IoArgs),

    /// Build a TF-IDF inverted index
    #[command(name = "tf-idf")]
    TfIdf(IoArgs),

    /// Find the most characteristic words of every document
    #[command(name = "pmi")]
    Pmi(IoArgs),

    /// Sort records by one or more fields
    #[command(name = "sort")]
    Sort {
        #[command(flatten)]
        io: IoArgs,

        /// Sort keys, e.g. "id, age DESC"
        #[arg(long, value_name = "KEYS")]
        by: String,
    },
}

#[derive(Args, Debug, Clone)]
pub struct IoArgs {
    /// Input file, one JSON record per line
    #[arg(short, long, value_name = "FILE")]
    pub input: PathBuf,

    /// Output file (defaults to stdout)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}
