//! Command routing and execution

use crate::cli::args::{Commands, IoArgs};
use crate::config::GraphflowConfig;
use crate::io;
use crate::pipeline::{PipelineBuilder, RunOptions};
use crate::recipes::{self, TfIdf};
use crate::record::Record;
use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::debug;

/// Execute a CLI command based on the parsed arguments
pub fn execute_command(command: Commands, config: &GraphflowConfig) -> Result<()> {
    debug!("Executing {:?}", command);
    match command {
        Commands::WordCount(args) => {
            let pipeline = recipes::word_count()?;
            let records = pipeline.run_with(&RunOptions::new().with_input(&args.input))?;
            emit(&args, &records)
        }
        Commands::TfIdf(args) => {
            let tf_idf = TfIdf::build(config.recipes.tf_idf_top)?;
            let records = tf_idf.run(&args.input)?;
            emit(&args, &records)
        }
        Commands::Pmi(args) => {
            let pipeline = recipes::pmi(config.recipes.pmi_top, config.recipes.pmi_min_word_length)?;
            let records = pipeline.run_with(&RunOptions::new().with_input(&args.input))?;
            emit(&args, &records)
        }
        Commands::Sort { io: args, by } => {
            let pipeline = PipelineBuilder::from_file(&args.input)
                .name("sort")
                .sort_by_spec(&by)
                .build()
                .with_context(|| format!("invalid sort keys '{by}'"))?;
            let records = pipeline.run()?;
            emit(&args, &records)
        }
    }
}

/// Write to the output file, or to stdout when none was given
fn emit(args: &IoArgs, records: &Arc<Vec<Record>>) -> Result<()> {
    match &args.output {
        Some(path) => io::write_records(path, records)?,
        None => io::write_records_to(std::io::stdout().lock(), records)?,
    }
    Ok(())
}
