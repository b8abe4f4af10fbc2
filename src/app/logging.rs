//! Logging configuration and initialization

use crate::config::GraphflowConfig;
use tracing::{debug, trace};

/// Filter directive for a verbosity count
///
/// Without `-v` the configured level applies.
pub fn log_filter(verbose: u8, config: &GraphflowConfig) -> String {
    match verbose {
        0 => config.log_level.clone(),
        1 => "debug".to_string(),
        _ => "trace".to_string(),
    }
}

/// Initialize tracing/logging for the application
pub fn init_logging(verbose: u8, config: &GraphflowConfig) {
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(verbose, config))
        .with_writer(std::io::stderr)
        .with_target(verbose >= 2) // Show target module for -vv and above
        .with_thread_ids(verbose >= 3) // Show thread IDs for -vvv
        .with_line_number(verbose >= 3) // Show line numbers for -vvv
        .init();

    debug!("graphflow started with verbosity level: {}", verbose);
    trace!("Full CLI args: {:?}", std::env::args().collect::<Vec<_>>());
}
