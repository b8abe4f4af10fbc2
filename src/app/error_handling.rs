//! Fatal error reporting for the binary

use crate::error::{describe_error_code, GraphError};
use tracing::error;

/// Log a fatal error, print it to stderr and exit with status 1
///
/// With `verbose >= 1` the error code of a [`GraphError`] and the full cause
/// chain are printed as well.
pub fn handle_fatal_error(error: anyhow::Error, verbose: u8) -> ! {
    error!("Fatal error: {:#}", error);
    eprintln!("Error: {error}");

    if verbose >= 1 {
        if let Some(graph_error) = error.downcast_ref::<GraphError>() {
            let code = graph_error.code();
            eprintln!("  code {}: {}", code, describe_error_code(code));
        }
        for (i, cause) in error.chain().enumerate().skip(1) {
            eprintln!("  {}: {}", i, cause);
        }
    }

    std::process::exit(1)
}
