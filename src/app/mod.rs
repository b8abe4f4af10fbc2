//! Application module
//!
//! Process-level setup for the binary: logging and fatal error reporting.

pub mod error_handling;
pub mod logging;

pub use error_handling::handle_fatal_error;
pub use logging::init_logging;
