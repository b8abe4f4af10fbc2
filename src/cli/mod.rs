//! Command-line interface
//!
//! A thin consumer of the library: each subcommand builds one pipeline (or
//! recipe), runs it over an input file and prints or writes the result.

pub mod args;
pub mod router;

pub use args::{Cli, Commands, IoArgs};
pub use router::execute_command;
