use clap::Parser;
use graphflow::app::{handle_fatal_error, init_logging};
use graphflow::cli::{execute_command, Cli};
use graphflow::config::{load_config, GraphflowConfig};

fn main() {
    let cli = Cli::parse();

    // Logging is not up yet, so a bad config falls back to defaults for the
    // subscriber and is reported as a fatal error right after.
    let config = load_config(cli.config.as_deref());
    let log_config = config.as_ref().cloned().unwrap_or_else(|_| GraphflowConfig::default());
    init_logging(cli.verbose, &log_config);

    let result = config
        .map_err(anyhow::Error::from)
        .and_then(|config| execute_command(cli.command, &config));

    if let Err(e) = result {
        handle_fatal_error(e, cli.verbose);
    }
}
