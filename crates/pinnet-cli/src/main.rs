//! Pinnet CLI - pinned, authorized HTTP requests from the command line
//!
//! Provides commands for fetching URLs over the certificate-pinned client,
//! verifying the pinned certificate bundle and computing server error hashes.

mod cli;
mod config;
mod error;
mod handlers;
mod logging;
mod output;

use cli::{Cli, Commands};
use colored::control;
use config::Config;
use error::Result;
use logging::{timing::Timer, LoggingConfig};
use output::OutputWriter;
use std::process;
use tracing::instrument;

#[tokio::main]
async fn main() {
    let cli = Cli::parse_args();

    control::set_override(cli.use_color());

    // Logging settings from the config file apply even if the file is later rejected
    let config = Config::load_with_file(cli.config.as_deref());
    let logging_section = match &config {
        Ok(config) => config.logging.clone(),
        Err(_) => Config::logging_with_file(cli.config.as_deref()),
    };

    if let Err(e) = init_logging(&cli, &logging_section) {
        eprintln!("Failed to initialize logging: {}", e);
    }

    let result = match config {
        Ok(config) => run(cli, config).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(()) => {
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}", error::format_error(&e, control::SHOULD_COLORIZE.should_colorize()));

            if e.should_show_help() {
                eprintln!("\nFor more information, try '--help'");
            }

            process::exit(e.exit_code());
        }
    }
}

/// Main application logic
#[instrument(skip_all, fields(command = ?cli.command))]
async fn run(cli: Cli, config: Config) -> Result<()> {
    let _timer = Timer::new("cli_execution");

    let mut output = OutputWriter::new(cli.output, cli.use_color(), cli.quiet);

    tracing::info!(verbosity = cli.verbosity_level(), "Executing command");

    match cli.command {
        Commands::Fetch(args) => handlers::handle_fetch(args, &config, &mut output).await,
        Commands::Certs(args) => handlers::handle_certs(args, &mut output),
        Commands::ErrorHash(args) => handlers::handle_error_hash(args, &mut output),
    }
}

/// Initialize the logging system
fn init_logging(cli: &Cli, section: &config::LoggingSection) -> Result<()> {
    let mut logging_config = LoggingConfig::from_verbosity(cli.verbosity_level());
    logging_config.merge_with_file(section, cli.verbosity_level());
    logging_config.merge_with_env();

    // If quiet mode, only log errors
    if cli.quiet {
        logging_config.level = "error".to_string();
        logging_config.console = false;
    }

    logging::init_logging(logging_config)
}
