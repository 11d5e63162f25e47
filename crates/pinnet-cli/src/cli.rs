//! Command-line interface argument parsing and definitions

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use url::Url;

/// Pinnet CLI - certificate-pinned, authorized HTTP requests
///
/// Sends requests over a TLS connection pinned to the bundled root certificates,
/// optionally authorized through a bearer token or an OAuth2 token exchange.
#[derive(Parser, Debug)]
#[command(
    name = "pinnet",
    version,
    author,
    about,
    long_about = None,
    propagate_version = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Enable verbose output (can be used multiple times for increased verbosity)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all non-essential output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Path to configuration file
    #[arg(short, long, global = true, env = "PINNET_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output format for results
    #[arg(short, long, value_enum, global = true, default_value = "human")]
    pub output: OutputFormat,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// The subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Send a request over the pinned client
    Fetch(FetchArgs),

    /// Load and verify the pinned certificate bundle
    Certs(CertsArgs),

    /// Show the log parameters of a server error
    ErrorHash(ErrorHashArgs),
}

/// Arguments for the fetch command
#[derive(Parser, Debug)]
pub struct FetchArgs {
    /// URL to request
    #[arg(value_name = "URL")]
    pub url: Url,

    /// HTTP method
    #[arg(short = 'X', long, default_value = "GET")]
    pub method: String,

    /// Request body
    #[arg(short, long)]
    pub data: Option<String>,

    /// Authorize the request for this scope
    #[arg(short, long)]
    pub scope: Option<String>,

    /// Token exchange endpoint; the bearer token becomes the subject token
    #[arg(long, value_name = "URL")]
    pub token_exchange: Option<Url>,

    /// Bearer token used for authorization
    #[arg(long, env = "PINNET_BEARER_TOKEN", hide_env_values = true)]
    pub bearer_token: Option<String>,

    /// Directory with the pinned certificates (`<name>.der`) instead of the bundled ones
    #[arg(long, value_name = "DIR")]
    pub certs_dir: Option<PathBuf>,

    /// Mask token-like values in a JSON response before printing it
    #[arg(long)]
    pub redact: bool,

    /// Save the response body to a file
    #[arg(long = "save-to", value_name = "OUTPUT_FILE")]
    pub save_to: Option<PathBuf>,
}

/// Arguments for the certs command
#[derive(Parser, Debug)]
pub struct CertsArgs {
    /// Directory with the pinned certificates (`<name>.der`) instead of the bundled ones
    #[arg(long, value_name = "DIR")]
    pub dir: Option<PathBuf>,
}

/// Arguments for the error-hash command
#[derive(Parser, Debug)]
pub struct ErrorHashArgs {
    /// HTTP status code
    #[arg(value_name = "CODE")]
    pub code: u16,

    /// Endpoint (last path segment of the request URL)
    #[arg(value_name = "ENDPOINT")]
    pub endpoint: Option<String>,
}

/// Output format options
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable formatted output
    Human,
    /// JSON output
    Json,
    /// Pretty-printed JSON output
    JsonPretty,
    /// YAML output
    Yaml,
}

impl Cli {
    /// Parse command-line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Get the effective verbosity level
    pub fn verbosity_level(&self) -> u8 {
        if self.quiet {
            0
        } else {
            self.verbose
        }
    }

    /// Check if colored output should be used
    pub fn use_color(&self) -> bool {
        use is_terminal::IsTerminal;

        !self.no_color && std::env::var("NO_COLOR").is_err() && std::io::stdout().is_terminal()
    }
}
