//! CLI command definitions
//!
//! Defines the clap commands for the smoke-test CLI.

use clap::{Args, Subcommand};
use std::path::PathBuf;

#[derive(Subcommand)]
pub enum Commands {
    /// Run the smoke-test sequence against the message proxy
    Run {
        #[command(flatten)]
        target: TargetArgs,

        /// Three-line credential file (homeserver, username, password)
        #[arg(long)]
        credentials: Option<PathBuf>,

        /// Print the run summary as JSON instead of progress output
        #[arg(long)]
        json: bool,

        /// Also write the JSON summary to this file
        #[arg(long)]
        report: Option<PathBuf>,
    },

    /// Show the resolved test credentials (secrets redacted)
    Credentials {
        /// Three-line credential file (homeserver, username, password)
        #[arg(long)]
        credentials: Option<PathBuf>,
    },

    /// Show the effective configuration
    Config {
        #[command(flatten)]
        target: TargetArgs,
    },
}

/// Overrides for the target section of the config file
#[derive(Args, Debug, Default, Clone)]
pub struct TargetArgs {
    /// Base URL of the server hosting the proxy (e.g. http://localhost:8000)
    #[arg(long)]
    pub base_url: Option<String>,

    /// Path prefix of the proxy endpoints
    #[arg(long)]
    pub api_prefix: Option<String>,

    /// Per-request timeout in seconds (at least 1)
    #[arg(long)]
    pub timeout: Option<u64>,
}
