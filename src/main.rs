//! Message proxy smoke test
//!
//! Drives a fixed sequence of scenarios against a Matrix message proxy and
//! reports a pass/fail summary. Exits 1 when any scenario failed and 2 on
//! configuration or internal errors.

use clap::Parser;
use proxy_smoke::{cli, commands::Commands, common::logging};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "proxy-smoke", about = "Smoke tests for a Matrix message proxy")]
#[command(version, long_about = None)]
struct Cli {
    /// Config file (defaults to the platform config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Also append logs to this file
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    logging::init(cli.verbose, cli.log_file.as_deref());

    match cli::dispatch(cli.command, cli.config.as_deref()).await {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            tracing::error!(code = e.code(), "{}", e);
            eprintln!("Error: {e}");
            std::process::exit(2);
        }
    }
}
