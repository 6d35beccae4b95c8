//! Logging and tracing configuration
//!
//! Logs go to stderr so stdout stays free for progress output and the
//! JSON report. An optional log file receives the same events with full
//! source locations.

use std::path::Path;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Build the filter from `RUST_LOG`, falling back to INFO for this crate
/// (DEBUG when verbose) and WARN for dependencies.
fn filter(verbose: bool) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("proxy_smoke=debug,warn")
        } else {
            EnvFilter::new("proxy_smoke=info,warn")
        }
    })
}

/// Initialize tracing for the CLI
///
/// When `log_file` is given and can be opened, events are also appended
/// there without ANSI colors. Returns whether file logging is active.
pub fn init(verbose: bool, log_file: Option<&Path>) -> bool {
    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact();

    let file = log_file.and_then(|path| {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                let _ = std::fs::create_dir_all(parent);
            }
        }
        match std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
        {
            Ok(file) => Some(file),
            Err(e) => {
                eprintln!("Warning: Could not open log file: {}", e);
                None
            }
        }
    });

    match file {
        Some(file) => {
            let file_layer = fmt::layer()
                .with_writer(std::sync::Mutex::new(file))
                .with_ansi(false)
                .with_target(true)
                .with_file(true)
                .with_line_number(true);

            tracing_subscriber::registry()
                .with(filter(verbose))
                .with(stderr_layer)
                .with(file_layer)
                .init();
            true
        }
        None => {
            tracing_subscriber::registry()
                .with(filter(verbose))
                .with(stderr_layer)
                .init();
            false
        }
    }
}
