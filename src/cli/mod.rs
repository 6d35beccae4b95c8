//! CLI command handling
//!
//! Resolves configuration and credentials, runs scenarios and formats
//! output.

use std::path::{Path, PathBuf};

use colored::Colorize;

use crate::commands::{Commands, TargetArgs};
use crate::common::config::Config;
use crate::common::{paths, Result};
use crate::credentials::{AuthPath, CredentialLoader, Credentials};
use crate::testing::{proxy, ScenarioRunner};

/// Dispatch a CLI command
///
/// Returns `Ok(false)` when the command ran but reported failures.
pub async fn dispatch(command: Commands, config_file: Option<&Path>) -> Result<bool> {
    let config = load_config(config_file)?;

    match command {
        Commands::Run {
            target,
            credentials,
            json,
            report,
        } => {
            let config = apply_overrides(config, &target)?;
            let creds = loader(&config, credentials).load();

            if !json {
                print_run_header(&config, &creds);
            }

            let runner = ScenarioRunner::new(&config).quiet(json);
            let summary = runner
                .run(&proxy::scenarios(&config.scenarios), creds)
                .await?;

            if let Some(path) = report {
                summary.write_json(&path)?;
                tracing::info!("Wrote report to {}", path.display());
            }
            if json {
                println!("{}", serde_json::to_string_pretty(&summary.to_json()?)?);
            }

            Ok(summary.all_passed())
        }

        Commands::Credentials { credentials } => {
            let loader = loader(&config, credentials);
            let creds = loader.load();
            print_credentials(&creds, loader.file());
            Ok(true)
        }

        Commands::Config { target } => {
            let config = apply_overrides(config, &target)?;
            match config_file.map(Path::to_path_buf).or_else(paths::config_path) {
                Some(path) => println!("# {}", path.display()),
                None => println!("# no config directory available"),
            }
            let text = toml::to_string_pretty(&config)
                .map_err(|e| crate::common::Error::Internal(e.to_string()))?;
            println!("{}", text);
            Ok(true)
        }
    }
}

/// Load the config file given on the command line, or the default one
fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
}

/// Apply command-line overrides on top of the file configuration
pub fn apply_overrides(mut config: Config, target: &TargetArgs) -> Result<Config> {
    if let Some(base_url) = &target.base_url {
        config.target.base_url = base_url.clone();
    }
    if let Some(prefix) = &target.api_prefix {
        config.target.api_prefix = prefix.clone();
    }
    if let Some(secs) = target.timeout {
        config.timeouts.request_secs = secs;
    }
    config.validate()?;
    Ok(config)
}

/// Credential loader for the file chosen on the command line, in the
/// config, or at the default location
fn loader(config: &Config, file: Option<PathBuf>) -> CredentialLoader {
    let file = file
        .or_else(|| config.credentials.file.clone())
        .unwrap_or_else(paths::default_credentials_path);
    CredentialLoader::new(Some(file), config.credentials.default_homeserver.clone())
}

fn auth_label(creds: &Credentials) -> &'static str {
    match creds.auth_path() {
        Some(AuthPath::Login) => "login",
        Some(AuthPath::Restore) => "session restore",
        None => "none",
    }
}

fn print_run_header(config: &Config, creds: &Credentials) {
    println!(
        "{} {}",
        "Running:".blue().bold(),
        "Message proxy smoke test".white().bold()
    );
    println!(
        "  Target: {}{}",
        config.target.base_url.trim_end_matches('/'),
        config.target.api_prefix
    );
    println!("  Homeserver: {}", creds.homeserver);
    println!(
        "  User ID: {}",
        creds.user_id.as_deref().unwrap_or("Not set")
    );
    println!(
        "  Has Credentials: {}",
        if creds.auth_path().is_some() { "Yes" } else { "No" }
    );
}

fn print_credentials(creds: &Credentials, file: Option<&Path>) {
    let set = |present: bool| if present { "set" } else { "not set" };

    println!("Credentials:");
    if let Some(file) = file {
        println!("  File: {}", file.display());
    }
    println!("  Source: {:?}", creds.source);
    println!("  Homeserver: {}", creds.homeserver);
    println!(
        "  Username: {}",
        creds.username.as_deref().unwrap_or("Not set")
    );
    println!(
        "  User ID: {}",
        creds.user_id.as_deref().unwrap_or("Not set")
    );
    println!("  Password: {}", set(creds.password.is_some()));
    println!("  Access token: {}", set(creds.has_access_token()));
    println!(
        "  Device ID: {}",
        creds.device_id.as_deref().unwrap_or("Not set")
    );
    println!("  Authentication: {}", auth_label(creds));
}
