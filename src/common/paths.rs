//! Configuration and data file locations
//!
//! Uses the directories crate for platform-appropriate locations:
//! - Linux: `~/.config/proxy-smoke/`
//! - macOS: `~/Library/Application Support/proxy-smoke/`
//! - Windows: `%APPDATA%\proxy-smoke\`

use std::path::PathBuf;

/// Name used for the config and data directories
const APP_NAME: &str = "proxy-smoke";

/// Name of the plaintext credential file
pub const CREDENTIALS_FILE: &str = "userdata";

/// Get the configuration directory path
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", APP_NAME).map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the configuration file
pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join("config.toml"))
}

/// Default location of the credential file
///
/// Prefers `./userdata` in the working directory, falling back to the
/// config directory when no local file exists.
pub fn default_credentials_path() -> PathBuf {
    let local = PathBuf::from(CREDENTIALS_FILE);
    if local.exists() {
        return local;
    }
    config_dir()
        .map(|dir| dir.join(CREDENTIALS_FILE))
        .unwrap_or(local)
}
