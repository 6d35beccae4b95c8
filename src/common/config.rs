//! Configuration file handling

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::paths::config_path;
use super::Result;

/// Main configuration structure
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
pub struct Config {
    /// Where the message proxy lives
    #[serde(default)]
    pub target: TargetConfig,

    /// Timeout settings
    #[serde(default)]
    pub timeouts: Timeouts,

    /// Credential sources
    #[serde(default)]
    pub credentials: CredentialsConfig,

    /// Knobs for the mutating scenarios
    #[serde(default)]
    pub scenarios: ScenarioConfig,
}

/// Target API location
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct TargetConfig {
    /// Base URL of the server hosting the proxy
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Path prefix every endpoint lives under
    #[serde(default = "default_api_prefix")]
    pub api_prefix: String,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_prefix: default_api_prefix(),
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_api_prefix() -> String {
    "/api/message-proxy/element".to_string()
}

/// Timeout settings in seconds
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct Timeouts {
    /// Per-request timeout
    #[serde(default = "default_request")]
    pub request_secs: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            request_secs: default_request(),
        }
    }
}

fn default_request() -> u64 {
    30
}

impl Timeouts {
    pub fn request(&self) -> Duration {
        Duration::from_secs(self.request_secs)
    }
}

/// Credential source settings
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct CredentialsConfig {
    /// Three-line credential file; `./userdata` when unset
    #[serde(default)]
    pub file: Option<PathBuf>,

    /// Homeserver used when no source provides one
    #[serde(default = "default_homeserver")]
    pub default_homeserver: String,
}

impl Default for CredentialsConfig {
    fn default() -> Self {
        Self {
            file: None,
            default_homeserver: default_homeserver(),
        }
    }
}

fn default_homeserver() -> String {
    "https://matrix.org".to_string()
}

/// Scenario settings
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct ScenarioConfig {
    /// Body of the message posted by the send scenario
    #[serde(default = "default_test_message")]
    pub test_message: String,

    /// Typing indicator timeout in milliseconds
    #[serde(default = "default_typing_timeout")]
    pub typing_timeout_ms: u64,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            test_message: default_test_message(),
            typing_timeout_ms: default_typing_timeout(),
        }
    }
}

fn default_test_message() -> String {
    "🧪 Matrix Client Implementation Test - All systems operational!".to_string()
}

fn default_typing_timeout() -> u64 {
    5000
}

impl Config {
    /// Load configuration from the default config file
    ///
    /// Returns default configuration if file doesn't exist
    pub fn load() -> Result<Self> {
        match config_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Load configuration from an explicit path, which must exist
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| super::Error::FileRead {
            path: path.display().to_string(),
            error: e.to_string(),
        })?;
        Self::parse(&content)
    }

    /// Parse configuration from TOML text
    pub fn parse(content: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(content).map_err(|e| super::Error::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values no run can succeed with
    pub fn validate(&self) -> Result<()> {
        if self.timeouts.request_secs == 0 {
            return Err(super::Error::Config(
                "timeouts.request_secs must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
