//! Error types for the smoke-test harness
//!
//! Errors are grouped the way a run reports them: configuration problems,
//! transport failures, protocol failures and internal faults. Scenario
//! failures carry the stable [`Error::code`] so CI tooling can tell an
//! unreachable proxy apart from a broken harness.

use std::io;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the harness
#[derive(Error, Debug)]
pub enum Error {
    // === Configuration Errors ===
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration file: {0}")]
    ConfigParse(String),

    #[error("Failed to read file '{path}': {error}")]
    FileRead { path: String, error: String },

    #[error("No credentials: need a userdata file or MATRIX_USER_ID and MATRIX_ACCESS_TOKEN")]
    MissingCredentials,

    // === Transport Errors ===
    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Request timed out (timeout of {}ms elapsed)", .0.as_millis())]
    Timeout(Duration),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Malformed response body: {0}")]
    MalformedBody(String),

    // === Protocol Errors ===
    #[error("HTTP {status}: {message}")]
    HttpStatus { status: u16, message: String },

    #[error("Request rejected: {0}")]
    Rejected(String),

    #[error("Response is missing field '{0}'")]
    MissingField(String),

    // === Run Errors ===
    #[error("Critical scenario '{scenario}' failed: {reason}")]
    CriticalFailure { scenario: String, reason: String },

    // === IO Errors ===
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    // === Serialization Errors ===
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // === Internal Errors ===
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Broad category of an error, mirroring how a run treats it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Configuration,
    Transport,
    Protocol,
    Internal,
}

impl Error {
    /// Create an HTTP status error
    pub fn http_status(status: u16, message: &str) -> Self {
        Self::HttpStatus {
            status,
            message: message.to_string(),
        }
    }

    /// Create a critical failure error for the given scenario
    pub fn critical_failure(scenario: &str, reason: &str) -> Self {
        Self::CriticalFailure {
            scenario: scenario.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            Error::Config(_) | Error::ConfigParse(_) | Error::FileRead { .. } => "CONFIG",
            Error::MissingCredentials => "MISSING_CREDENTIALS",
            Error::Connection(_) => "CONNECTION_FAILED",
            Error::Timeout(_) => "TIMEOUT",
            Error::Transport(_) => "TRANSPORT",
            Error::MalformedBody(_) => "MALFORMED_BODY",
            Error::HttpStatus { .. } => "HTTP_STATUS",
            Error::Rejected(_) => "REJECTED",
            Error::MissingField(_) => "MISSING_FIELD",
            Error::CriticalFailure { .. } => "CRITICAL_FAILURE",
            Error::Io(_) => "IO",
            Error::Json(_) => "JSON",
            Error::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Category of the error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Config(_)
            | Error::ConfigParse(_)
            | Error::FileRead { .. }
            | Error::MissingCredentials => ErrorKind::Configuration,
            Error::Connection(_)
            | Error::Timeout(_)
            | Error::Transport(_)
            | Error::MalformedBody(_) => ErrorKind::Transport,
            Error::HttpStatus { .. }
            | Error::Rejected(_)
            | Error::MissingField(_)
            | Error::CriticalFailure { .. } => ErrorKind::Protocol,
            Error::Io(_) | Error::Json(_) | Error::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Whether this is an expected failure of the target rather than a harness fault
    pub fn is_expected(&self) -> bool {
        !matches!(self.kind(), ErrorKind::Internal)
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        if e.is_connect() {
            Error::Connection(e.to_string())
        } else if e.is_decode() {
            Error::MalformedBody(e.to_string())
        } else if e.is_builder() {
            Error::Internal(e.to_string())
        } else {
            Error::Transport(e.to_string())
        }
    }
}
