//! Message proxy smoke test
//!
//! Library half of the `proxy-smoke` CLI: credential loading, a small HTTP
//! client for the proxy endpoints, and the scenario runner.

pub mod api;
pub mod cli;
pub mod commands;
pub mod common;
pub mod credentials;
pub mod testing;

// Re-export commonly used types for tests
pub use common::{Error, Result};
pub use credentials::{CredentialLoader, Credentials};
pub use testing::{RunSummary, ScenarioRunner};
