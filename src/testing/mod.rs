//! Smoke-test runner
//!
//! Runs an ordered list of [`Scenario`]s against the message proxy. Each
//! scenario sees the artifacts of the ones before it (the session issued by
//! login, the discovered rooms) through the [`RunContext`], and results are
//! collected into a [`RunSummary`].

mod context;
pub mod proxy;
mod report;
mod runner;
mod scenario;

pub use context::RunContext;
pub use report::{Console, Outcome, RunSummary, ScenarioResult};
pub use runner::{run_with, ScenarioRunner};
pub use scenario::{Artifact, Guard, Pass, Scenario};
