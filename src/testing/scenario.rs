//! Scenario definition
//!
//! A scenario is data plus behavior: a name, a guard over the artifacts
//! gathered so far, the requests to issue, and a classifier that turns the
//! responses into a pass (with an optional artifact for later scenarios) or
//! an error.

use serde::Serialize;

use crate::api::{ApiRequest, ApiResponse, MemberSummary, Message, Room};
use crate::common::Result;
use crate::credentials::Credentials;

use super::context::RunContext;

/// Whether a scenario should run given the current context
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Guard {
    Ready,
    /// Skip with a reason shown to the user
    Skip(String),
}

impl Guard {
    pub fn skip(reason: impl Into<String>) -> Self {
        Guard::Skip(reason.into())
    }
}

/// A value one scenario extracts for the ones after it
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Artifact {
    /// Credentials after authentication
    Session(Credentials),
    Rooms(Vec<Room>),
    Messages(Vec<Message>),
    Members(MemberSummary),
    /// Id of an event the scenario created
    Event(String),
}

/// Successful classification
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Pass {
    pub artifact: Option<Artifact>,
    /// Lines printed under the scenario's result
    pub details: Vec<String>,
}

impl Pass {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn artifact(mut self, artifact: Artifact) -> Self {
        self.artifact = Some(artifact);
        self
    }

    pub fn detail(mut self, line: impl Into<String>) -> Self {
        self.details.push(line.into());
        self
    }
}

/// One named step of a run
///
/// Requests are issued in order; a response with a non-2xx status ends the
/// sequence early, so `classify` may see fewer responses than requested.
/// The same holds for a tolerated transport failure in a best-effort tail.
pub trait Scenario: Send + Sync {
    /// Stable identifier, also the key of this scenario's artifact
    fn id(&self) -> &'static str;

    /// Human-readable name
    fn title(&self, ctx: &RunContext) -> String;

    /// A failed critical scenario ends the run
    fn critical(&self) -> bool {
        false
    }

    fn guard(&self, _ctx: &RunContext) -> Guard {
        Guard::Ready
    }

    /// Requests after the first are best effort: once the first one
    /// succeeds, a transport failure on a later one ends the sequence
    /// without failing the scenario
    fn best_effort_tail(&self) -> bool {
        false
    }

    /// Requests to issue
    fn requests(&self, ctx: &RunContext) -> Result<Vec<ApiRequest>>;

    /// Decide the outcome from the responses
    fn classify(&self, responses: &[ApiResponse], ctx: &RunContext) -> Result<Pass>;
}
