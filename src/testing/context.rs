//! State carried from one scenario to the next

use std::collections::BTreeMap;

use crate::credentials::Credentials;

use super::scenario::Artifact;

/// Everything later scenarios may read
///
/// Artifacts are keyed by the id of the scenario that produced them.
/// Credentials are never mutated: a session artifact appends a new value to
/// the history and [`RunContext::credentials`] returns the latest one.
#[derive(Debug, Clone)]
pub struct RunContext {
    credentials: Vec<Credentials>,
    artifacts: BTreeMap<&'static str, Artifact>,
}

impl RunContext {
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials: vec![credentials],
            artifacts: BTreeMap::new(),
        }
    }

    /// Current credentials
    pub fn credentials(&self) -> &Credentials {
        // Never empty: seeded in new() and only ever appended to
        &self.credentials[self.credentials.len() - 1]
    }

    /// Every credentials value of the run, oldest first
    pub fn credential_history(&self) -> &[Credentials] {
        &self.credentials
    }

    pub fn artifact(&self, scenario: &str) -> Option<&Artifact> {
        self.artifacts.get(scenario)
    }

    pub fn has_artifact(&self, scenario: &str) -> bool {
        self.artifacts.contains_key(scenario)
    }

    /// Store the artifact of `scenario`
    pub fn record(&mut self, scenario: &'static str, artifact: Artifact) {
        if let Artifact::Session(creds) = &artifact {
            self.credentials.push(creds.clone());
        }
        self.artifacts.insert(scenario, artifact);
    }
}
