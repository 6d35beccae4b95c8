//! Scenario runner
//!
//! Executes scenarios strictly in order against a [`Transport`], one request
//! in flight at a time. Expected failures (transport, protocol) become failed
//! results; a failed critical scenario ends the run with the summary built so
//! far. Internal faults end the run with an error.

use std::time::{Duration, Instant};

use crate::api::{ApiClient, ApiResponse, Transport};
use crate::common::config::{Config, TargetConfig};
use crate::common::{Error, Result};
use crate::credentials::Credentials;

use super::context::RunContext;
use super::report::{Console, RunSummary, ScenarioResult};
use super::scenario::{Guard, Pass, Scenario};

/// Runs scenario lists against the configured proxy
pub struct ScenarioRunner {
    target: TargetConfig,
    timeout: Duration,
    console: Console,
}

impl ScenarioRunner {
    pub fn new(config: &Config) -> Self {
        Self {
            target: config.target.clone(),
            timeout: config.timeouts.request(),
            console: Console::default(),
        }
    }

    /// Override the per-request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Suppress progress output
    pub fn quiet(mut self, quiet: bool) -> Self {
        self.console = Console::new(quiet);
        self
    }

    /// Run `scenarios` with a fresh HTTP client
    ///
    /// The client lives for this call only and is released on every exit
    /// path.
    pub async fn run(
        &self,
        scenarios: &[Box<dyn Scenario>],
        credentials: Credentials,
    ) -> Result<RunSummary> {
        let client = ApiClient::new(&self.target, self.timeout)?;
        tracing::info!(
            "Running {} scenarios against {}",
            scenarios.len(),
            client.base()
        );
        run_with(&client, scenarios, credentials, self.console).await
    }
}

/// Run `scenarios` over an existing transport
pub async fn run_with(
    transport: &dyn Transport,
    scenarios: &[Box<dyn Scenario>],
    credentials: Credentials,
    console: Console,
) -> Result<RunSummary> {
    let mut ctx = RunContext::new(credentials);
    let mut summary = RunSummary::new();

    for (i, scenario) in scenarios.iter().enumerate() {
        let id = scenario.id();
        let title = scenario.title(&ctx);
        console.scenario_started(i + 1, &title);

        if let Guard::Skip(reason) = scenario.guard(&ctx) {
            tracing::debug!("Skipping {}: {}", id, reason);
            let result = ScenarioResult::skipped(id, title, scenario.critical(), reason);
            console.scenario_finished(&result, &[]);
            summary.record(result);
            continue;
        }

        let started = Instant::now();
        match execute(transport, scenario.as_ref(), &ctx).await {
            Ok(Pass { artifact, details }) => {
                tracing::debug!("Scenario {} passed in {:?}", id, started.elapsed());
                if let Some(artifact) = &artifact {
                    ctx.record(id, artifact.clone());
                }
                let result = ScenarioResult::passed(
                    id,
                    title,
                    scenario.critical(),
                    artifact,
                    started.elapsed(),
                );
                console.scenario_finished(&result, &details);
                summary.record(result);
            }
            Err(e) if !e.is_expected() => {
                tracing::error!("Scenario {} hit an internal fault: {}", id, e);
                let result =
                    ScenarioResult::failed(id, title, scenario.critical(), &e, started.elapsed());
                console.scenario_finished(&result, &[]);
                return Err(e);
            }
            Err(e) => {
                tracing::warn!("Scenario {} failed: {}", id, e);
                let result =
                    ScenarioResult::failed(id, title, scenario.critical(), &e, started.elapsed());
                console.scenario_finished(&result, &[]);
                summary.record(result);

                if scenario.critical() {
                    let abort = Error::critical_failure(id, &e.to_string());
                    tracing::warn!("{}; skipping remaining scenarios", abort);
                    summary.aborted = Some(abort.to_string());
                    break;
                }
            }
        }
    }

    console.summary(&summary);
    Ok(summary)
}

/// Issue a scenario's requests in order and classify the responses
///
/// A non-2xx response stops the remaining requests of the scenario.
/// Transport failures fail the scenario unless they hit its best-effort
/// tail.
async fn execute(
    transport: &dyn Transport,
    scenario: &dyn Scenario,
    ctx: &RunContext,
) -> Result<Pass> {
    let requests = scenario.requests(ctx)?;
    let mut responses: Vec<ApiResponse> = Vec::with_capacity(requests.len());

    for (i, request) in requests.iter().enumerate() {
        let response = match transport.send(request).await {
            Ok(response) => response,
            Err(e) if i > 0 && e.is_expected() && scenario.best_effort_tail() => {
                tracing::warn!("{} failed, continuing: {}", request.describe(), e);
                break;
            }
            Err(e) => return Err(e),
        };
        let ok = response.is_success();
        responses.push(response);
        if !ok {
            break;
        }
    }

    scenario.classify(&responses, ctx)
}
