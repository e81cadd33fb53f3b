use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::time::Instant;

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::Serialize;
use thiserror::Error;

use super::assert::Failure;
use super::scenario::{Outcome, Scenario, ScenarioContext, ScenarioResult};
use crate::domain::Collection;
use crate::http::{ApiClient, ApiError};
use crate::state::{self, RestoreReport, Snapshot};

#[derive(Debug, Error)]
pub enum RunError {
    #[error("system not ready: {0}")]
    NotReady(#[source] ApiError),

    #[error("failed to capture initial state: {0}")]
    Capture(#[source] Failure),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum RestoreOutcome {
    Restored { report: RestoreReport },
    Failed { message: String },
}

/// Summary of a batch run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunReport {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub duration_ms: u128,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    pub results: Vec<ScenarioResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub restore: Option<RestoreOutcome>,
}

impl RunReport {
    pub fn from_results(results: Vec<ScenarioResult>, duration_ms: u128) -> Self {
        let count = |outcome| results.iter().filter(|result| result.outcome == outcome).count();
        Self {
            total: results.len(),
            passed: count(Outcome::Passed),
            failed: count(Outcome::Failed),
            skipped: count(Outcome::Skipped),
            duration_ms,
            seed: None,
            restore: None,
            results,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_restore(mut self, restore: Option<RestoreOutcome>) -> Self {
        self.restore = restore;
        self
    }

    pub fn is_success(&self) -> bool {
        self.failed == 0 && !matches!(self.restore, Some(RestoreOutcome::Failed { .. }))
    }
}

/// Runs scenarios one at a time in a shuffled order.
#[derive(Debug, Clone, Default)]
pub struct Runner {
    seed: Option<u64>,
    restore: bool,
}

impl Runner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fixes the shuffle. Without a seed one is drawn at random and recorded
    /// in the report so the order can be replayed.
    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    /// Snapshot every collection before the run and reconcile after it.
    pub fn with_restore(mut self, restore: bool) -> Self {
        self.restore = restore;
        self
    }

    pub fn run(&self, client: &ApiClient, mut scenarios: Vec<Scenario>) -> Result<RunReport, RunError> {
        client.ensure_ready().map_err(RunError::NotReady)?;

        let snapshot = if self.restore {
            Some(Snapshot::capture(client, &Collection::ALL).map_err(RunError::Capture)?)
        } else {
            None
        };

        let seed = self.seed.unwrap_or_else(rand::random::<u64>);
        shuffle(&mut scenarios, seed);
        tracing::info!(count = scenarios.len(), seed, "running scenarios");

        let started = Instant::now();
        let results = scenarios
            .iter()
            .map(|scenario| execute(client, scenario))
            .collect();
        let duration_ms = started.elapsed().as_millis();

        let restore = snapshot.map(|snapshot| match state::restore(client, &snapshot) {
            Ok(report) => RestoreOutcome::Restored { report },
            Err(failure) => {
                tracing::error!(%failure, "restore failed, service state may leak into later runs");
                RestoreOutcome::Failed {
                    message: failure.to_string(),
                }
            }
        });

        Ok(RunReport::from_results(results, duration_ms)
            .with_seed(seed)
            .with_restore(restore))
    }
}

/// Uniform permutation, reproducible for a given seed.
pub fn shuffle(scenarios: &mut [Scenario], seed: u64) {
    let mut rng = StdRng::seed_from_u64(seed);
    scenarios.shuffle(&mut rng);
}

/// Runs one scenario, turning a returned failure or a panic into a failed
/// result so the caller can move on.
pub fn execute(client: &ApiClient, scenario: &Scenario) -> ScenarioResult {
    let started = Instant::now();
    let mut ctx = ScenarioContext::new(client);
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| (scenario.run)(&mut ctx)));
    let duration_ms = started.elapsed().as_millis();
    let observations = ctx.into_observations();

    let (outcome, message) = match outcome {
        Ok(Ok(())) => (Outcome::Passed, None),
        Ok(Err(failure)) => (Outcome::Failed, Some(failure.to_string())),
        Err(payload) => (Outcome::Failed, Some(format!("panicked: {}", panic_message(&*payload)))),
    };
    tracing::debug!(scenario = scenario.name, %outcome, duration_ms = duration_ms as u64, "scenario finished");

    ScenarioResult::new(scenario.name, outcome, message, observations, duration_ms)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
