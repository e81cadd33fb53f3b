use std::time::Instant;

use super::context::StepContext;
use super::feature::{Feature, FeatureScenario};
use super::registry::StepRegistry;
use crate::domain::Collection;
use crate::http::ApiClient;
use crate::state::{self, Snapshot};
use crate::testing::runner::{RunError, RunReport};
use crate::testing::scenario::{Outcome, ScenarioResult};

/// Collections the feature hooks snapshot and restore.
pub const TRACKED: [Collection; 2] = [Collection::Todos, Collection::Categories];

/// Runs parsed features in declaration order. Before the first scenario the
/// tracked collections are captured; after every scenario they are restored.
pub struct FeatureRunner<'a> {
    client: &'a ApiClient,
    registry: &'a StepRegistry,
}

impl<'a> FeatureRunner<'a> {
    pub fn new(client: &'a ApiClient, registry: &'a StepRegistry) -> Self {
        Self { client, registry }
    }

    pub fn run(&self, features: &[Feature]) -> Result<RunReport, RunError> {
        let started = Instant::now();
        let api_is_running = self.client.is_reachable();
        let snapshot = if api_is_running {
            Some(Snapshot::capture(self.client, &TRACKED).map_err(RunError::Capture)?)
        } else {
            tracing::warn!(base_url = self.client.base_url(), "API is not reachable, scenarios will be skipped");
            None
        };

        let mut results = Vec::new();
        for feature in features {
            for scenario in &feature.scenarios {
                let name = format!("{}: {}", feature.name, scenario.name);
                let mut result = self.run_scenario(&name, scenario, api_is_running);
                if let Some(snapshot) = &snapshot {
                    self.after_scenario(snapshot, &mut result);
                }
                results.push(result);
            }
        }

        Ok(RunReport::from_results(results, started.elapsed().as_millis()))
    }

    fn run_scenario(&self, name: &str, scenario: &FeatureScenario, api_is_running: bool) -> ScenarioResult {
        let started = Instant::now();
        let mut ctx = StepContext::new(self.client, api_is_running);
        let mut skipped = false;
        let mut failure = None;

        for step in &scenario.steps {
            let (binding, args) = match self.registry.find(step.keyword, &step.text) {
                Ok(found) => found,
                Err(error) => {
                    failure = Some(format!("line {}: {error}", step.line));
                    break;
                }
            };
            if binding.requires_api && !ctx.api_is_running {
                tracing::debug!(step = %step.text, "soft-skipped, API is not running");
                skipped = true;
                continue;
            }
            if let Err(error) = (binding.handler)(&mut ctx, &args) {
                failure = Some(format!("{} {} (line {}): {error}", step.keyword, step.text, step.line));
                break;
            }
        }

        let duration_ms = started.elapsed().as_millis();
        let outcome = match (&failure, skipped) {
            (Some(_), _) => Outcome::Failed,
            (None, true) => Outcome::Skipped,
            (None, false) => Outcome::Passed,
        };
        tracing::debug!(scenario = name, %outcome, "feature scenario finished");
        ScenarioResult::new(name, outcome, failure, Vec::new(), duration_ms)
    }

    /// A failed restore fails the scenario it followed.
    fn after_scenario(&self, snapshot: &Snapshot, result: &mut ScenarioResult) {
        if result.outcome == Outcome::Skipped {
            return;
        }
        if let Err(failure) = state::restore(self.client, snapshot) {
            tracing::error!(scenario = %result.name, %failure, "restore after scenario failed");
            if result.outcome == Outcome::Passed {
                result.outcome = Outcome::Failed;
                result.message = Some(format!("restore failed: {failure}"));
            }
        }
    }
}
