use std::fmt::{self, Debug, Display};

use clap::ValueEnum;
use serde::Serialize;

use super::assert::Failure;
use crate::http::ApiClient;

/// Resource a scenario probes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Resource {
    Todos,
    Projects,
}

/// How the probed behaviour relates to the service documentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Group {
    Documented,
    Undocumented,
    Payloads,
    Unexpected,
}

pub type ScenarioFn = fn(&mut ScenarioContext<'_>) -> Result<(), Failure>;

/// One independent probe: setup, action, assertion and its own cleanup.
#[derive(Clone, Copy)]
pub struct Scenario {
    pub name: &'static str,
    pub resource: Resource,
    pub group: Group,
    pub run: ScenarioFn,
}

impl Debug for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scenario")
            .field("name", &self.name)
            .field("resource", &self.resource)
            .field("group", &self.group)
            .finish_non_exhaustive()
    }
}

/// A `key = value` note about which branch of service behaviour a scenario saw.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Observation {
    pub key: String,
    pub value: String,
}

impl Display for Observation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {}", self.key, self.value)
    }
}

/// Handed to each scenario: the client plus a place to record observations.
pub struct ScenarioContext<'a> {
    client: &'a ApiClient,
    observations: Vec<Observation>,
}

impl<'a> ScenarioContext<'a> {
    pub fn new(client: &'a ApiClient) -> Self {
        Self {
            client,
            observations: Vec::new(),
        }
    }

    pub fn client(&self) -> &'a ApiClient {
        self.client
    }

    pub fn observe(&mut self, key: impl Into<String>, value: impl ToString) {
        let observation = Observation {
            key: key.into(),
            value: value.to_string(),
        };
        tracing::debug!(%observation, "observed");
        self.observations.push(observation);
    }

    pub fn into_observations(self) -> Vec<Observation> {
        self.observations
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Passed,
    Failed,
    Skipped,
}

impl Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Outcome::Passed => "PASSED",
            Outcome::Failed => "FAILED",
            Outcome::Skipped => "SKIPPED",
        };
        f.write_str(label)
    }
}

/// Outcome of a single execution. Built once, never changed afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScenarioResult {
    pub name: String,
    pub outcome: Outcome,
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub observations: Vec<Observation>,
    pub duration_ms: u128,
}

impl ScenarioResult {
    pub fn new(
        name: impl Into<String>,
        outcome: Outcome,
        message: Option<String>,
        observations: Vec<Observation>,
        duration_ms: u128,
    ) -> Self {
        Self {
            name: name.into(),
            outcome,
            message,
            observations,
            duration_ms,
        }
    }
}
