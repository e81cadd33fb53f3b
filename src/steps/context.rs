use crate::http::{ApiClient, ApiResponse};
use crate::testing::assert::Failure;

/// Per-scenario state shared by the steps of one scenario.
pub struct StepContext<'a> {
    client: &'a ApiClient,
    pub api_is_running: bool,
    pub response: Option<ApiResponse>,
}

impl<'a> StepContext<'a> {
    pub fn new(client: &'a ApiClient, api_is_running: bool) -> Self {
        Self {
            client,
            api_is_running,
            response: None,
        }
    }

    pub fn client(&self) -> &'a ApiClient {
        self.client
    }

    /// The response stored by the most recent request step.
    pub fn response(&self) -> Result<&ApiResponse, Failure> {
        self.response
            .as_ref()
            .ok_or_else(|| Failure::assertion("no response was recorded by an earlier step"))
    }
}
