use thiserror::Error;

use crate::http::{ApiError, ApiResponse};

/// Status codes accepted as a successful delete.
pub const DELETED: &[u16] = &[200, 204];

/// Why a scenario, fixture or step did not complete.
#[derive(Debug, Error)]
pub enum Failure {
    #[error("{0}")]
    Assertion(String),

    #[error(transparent)]
    Api(#[from] ApiError),
}

impl Failure {
    pub fn assertion(message: impl Into<String>) -> Self {
        Failure::Assertion(message.into())
    }
}

pub fn ensure(condition: bool, message: impl Into<String>) -> Result<(), Failure> {
    if condition {
        Ok(())
    } else {
        Err(Failure::assertion(message))
    }
}

pub fn expect_status(response: &ApiResponse, expected: u16, context: &str) -> Result<(), Failure> {
    ensure(
        response.status == expected,
        format!("{context}: expected status {expected}, got {}", response.status),
    )
}

pub fn expect_status_in(response: &ApiResponse, expected: &[u16], context: &str) -> Result<(), Failure> {
    ensure(
        expected.contains(&response.status),
        format!(
            "{context}: expected status in {expected:?}, got {}",
            response.status
        ),
    )
}

pub fn expect_status_not(response: &ApiResponse, rejected: u16, context: &str) -> Result<(), Failure> {
    ensure(
        response.status != rejected,
        format!("{context}: status {rejected} was not expected"),
    )
}

pub fn expect_empty_body(response: &ApiResponse, context: &str) -> Result<(), Failure> {
    ensure(
        response.is_empty(),
        format!("{context}: expected an empty body, got {} bytes", response.body.len()),
    )
}
