//! # Testing & Assertions
//!
//! Status and body assertions for API responses, the scenario model, and the
//! randomized batch runner.
//!
//! ## Features
//! - Assertions that fail with expected vs. actual status
//! - Scenario results with observations (pass / fail / skip / duration)
//! - Sequential runner with a seeded shuffle and panic isolation
//! - Optional snapshot/restore around the whole run

pub mod assert;
pub mod runner;
pub mod scenario;
