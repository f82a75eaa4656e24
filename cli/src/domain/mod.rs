//! Domain layer — pure business logic, types, and validation.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, `std::process`, or `std::net`.
//! All functions are synchronous and take data in, returning data out.

pub mod assertions;
pub mod error;
pub mod expectations;
pub mod phase;
pub mod provision;
pub mod suite;
pub mod variables;

pub use error::{ConfigError, HarnessError};
pub use expectations::{ContainmentOrder, ExpectOverrides, Expectations, Exposure};
pub use phase::PhaseTracker;
pub use provision::{ApplyResult, DestroyOutcome, PlanSummary};
pub use suite::{
    InstanceTarget, LoadOptions, RetrySettings, ScenarioConfig, ScenarioMode, Suite, SuiteFile,
    TimeoutSettings,
};
pub use variables::validate_variables;
