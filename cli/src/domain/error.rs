//! Typed domain error enums.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, `std::process`, or `std::net`.
//! All error types implement `thiserror::Error` and convert to `anyhow::Error`
//! via the `?` operator.

use std::time::Duration;

use provcheck_common::{FailureKind, Mismatch};
use thiserror::Error;

// ── Harness errors ────────────────────────────────────────────────────────────

/// Every way a scenario can fail, one variant per reportable kind.
#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("setup failed: {0}")]
    Setup(String),

    /// The provisioning tool rejected or failed the configuration.
    /// `diagnostics` is the tool's own text so callers can match on it.
    #[error("apply failed:\n{diagnostics}")]
    Apply { diagnostics: String },

    #[error("output '{name}' not found (available: {available})")]
    OutputNotFound { name: String, available: String },

    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("instance '{name}' not found in {project}/{zone}")]
    NotFound {
        project: String,
        zone: String,
        name: String,
    },

    #[error("transient error: {0}")]
    Transient(String),

    #[error("{operation} timed out after {}s", .after.as_secs())]
    Timeout {
        operation: &'static str,
        after: Duration,
    },

    #[error("{} assertion(s) failed:\n{}", .0.len(), bullet_list(.0))]
    Assertion(Vec<Mismatch>),

    #[error("compute API returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("teardown failed:\n{0}")]
    Teardown(String),
}

impl HarnessError {
    /// Stable kind used in reports.
    #[must_use]
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Setup(_) => FailureKind::Setup,
            Self::Apply { .. } => FailureKind::Apply,
            Self::OutputNotFound { .. } => FailureKind::OutputNotFound,
            Self::Auth(_) => FailureKind::Auth,
            Self::NotFound { .. } => FailureKind::NotFound,
            Self::Transient(_) => FailureKind::Transient,
            Self::Timeout { .. } => FailureKind::Timeout,
            Self::Assertion(_) => FailureKind::Assertion,
            Self::Api { .. } => FailureKind::Api,
            Self::Teardown(_) => FailureKind::Teardown,
        }
    }

    /// Whether the inspector may retry the failed call.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient(_))
    }

    /// Mismatch list for assertion failures, empty otherwise.
    #[must_use]
    pub fn mismatches(&self) -> &[Mismatch] {
        match self {
            Self::Assertion(m) => m,
            _ => &[],
        }
    }
}

fn bullet_list<T: std::fmt::Display>(items: &[T]) -> String {
    items
        .iter()
        .map(|i| format!("  - {i}"))
        .collect::<Vec<_>>()
        .join("\n")
}

// ── Config errors ─────────────────────────────────────────────────────────────

/// Errors found while validating a suite file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Suite file has no scenarios.")]
    Empty,

    #[error("Suite validation failed:\n{}", bullet_list(.0))]
    Invalid(Vec<String>),

    #[error("Unknown scenario '{name}'.\n\nAvailable scenarios: {available}")]
    UnknownScenario { name: String, available: String },
}
