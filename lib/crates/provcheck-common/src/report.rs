use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle phase of a single scenario run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioPhase {
    Init,
    /// Dry-run validation (plan-only scenarios).
    Planning,
    Applying,
    Applied,
    Inspecting,
    Asserting,
    Destroying,
    Done,
    Failed,
}

impl std::fmt::Display for ScenarioPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Init => "init",
            Self::Planning => "planning",
            Self::Applying => "applying",
            Self::Applied => "applied",
            Self::Inspecting => "inspecting",
            Self::Asserting => "asserting",
            Self::Destroying => "destroying",
            Self::Done => "done",
            Self::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Stable error kind codes surfaced in reports.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Setup,
    Apply,
    OutputNotFound,
    Auth,
    NotFound,
    Transient,
    Timeout,
    Assertion,
    Api,
    Teardown,
}

impl FailureKind {
    /// Code used in JSON output and log fields.
    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            Self::Setup => "SETUP_ERROR",
            Self::Apply => "APPLY_ERROR",
            Self::OutputNotFound => "OUTPUT_NOT_FOUND",
            Self::Auth => "AUTH_ERROR",
            Self::NotFound => "NOT_FOUND",
            Self::Transient => "TRANSIENT_ERROR",
            Self::Timeout => "TIMEOUT",
            Self::Assertion => "ASSERTION_FAILURE",
            Self::Api => "API_ERROR",
            Self::Teardown => "TEARDOWN_ERROR",
        }
    }
}

/// One expected-vs-observed difference found by the comparator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Mismatch {
    pub field: String,
    pub expected: String,
    pub observed: String,
}

impl Mismatch {
    pub fn new(
        field: impl Into<String>,
        expected: impl Into<String>,
        observed: impl Into<String>,
    ) -> Self {
        Self {
            field: field.into(),
            expected: expected.into(),
            observed: observed.into(),
        }
    }
}

impl std::fmt::Display for Mismatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: expected {}, observed {}",
            self.field, self.expected, self.observed
        )
    }
}

/// Final result of a scenario.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    Passed,
    Failed {
        kind: FailureKind,
        message: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        mismatches: Vec<Mismatch>,
    },
}

impl Outcome {
    #[must_use]
    pub fn is_passed(&self) -> bool {
        matches!(self, Self::Passed)
    }

    #[must_use]
    pub fn kind(&self) -> Option<FailureKind> {
        match self {
            Self::Passed => None,
            Self::Failed { kind, .. } => Some(*kind),
        }
    }
}

/// Everything a caller needs to know about one scenario run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioReport {
    pub scenario: String,
    pub outcome: Outcome,
    /// Phases visited, in order, starting at `init`.
    pub phases: Vec<ScenarioPhase>,
    /// Whether teardown ran for this scenario.
    pub destroyed: bool,
    /// Set when resources may remain after a failed teardown.
    #[serde(default)]
    pub leaked: bool,
    /// Working directory kept on disk because it holds the state of
    /// resources teardown could not remove.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kept_workdir: Option<PathBuf>,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
}

/// Aggregated results for a suite run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuiteReport {
    pub scenarios: Vec<ScenarioReport>,
}

impl SuiteReport {
    #[must_use]
    pub fn passed(&self) -> usize {
        self.scenarios.iter().filter(|s| s.outcome.is_passed()).count()
    }

    #[must_use]
    pub fn failed(&self) -> usize {
        self.scenarios.len() - self.passed()
    }

    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.failed() == 0
    }
}
