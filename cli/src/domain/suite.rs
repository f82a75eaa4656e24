//! Suite file schema and validation.
//!
//! Pure functions only. The YAML text is read by `infra::config`.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::time::Duration;

use provcheck_common::InstanceVariables;
use serde::{Deserialize, Serialize};

use crate::domain::error::ConfigError;
use crate::domain::expectations::{ExpectOverrides, Expectations};
use crate::domain::variables::validate_variables;

// ── Schema ───────────────────────────────────────────────────────────────────

/// Top-level suite file, e.g. `provcheck.yaml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SuiteFile {
    /// Project that owns the instances.
    #[serde(default)]
    pub project: Option<String>,
    /// Default zone for scenarios whose variables do not set one.
    #[serde(default)]
    pub zone: Option<String>,
    #[serde(default = "default_max_parallel")]
    pub max_parallel: usize,
    #[serde(default)]
    pub timeouts: TimeoutSettings,
    #[serde(default)]
    pub retry: RetrySettings,
    #[serde(default)]
    pub scenarios: Vec<ScenarioEntry>,
}

/// Wall-clock limits for provisioning tool invocations.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct TimeoutSettings {
    pub apply_secs: u64,
    pub destroy_secs: u64,
    /// Also bounds `init` and `output`.
    pub plan_secs: u64,
}

impl Default for TimeoutSettings {
    fn default() -> Self {
        Self {
            apply_secs: 1800,
            destroy_secs: 1200,
            plan_secs: 600,
        }
    }
}

impl TimeoutSettings {
    #[must_use]
    pub fn apply(&self) -> Duration {
        Duration::from_secs(self.apply_secs)
    }

    #[must_use]
    pub fn destroy(&self) -> Duration {
        Duration::from_secs(self.destroy_secs)
    }

    #[must_use]
    pub fn plan(&self) -> Duration {
        Duration::from_secs(self.plan_secs)
    }
}

/// Retry policy for transient control-plane errors.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct RetrySettings {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay_ms: 500,
        }
    }
}

impl RetrySettings {
    /// Bounded linear backoff: `base_delay * attempt`.
    #[must_use]
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        Duration::from_millis(u64::from(attempt).saturating_mul(self.base_delay_ms))
    }
}

/// How a scenario exercises its configuration.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioMode {
    /// Apply, inspect, assert, destroy.
    #[default]
    Apply,
    /// Dry-run only; never creates resources.
    PlanOnly,
}

/// One scenario as written in the suite file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScenarioEntry {
    pub name: String,
    /// Declarative configuration directory, relative to the suite file.
    pub config_dir: PathBuf,
    #[serde(default)]
    pub mode: ScenarioMode,
    /// Copy the configuration to a private directory before running.
    #[serde(default = "default_isolate")]
    pub isolate: bool,
    pub variables: InstanceVariables,
    #[serde(default)]
    pub expect: ExpectOverrides,
}

fn default_max_parallel() -> usize {
    4
}

fn default_isolate() -> bool {
    true
}

// ── Validated model ──────────────────────────────────────────────────────────

/// Where the live instance is looked up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceTarget {
    pub project: String,
    pub zone: String,
}

/// A validated, immutable scenario.
#[derive(Debug, Clone)]
pub struct ScenarioConfig {
    pub name: String,
    pub config_dir: PathBuf,
    pub mode: ScenarioMode,
    pub isolate: bool,
    pub variables: InstanceVariables,
    pub expected: Expectations,
    /// Present for `Apply` scenarios.
    pub target: Option<InstanceTarget>,
}

/// A validated suite.
#[derive(Debug, Clone)]
pub struct Suite {
    pub max_parallel: usize,
    pub timeouts: TimeoutSettings,
    pub retry: RetrySettings,
    pub scenarios: Vec<ScenarioConfig>,
}

/// Options applied while validating.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Replaces the file's `project`.
    pub project_override: Option<String>,
    /// Treat every scenario as `PlanOnly`.
    pub plan_only: bool,
    /// Keep only these scenarios (all when empty).
    pub only: Vec<String>,
}

impl SuiteFile {
    /// Validate into a [`Suite`]. Relative `config_dir` paths are resolved
    /// against `base_dir`.
    ///
    /// # Errors
    ///
    /// Returns `Empty`, `UnknownScenario`, or `Invalid` listing every problem.
    pub fn validate(self, base_dir: &Path, opts: &LoadOptions) -> Result<Suite, ConfigError> {
        let SuiteFile {
            project,
            zone,
            max_parallel,
            timeouts,
            retry,
            scenarios,
        } = self;

        if scenarios.is_empty() {
            return Err(ConfigError::Empty);
        }
        let scenarios = select(scenarios, &opts.only)?;

        let project = opts.project_override.clone().or(project);
        let mut errors = Vec::new();

        if max_parallel == 0 {
            errors.push("max_parallel must be at least 1".to_string());
        }
        if timeouts.apply_secs == 0 || timeouts.destroy_secs == 0 || timeouts.plan_secs == 0 {
            errors.push("timeouts must be greater than zero".to_string());
        }
        if retry.max_attempts == 0 {
            errors.push("retry.max_attempts must be at least 1".to_string());
        }

        let mut names = HashSet::new();
        let mut instances = HashSet::new();
        // In-place apply directories and the scenario that owns each.
        let mut shared_dirs: HashMap<PathBuf, String> = HashMap::new();
        let mut validated = Vec::with_capacity(scenarios.len());

        for entry in scenarios {
            let label = if entry.name.trim().is_empty() {
                errors.push("scenario name must not be empty".to_string());
                "<unnamed>".to_string()
            } else {
                entry.name.clone()
            };
            if !names.insert(entry.name.clone()) {
                errors.push(format!("duplicate scenario name '{label}'"));
            }

            errors.extend(
                validate_variables(&entry.variables)
                    .into_iter()
                    .map(|e| format!("{label}: {e}")),
            );

            let mode = if opts.plan_only {
                ScenarioMode::PlanOnly
            } else {
                entry.mode
            };

            let target = match mode {
                ScenarioMode::PlanOnly => None,
                ScenarioMode::Apply => {
                    if !instances.insert(entry.variables.instance_name.clone()) {
                        errors.push(format!(
                            "{label}: instance_name '{}' is used by another scenario",
                            entry.variables.instance_name
                        ));
                    }
                    let zone = entry.variables.zone.clone().or_else(|| zone.clone());
                    match (&project, zone) {
                        (Some(project), Some(zone)) => {
                            let ids = [("project", project.as_str()), ("zone", zone.as_str())];
                            for (field, value) in ids {
                                if !is_resource_id(value) {
                                    errors.push(format!(
                                        "{label}: {field} '{value}' must be a single path segment without '/' or whitespace"
                                    ));
                                }
                            }
                            Some(InstanceTarget {
                                project: project.clone(),
                                zone,
                            })
                        }
                        (None, _) => {
                            errors.push(format!("{label}: project is required to inspect instances"));
                            None
                        }
                        (_, None) => {
                            errors.push(format!(
                                "{label}: zone is required (set variables.zone or the suite zone)"
                            ));
                            None
                        }
                    }
                }
            };

            let config_dir = if entry.config_dir.is_absolute() {
                entry.config_dir.clone()
            } else {
                base_dir.join(&entry.config_dir)
            };
            if mode == ScenarioMode::Apply && !entry.isolate && max_parallel > 1 {
                if let Some(owner) = shared_dirs.get(&config_dir) {
                    errors.push(format!(
                        "{label}: shares config_dir {} with '{owner}' without isolation; \
                         set isolate: true or max_parallel: 1",
                        config_dir.display()
                    ));
                } else {
                    shared_dirs.insert(config_dir.clone(), label.clone());
                }
            }
            let expected = Expectations::derive(&entry.variables, &entry.expect);

            validated.push(ScenarioConfig {
                name: entry.name,
                config_dir,
                mode,
                isolate: entry.isolate,
                variables: entry.variables,
                expected,
                target,
            });
        }

        if !errors.is_empty() {
            return Err(ConfigError::Invalid(errors));
        }

        Ok(Suite {
            max_parallel,
            timeouts,
            retry,
            scenarios: validated,
        })
    }
}

/// Project and zone ids end up as single URL path segments.
fn is_resource_id(value: &str) -> bool {
    !matches!(value, "" | "." | "..") && !value.chars().any(|c| c == '/' || c.is_whitespace())
}

fn select(scenarios: Vec<ScenarioEntry>, only: &[String]) -> Result<Vec<ScenarioEntry>, ConfigError> {
    if only.is_empty() {
        return Ok(scenarios);
    }
    for wanted in only {
        if !scenarios.iter().any(|s| &s.name == wanted) {
            return Err(ConfigError::UnknownScenario {
                name: wanted.clone(),
                available: scenarios
                    .iter()
                    .map(|s| s.name.as_str())
                    .collect::<Vec<_>>()
                    .join(", "),
            });
        }
    }
    Ok(scenarios
        .into_iter()
        .filter(|s| only.contains(&s.name))
        .collect())
}
