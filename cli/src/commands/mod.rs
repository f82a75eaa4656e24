//! Command implementations

pub mod destroy;
pub mod plan;
pub mod run;
pub mod validate;
pub mod version;

use std::path::PathBuf;

use clap::Args;

use crate::domain::LoadOptions;

/// Arguments shared by every command that reads a suite file.
#[derive(Args, Debug, Clone)]
pub struct SuiteArgs {
    /// Path to the suite YAML file
    pub suite: PathBuf,

    /// Only these scenarios (repeatable)
    #[arg(short, long = "scenario", value_name = "NAME")]
    pub scenarios: Vec<String>,

    /// Project that owns the instances (overrides the suite file)
    #[arg(long, env = "PROVCHECK_PROJECT")]
    pub project: Option<String>,
}

impl SuiteArgs {
    #[must_use]
    pub fn load_options(&self, plan_only: bool) -> LoadOptions {
        LoadOptions {
            project_override: self.project.clone(),
            plan_only,
            only: self.scenarios.clone(),
        }
    }
}

/// Returned when a suite ran to completion but not every scenario passed.
#[derive(Debug, thiserror::Error)]
#[error("{failed} of {total} scenario(s) failed")]
pub struct SuiteFailed {
    pub failed: usize,
    pub total: usize,
}
