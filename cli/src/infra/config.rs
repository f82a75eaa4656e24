//! Suite file loading and `PROVCHECK_*` environment settings.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::domain::{LoadOptions, Suite, SuiteFile};
use crate::infra::compute::DEFAULT_COMPUTE_ENDPOINT;
use crate::infra::terraform::DEFAULT_TERRAFORM_BIN;

/// Environment settings, each read from `PROVCHECK_<FIELD>`:
///   - `PROVCHECK_TERRAFORM_BIN`    (default `terraform`)
///   - `PROVCHECK_COMPUTE_ENDPOINT` (default the public Compute endpoint)
///
/// `PROVCHECK_PROJECT` is a clap-level override on the suite commands and
/// `PROVCHECK_LOG` (tracing filter) is read directly by `main`.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct HarnessEnv {
    #[serde(default = "default_terraform_bin")]
    pub terraform_bin: String,

    #[serde(default = "default_compute_endpoint")]
    pub compute_endpoint: String,
}

fn default_terraform_bin() -> String {
    DEFAULT_TERRAFORM_BIN.to_string()
}

fn default_compute_endpoint() -> String {
    DEFAULT_COMPUTE_ENDPOINT.to_string()
}

impl HarnessEnv {
    pub const PREFIX: &'static str = "PROVCHECK_";

    /// # Errors
    ///
    /// Returns an error if a `PROVCHECK_*` variable cannot be parsed.
    pub fn from_env() -> Result<Self> {
        envy::prefixed(Self::PREFIX)
            .from_env()
            .context("failed to load settings from PROVCHECK_* env vars")
    }
}

/// Read, parse and validate a suite file. Relative scenario directories
/// resolve against the file's own directory.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, or fails validation.
pub fn load_suite(path: &Path, opts: &LoadOptions) -> Result<Suite> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read {}", path.display()))?;
    let file: SuiteFile = serde_yaml::from_str(&content)
        .with_context(|| format!("cannot parse {}", path.display()))?;
    let base_dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let suite = file.validate(base_dir, opts)?;
    tracing::debug!(path = %path.display(), scenarios = suite.scenarios.len(), "suite loaded");
    Ok(suite)
}
