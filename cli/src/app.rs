//! Application context — unified state passed to every command handler.
//!
//! `AppContext` owns the output settings and the environment-derived
//! configuration, and builds the concrete adapters commands hand to the
//! application services.

use anyhow::Result;

use crate::domain::{RetrySettings, TimeoutSettings};
use crate::infra::auth::{AnyTokenSource, Credentials};
use crate::infra::command_runner::{DEFAULT_CMD_TIMEOUT, TokioCommandRunner};
use crate::infra::compute::ComputeClient;
use crate::infra::config::HarnessEnv;
use crate::infra::terraform::{TERRAFORM_ENV, TerraformProvisioner};
use crate::output::OutputContext;

/// Output rendering mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Human-readable terminal output (default).
    Human,
    /// Machine-readable JSON output.
    Json,
}

/// Output rendering flags passed from the top-level CLI.
pub struct OutputFlags {
    /// Disable ANSI color output.
    pub no_color: bool,
    /// Suppress non-error output.
    pub quiet: bool,
    /// Enable JSON output mode.
    pub json: bool,
}

/// Production inspector type.
pub type LiveInspector = ComputeClient<AnyTokenSource<TokioCommandRunner>>;

/// Unified application context passed to every command handler.
pub struct AppContext {
    /// Terminal output context (colors, quiet mode). Always quiet in JSON mode
    /// so stdout carries only the JSON document.
    pub output: OutputContext,
    /// Output rendering mode (human vs JSON).
    pub mode: OutputMode,
    /// `PROVCHECK_*` settings.
    pub env: HarnessEnv,
}

impl AppContext {
    /// Construct an `AppContext` from top-level CLI flags.
    ///
    /// # Errors
    ///
    /// Returns an error if the `PROVCHECK_*` environment cannot be parsed.
    pub fn new(flags: &OutputFlags) -> Result<Self> {
        let mode = if flags.json {
            OutputMode::Json
        } else {
            OutputMode::Human
        };
        Ok(Self {
            output: OutputContext::new(flags.no_color, flags.quiet || flags.json),
            mode,
            env: HarnessEnv::from_env()?,
        })
    }

    #[must_use]
    pub fn is_json(&self) -> bool {
        self.mode == OutputMode::Json
    }

    /// Terraform adapter bounded by the suite's timeouts.
    #[must_use]
    pub fn provisioner(&self, timeouts: TimeoutSettings) -> TerraformProvisioner<TokioCommandRunner> {
        let runner = TERRAFORM_ENV.iter().fold(
            TokioCommandRunner::new(timeouts.apply()),
            |runner, (k, v)| runner.with_env(*k, *v),
        );
        TerraformProvisioner::new(runner, self.env.terraform_bin.clone(), timeouts)
    }

    /// Compute API client using `GOOGLE_OAUTH_ACCESS_TOKEN` or gcloud.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn inspector(&self, retry: RetrySettings) -> Result<LiveInspector> {
        let tokens = AnyTokenSource::new(
            Credentials::from_env(),
            TokioCommandRunner::new(DEFAULT_CMD_TIMEOUT),
        );
        ComputeClient::new(&self.env.compute_endpoint, tokens, retry)
    }
}
