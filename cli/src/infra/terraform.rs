//! Infrastructure implementation of the `Provisioner` port.
//!
//! `TerraformProvisioner<R>` routes every Terraform (or OpenTofu) CLI call
//! through a `CommandRunner`. Variables are handed over as a private
//! `*.tfvars.json` file so lists and booleans need no HCL quoting.

use std::io::Write as _;
use std::path::Path;
use std::process::Output;
use std::time::Duration;

use provcheck_common::InstanceVariables;
use tempfile::NamedTempFile;

use crate::application::ports::{CommandRunner, Provisioner};
use crate::domain::provision::{
    diagnostics, nothing_to_destroy, only_not_found_errors, parse_outputs, parse_plan_summary,
};
use crate::domain::{ApplyResult, DestroyOutcome, HarnessError, PlanSummary, TimeoutSettings};
use crate::infra::command_runner::CommandTimedOut;

/// Default provisioning binary.
pub const DEFAULT_TERRAFORM_BIN: &str = "terraform";

/// Destroy attempts before a failure is reported as `Teardown`.
pub const DESTROY_ATTEMPTS: u32 = 3;

/// Environment every Terraform child gets.
pub const TERRAFORM_ENV: &[(&str, &str)] = &[("TF_IN_AUTOMATION", "1"), ("TF_INPUT", "0")];

/// Infrastructure adapter that drives the Terraform CLI through a `CommandRunner`.
///
/// Generic over `R: CommandRunner` so that tests can inject a mock runner
/// without spawning real processes.
pub struct TerraformProvisioner<R: CommandRunner> {
    runner: R,
    bin: String,
    timeouts: TimeoutSettings,
    destroy_backoff: Duration,
}

impl<R: CommandRunner> TerraformProvisioner<R> {
    pub fn new(runner: R, bin: impl Into<String>, timeouts: TimeoutSettings) -> Self {
        Self {
            runner,
            bin: bin.into(),
            timeouts,
            destroy_backoff: Duration::from_secs(10),
        }
    }

    /// Base delay between destroy attempts (multiplied by the attempt number).
    #[must_use]
    pub fn with_destroy_backoff(mut self, backoff: Duration) -> Self {
        self.destroy_backoff = backoff;
        self
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    async fn exec(
        &self,
        operation: &'static str,
        dir: &Path,
        args: &[&str],
        timeout: Duration,
    ) -> Result<Output, HarnessError> {
        let chdir = format!("-chdir={}", dir.display());
        let mut full = Vec::with_capacity(args.len() + 1);
        full.push(chdir.as_str());
        full.extend_from_slice(args);

        tracing::debug!(operation, dir = %dir.display(), "running {}", self.bin);
        self.runner
            .run_with_timeout(&self.bin, &full, timeout)
            .await
            .map_err(|e| run_error(operation, &e))
    }

    async fn destroy_once(
        &self,
        dir: &Path,
        var_file: &str,
    ) -> Result<DestroyOutcome, HarnessError> {
        let out = self
            .exec(
                "destroy",
                dir,
                &["destroy", "-input=false", "-auto-approve", "-no-color", var_file],
                self.timeouts.destroy(),
            )
            .await?;
        let diag = diagnostics(&out.stderr, &out.stdout);
        if out.status.success() {
            if nothing_to_destroy(&diag) {
                return Ok(DestroyOutcome::AlreadyGone);
            }
            return Ok(DestroyOutcome::Destroyed);
        }
        if only_not_found_errors(&diag) {
            tracing::warn!(dir = %dir.display(), "destroy reported resources already gone");
            return Ok(DestroyOutcome::AlreadyGone);
        }
        Err(HarnessError::Teardown(diag))
    }
}

impl<R: CommandRunner> Provisioner for TerraformProvisioner<R> {
    async fn initialize(&self, dir: &Path) -> Result<(), HarnessError> {
        ensure_config_dir(dir).await?;
        let out = self
            .exec("init", dir, &["init", "-input=false", "-no-color"], self.timeouts.plan())
            .await?;
        if !out.status.success() {
            return Err(HarnessError::Setup(format!(
                "init failed in {}:\n{}",
                dir.display(),
                diagnostics(&out.stderr, &out.stdout)
            )));
        }
        Ok(())
    }

    async fn apply_all(
        &self,
        dir: &Path,
        vars: &InstanceVariables,
    ) -> Result<ApplyResult, HarnessError> {
        let var_file = write_var_file(vars)?;
        let var_arg = var_file_arg(&var_file);
        let out = self
            .exec(
                "apply",
                dir,
                &["apply", "-input=false", "-auto-approve", "-no-color", &var_arg],
                self.timeouts.apply(),
            )
            .await?;
        if !out.status.success() {
            return Err(HarnessError::Apply {
                diagnostics: diagnostics(&out.stderr, &out.stdout),
            });
        }
        tracing::info!(instance = %vars.instance_name, "apply converged");

        // Resources exist from here on: failures are not `Apply`.
        let out = self
            .exec("output", dir, &["output", "-json", "-no-color"], self.timeouts.plan())
            .await?;
        if !out.status.success() {
            return Err(HarnessError::Setup(format!(
                "reading outputs failed:\n{}",
                diagnostics(&out.stderr, &out.stdout)
            )));
        }
        parse_outputs(&out.stdout).map_err(|e| HarnessError::Setup(e.to_string()))
    }

    async fn plan_only(
        &self,
        dir: &Path,
        vars: &InstanceVariables,
    ) -> Result<PlanSummary, HarnessError> {
        let var_file = write_var_file(vars)?;
        let var_arg = var_file_arg(&var_file);
        let out = self
            .exec(
                "plan",
                dir,
                &["plan", "-input=false", "-no-color", &var_arg],
                self.timeouts.plan(),
            )
            .await?;
        if !out.status.success() {
            return Err(HarnessError::Apply {
                diagnostics: diagnostics(&out.stderr, &out.stdout),
            });
        }
        Ok(parse_plan_summary(&String::from_utf8_lossy(&out.stdout)))
    }

    async fn destroy(
        &self,
        dir: &Path,
        vars: &InstanceVariables,
    ) -> Result<DestroyOutcome, HarnessError> {
        let var_file = write_var_file(vars)?;
        let var_arg = var_file_arg(&var_file);

        let mut attempt = 1;
        loop {
            match self.destroy_once(dir, &var_arg).await {
                Ok(outcome) => return Ok(outcome),
                Err(HarnessError::Teardown(diag)) if attempt < DESTROY_ATTEMPTS => {
                    tracing::warn!(attempt, error = %diag, "destroy failed; retrying");
                    tokio::time::sleep(self.destroy_backoff * attempt).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Map a runner failure: a killed child becomes `Timeout`, anything else
/// (missing binary, I/O) is a setup problem.
fn run_error(operation: &'static str, err: &anyhow::Error) -> HarnessError {
    match err.downcast_ref::<CommandTimedOut>() {
        Some(t) => HarnessError::Timeout {
            operation,
            after: t.after,
        },
        None => HarnessError::Setup(format!("{operation}: {err:#}")),
    }
}

/// The directory must exist and hold at least one `*.tf` / `*.tf.json` file.
async fn ensure_config_dir(dir: &Path) -> Result<(), HarnessError> {
    let meta = tokio::fs::metadata(dir).await.map_err(|e| {
        HarnessError::Setup(format!("configuration directory {}: {e}", dir.display()))
    })?;
    if !meta.is_dir() {
        return Err(HarnessError::Setup(format!(
            "{} is not a directory",
            dir.display()
        )));
    }
    let mut entries = tokio::fs::read_dir(dir)
        .await
        .map_err(|e| HarnessError::Setup(format!("cannot read {}: {e}", dir.display())))?;
    while let Ok(Some(entry)) = entries.next_entry().await {
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if name.ends_with(".tf") || name.ends_with(".tf.json") {
            return Ok(());
        }
    }
    Err(HarnessError::Setup(format!(
        "{} contains no .tf or .tf.json files",
        dir.display()
    )))
}

/// Serialise the variables to a private `*.tfvars.json` file. The file is
/// removed when the returned handle is dropped.
fn write_var_file(vars: &InstanceVariables) -> Result<NamedTempFile, HarnessError> {
    let setup = |e: &dyn std::fmt::Display| HarnessError::Setup(format!("writing variables: {e}"));
    let mut file = tempfile::Builder::new()
        .prefix("provcheck-")
        .suffix(".tfvars.json")
        .tempfile()
        .map_err(|e| setup(&e))?;
    let json = serde_json::to_vec_pretty(vars).map_err(|e| setup(&e))?;
    file.write_all(&json).map_err(|e| setup(&e))?;
    file.flush().map_err(|e| setup(&e))?;
    Ok(file)
}

fn var_file_arg(file: &NamedTempFile) -> String {
    format!("-var-file={}", file.path().display())
}
