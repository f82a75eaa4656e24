//! Port trait definitions for the Application layer.
//!
//! Ports are the interfaces (contracts) that infrastructure must fulfill.
//! This file imports only from `crate::domain`, never from `crate::infra`,
//! `crate::commands`, or `crate::output`.

use std::path::{Path, PathBuf};
use std::process::Output;
use std::time::Duration;

use anyhow::Result;
use provcheck_common::{InstanceVariables, ResourceSnapshot};

use crate::domain::{ApplyResult, DestroyOutcome, HarnessError, PlanSummary};

// ── Command Runner Port ───────────────────────────────────────────────────────

/// Abstracts process execution so infrastructure can be swapped or mocked.
#[allow(async_fn_in_trait)]
pub trait CommandRunner {
    /// Run a program and capture its output.
    ///
    /// Implementations should delegate to `run_with_timeout` using the
    /// instance's configured default timeout.
    async fn run(&self, program: &str, args: &[&str]) -> Result<Output>;
    /// Run a program with a custom timeout override.
    ///
    /// # Errors
    ///
    /// Returns an error if the process cannot be spawned or exceeds `timeout`.
    /// On timeout, the child process must be killed (not left orphaned).
    async fn run_with_timeout(
        &self,
        program: &str,
        args: &[&str],
        timeout: Duration,
    ) -> Result<Output>;
}

// ── Provisioning Port ─────────────────────────────────────────────────────────

/// Drives the external declarative provisioning tool for one configuration
/// directory. Every call takes the directory explicitly; implementations
/// hold no per-scenario state.
#[allow(async_fn_in_trait)]
pub trait Provisioner {
    /// Prepare the directory (plugin download, backend setup).
    async fn initialize(&self, dir: &Path) -> Result<(), HarnessError>;
    /// Create or update resources, then read back the named outputs.
    async fn apply_all(
        &self,
        dir: &Path,
        vars: &InstanceVariables,
    ) -> Result<ApplyResult, HarnessError>;
    /// Dry-run only. Never creates resources.
    async fn plan_only(
        &self,
        dir: &Path,
        vars: &InstanceVariables,
    ) -> Result<PlanSummary, HarnessError>;
    /// Remove every resource the configuration manages. Safe to repeat.
    async fn destroy(
        &self,
        dir: &Path,
        vars: &InstanceVariables,
    ) -> Result<DestroyOutcome, HarnessError>;
}

// ── Inspection Port ───────────────────────────────────────────────────────────

/// Reads live instance state from the cloud control plane.
#[allow(async_fn_in_trait)]
pub trait InstanceInspector {
    /// Fetch a point-in-time snapshot. Transient failures are retried by the
    /// implementation before an error is returned.
    async fn get_instance(
        &self,
        project: &str,
        zone: &str,
        name: &str,
    ) -> Result<ResourceSnapshot, HarnessError>;
}

/// Supplies bearer tokens for the control-plane API.
#[allow(async_fn_in_trait)]
pub trait TokenSource {
    async fn token(&self) -> Result<String, HarnessError>;
}

// ── Workspace Port ────────────────────────────────────────────────────────────

/// A directory prepared for one scenario. Dropping it removes any private
/// copy, including the provisioning tool's local state.
pub trait Workdir: Send {
    fn path(&self) -> &Path;

    /// Keep the directory on disk after teardown failed, so its state can
    /// still be destroyed by hand. Returns where it lives.
    fn persist(self, vars: &InstanceVariables) -> PathBuf;
}

/// Prepares the directory a scenario runs its provisioning tool in.
#[allow(async_fn_in_trait)]
pub trait WorkdirPreparer {
    type Dir: Workdir;

    /// A private copy of `config_dir` when `isolate` is set, otherwise
    /// `config_dir` itself.
    async fn prepare(&self, config_dir: &Path, isolate: bool) -> Result<Self::Dir, HarnessError>;
}

// ── Progress Reporting Port ───────────────────────────────────────────────────

/// Abstracts progress reporting so services can emit events without
/// depending on the Presentation layer. Sync on purpose.
pub trait ProgressReporter {
    /// Emit an in-progress step message.
    fn step(&self, message: &str);
    /// Emit a success message.
    fn success(&self, message: &str);
    /// Emit a warning message.
    fn warn(&self, message: &str);
}
