//! Application service — run one scenario end to end.
//!
//! Imports only from `crate::domain` and `crate::application::ports`.
//! All I/O is routed through injected port traits.

use std::path::PathBuf;
use std::time::Instant;

use chrono::Utc;
use provcheck_common::{Mismatch, Outcome, ScenarioPhase, ScenarioReport};
use tracing::Instrument;

use crate::application::ports::{
    InstanceInspector, ProgressReporter, Provisioner, Workdir, WorkdirPreparer,
};
use crate::application::services::lease::{Acquired, AppliedLease};
use crate::domain::assertions::{check_diagnostics, check_instance, into_result};
use crate::domain::provision::{OUTPUT_VM_INTERNAL_IP, OUTPUT_VM_NAME};
use crate::domain::{
    ApplyResult, DestroyOutcome, HarnessError, InstanceTarget, PhaseTracker, ScenarioConfig,
    ScenarioMode,
};

/// The adapters a scenario runs against. Shared by every scenario of a suite.
pub struct Harness<'a, P, I, W> {
    pub provisioner: &'a P,
    pub inspector: &'a I,
    pub workdirs: &'a W,
}

/// Per-scenario state passed explicitly to every step.
pub struct ScenarioContext<'a, R: ProgressReporter> {
    pub scenario: &'a ScenarioConfig,
    pub reporter: &'a R,
}

/// Mutable bookkeeping for one run.
struct RunState {
    phases: PhaseTracker,
    destroyed: bool,
    leaked: bool,
    kept_workdir: Option<PathBuf>,
}

impl RunState {
    fn enter(&mut self, phase: ScenarioPhase) -> Result<(), HarnessError> {
        self.phases
            .advance(phase)
            .map_err(|e| HarnessError::Setup(format!("internal: {e}")))
    }

    /// Move to `Failed` unless already there.
    fn fail(&mut self) {
        self.settle(ScenarioPhase::Failed);
    }

    /// Move to a terminal `phase` unless already there. An illegal move is
    /// logged and leaves the history as it was.
    fn settle(&mut self, phase: ScenarioPhase) {
        if self.phases.current() == phase {
            return;
        }
        if let Err(e) = self.phases.advance(phase) {
            tracing::warn!(error = %e, "scenario phase history is incomplete");
        }
    }
}

/// Run one scenario and report on it. Never panics on scenario failure;
/// every error ends up in the returned report.
pub async fn run_scenario<P, I, W, R>(
    harness: &Harness<'_, P, I, W>,
    ctx: ScenarioContext<'_, R>,
) -> ScenarioReport
where
    P: Provisioner,
    I: InstanceInspector,
    W: WorkdirPreparer,
    R: ProgressReporter,
{
    let started_at = Utc::now();
    let clock = Instant::now();
    let scenario = ctx.scenario;
    let mut st = RunState {
        phases: PhaseTracker::new(),
        destroyed: false,
        leaked: false,
        kept_workdir: None,
    };

    let span = tracing::info_span!("scenario", name = %scenario.name);
    let result = async {
        match scenario.mode {
            ScenarioMode::Apply => run_apply(harness, &ctx, &mut st).await,
            ScenarioMode::PlanOnly => run_plan(harness, &ctx, &mut st).await,
        }
    }
    .instrument(span)
    .await;

    let outcome = match result {
        Ok(()) => {
            st.settle(ScenarioPhase::Done);
            ctx.reporter.success(&format!("{}: passed", scenario.name));
            Outcome::Passed
        }
        Err(err) => {
            st.fail();
            tracing::warn!(kind = err.kind().code(), error = %err, "scenario failed");
            ctx.reporter
                .warn(&format!("{}: {}", scenario.name, err.kind().code()));
            Outcome::Failed {
                kind: err.kind(),
                message: err.to_string(),
                mismatches: err.mismatches().to_vec(),
            }
        }
    };

    ScenarioReport {
        scenario: scenario.name.clone(),
        outcome,
        phases: st.phases.into_history(),
        destroyed: st.destroyed,
        leaked: st.leaked,
        kept_workdir: st.kept_workdir,
        started_at,
        duration_ms: u64::try_from(clock.elapsed().as_millis()).unwrap_or(u64::MAX),
    }
}

/// Apply → inspect → assert → destroy.
async fn run_apply<P, I, W, R>(
    harness: &Harness<'_, P, I, W>,
    ctx: &ScenarioContext<'_, R>,
    st: &mut RunState,
) -> Result<(), HarnessError>
where
    P: Provisioner,
    I: InstanceInspector,
    W: WorkdirPreparer,
    R: ProgressReporter,
{
    let scenario = ctx.scenario;
    let target = scenario.target.as_ref().ok_or_else(|| {
        HarnessError::Setup(format!("{}: no project/zone to inspect", scenario.name))
    })?;

    let workdir = harness
        .workdirs
        .prepare(&scenario.config_dir, scenario.isolate)
        .await?;
    let dir = workdir.path().to_path_buf();

    ctx.reporter.step(&format!("{}: initializing...", scenario.name));
    harness.provisioner.initialize(&dir).await?;

    st.enter(ScenarioPhase::Applying)?;
    ctx.reporter.step(&format!("{}: applying...", scenario.name));

    let result = match AppliedLease::acquire(harness.provisioner, &dir, &scenario.variables).await {
        Acquired::Rejected(err) => match (&scenario.expected.apply_error, err) {
            (Some(expected), HarnessError::Apply { diagnostics }) => {
                tracing::info!("apply rejected as expected; checking diagnostics");
                st.enter(ScenarioPhase::Asserting)?;
                into_result(check_diagnostics(expected, &diagnostics))?;
                st.enter(ScenarioPhase::Done)
            }
            (_, err) => Err(err),
        },
        Acquired::Interrupted { lease, error } => teardown(ctx, st, lease, Err(error)).await,
        Acquired::Applied { lease, outputs } => {
            st.enter(ScenarioPhase::Applied)?;
            let verdict = verify(harness.inspector, ctx, st, target, &outputs).await;
            teardown(ctx, st, lease, verdict).await
        }
    };

    // The workdir holds the only state of leaked resources.
    if st.leaked {
        let kept = workdir.persist(&scenario.variables);
        ctx.reporter.warn(&format!(
            "{}: state kept in {} for a manual destroy",
            scenario.name,
            kept.display()
        ));
        st.kept_workdir = Some(kept);
    }
    result
}

/// Inspect the live instance and compare it with the expectations.
async fn verify<I, R>(
    inspector: &I,
    ctx: &ScenarioContext<'_, R>,
    st: &mut RunState,
    target: &InstanceTarget,
    outputs: &ApplyResult,
) -> Result<(), HarnessError>
where
    I: InstanceInspector,
    R: ProgressReporter,
{
    let scenario = ctx.scenario;
    if scenario.expected.expects_failure() {
        st.enter(ScenarioPhase::Asserting)?;
        return Err(HarnessError::Assertion(vec![Mismatch::new(
            "apply_error",
            "configuration to be rejected",
            "apply succeeded",
        )]));
    }

    outputs.output(OUTPUT_VM_INTERNAL_IP)?;
    st.enter(ScenarioPhase::Inspecting)?;
    let name = outputs
        .outputs
        .get(OUTPUT_VM_NAME)
        .filter(|n| !n.is_empty())
        .unwrap_or(&scenario.variables.instance_name);
    ctx.reporter
        .step(&format!("{}: inspecting instance {name}...", scenario.name));
    let snapshot = inspector
        .get_instance(&target.project, &target.zone, name)
        .await?;
    tracing::debug!(status = %snapshot.status, "instance snapshot fetched");

    st.enter(ScenarioPhase::Asserting)?;
    into_result(check_instance(&scenario.expected, outputs, &snapshot))
}

/// Release the lease and merge its result with the scenario verdict.
///
/// A teardown failure after a failed scenario is logged and flagged; the
/// primary error is kept. After a passing scenario it becomes the result.
async fn teardown<P, R>(
    ctx: &ScenarioContext<'_, R>,
    st: &mut RunState,
    lease: AppliedLease<'_, P>,
    verdict: Result<(), HarnessError>,
) -> Result<(), HarnessError>
where
    P: Provisioner,
    R: ProgressReporter,
{
    let scenario = &ctx.scenario.name;
    if verdict.is_err() {
        st.fail();
    }
    st.enter(ScenarioPhase::Destroying)?;
    st.destroyed = true;
    ctx.reporter.step(&format!("{scenario}: destroying..."));

    match lease.release().await {
        Ok(DestroyOutcome::Destroyed) => {
            tracing::info!("teardown complete");
            verdict
        }
        Ok(DestroyOutcome::AlreadyGone) => {
            ctx.reporter
                .warn(&format!("{scenario}: resources were already gone at teardown"));
            verdict
        }
        Err(teardown_err) => {
            st.leaked = true;
            match verdict {
                Err(primary) => {
                    tracing::warn!(error = %teardown_err, "teardown failed after scenario failure");
                    ctx.reporter
                        .warn(&format!("{scenario}: teardown failed, resources may remain"));
                    Err(primary)
                }
                Ok(()) => Err(match teardown_err {
                    err @ HarnessError::Teardown(_) => err,
                    other => HarnessError::Teardown(other.to_string()),
                }),
            }
        }
    }
}

/// Plan → (negative scenarios) check diagnostics. Nothing to tear down.
async fn run_plan<P, I, W, R>(
    harness: &Harness<'_, P, I, W>,
    ctx: &ScenarioContext<'_, R>,
    st: &mut RunState,
) -> Result<(), HarnessError>
where
    P: Provisioner,
    W: WorkdirPreparer,
    R: ProgressReporter,
{
    let scenario = ctx.scenario;
    let workdir = harness
        .workdirs
        .prepare(&scenario.config_dir, scenario.isolate)
        .await?;
    let dir = workdir.path();

    ctx.reporter.step(&format!("{}: initializing...", scenario.name));
    harness.provisioner.initialize(dir).await?;

    st.enter(ScenarioPhase::Planning)?;
    ctx.reporter.step(&format!("{}: planning...", scenario.name));

    match (
        harness.provisioner.plan_only(dir, &scenario.variables).await,
        &scenario.expected.apply_error,
    ) {
        (Ok(summary), None) => {
            tracing::info!(
                add = summary.add,
                change = summary.change,
                destroy = summary.destroy,
                "plan succeeded"
            );
            Ok(())
        }
        (Ok(summary), Some(_)) => {
            st.enter(ScenarioPhase::Asserting)?;
            Err(HarnessError::Assertion(vec![Mismatch::new(
                "apply_error",
                "configuration to be rejected",
                format!(
                    "plan succeeded ({} to add, {} to change, {} to destroy)",
                    summary.add, summary.change, summary.destroy
                ),
            )]))
        }
        (Err(HarnessError::Apply { diagnostics }), Some(expected)) => {
            st.enter(ScenarioPhase::Asserting)?;
            into_result(check_diagnostics(expected, &diagnostics))
        }
        (Err(err), _) => Err(err),
    }
}
