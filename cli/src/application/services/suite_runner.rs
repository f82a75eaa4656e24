//! Application service — run every scenario of a suite with bounded
//! parallelism.
//!
//! Scenarios share only the read-only adapters in [`Harness`]; each gets its
//! own [`ScenarioContext`].

use futures_util::StreamExt as _;
use futures_util::stream;
use provcheck_common::{ScenarioReport, SuiteReport};

use crate::application::ports::{InstanceInspector, ProgressReporter, Provisioner, WorkdirPreparer};
use crate::application::services::scenario_runner::{Harness, ScenarioContext, run_scenario};
use crate::domain::Suite;

/// Run all scenarios, at most `suite.max_parallel` at a time, on the calling
/// task. Reports come back in suite order.
pub async fn run_suite<P, I, W, R>(
    harness: &Harness<'_, P, I, W>,
    suite: &Suite,
    reporter: &R,
) -> SuiteReport
where
    P: Provisioner,
    I: InstanceInspector,
    W: WorkdirPreparer,
    R: ProgressReporter,
{
    tracing::info!(
        scenarios = suite.scenarios.len(),
        max_parallel = suite.max_parallel,
        "running suite"
    );

    let scenarios: Vec<ScenarioReport> = stream::iter(&suite.scenarios)
        .map(|scenario| run_scenario(harness, ScenarioContext { scenario, reporter }))
        .buffered(suite.max_parallel.max(1))
        .collect()
        .await;

    SuiteReport { scenarios }
}

/// Best-effort destroy of every scenario's configuration in place, for
/// cleaning up after an interrupted run. Failures are reported per scenario
/// and do not stop the sweep.
pub async fn destroy_suite<P, R>(provisioner: &P, suite: &Suite, reporter: &R) -> Vec<(String, bool)>
where
    P: Provisioner,
    R: ProgressReporter,
{
    let mut results = Vec::with_capacity(suite.scenarios.len());
    for scenario in &suite.scenarios {
        reporter.step(&format!("{}: destroying...", scenario.name));
        let outcome = match provisioner.initialize(&scenario.config_dir).await {
            Ok(()) => {
                provisioner
                    .destroy(&scenario.config_dir, &scenario.variables)
                    .await
            }
            Err(e) => Err(e),
        };
        match outcome {
            Ok(_) => {
                reporter.success(&format!("{}: destroyed", scenario.name));
                results.push((scenario.name.clone(), true));
            }
            Err(e) => {
                tracing::warn!(scenario = %scenario.name, error = %e, "destroy failed");
                reporter.warn(&format!("{}: {e}", scenario.name));
                results.push((scenario.name.clone(), false));
            }
        }
    }
    results
}
