//! `provcheck run` — apply, inspect, assert and tear down every scenario.

use anyhow::Result;
use provcheck_common::SuiteReport;

use crate::app::AppContext;
use crate::application::services::scenario_runner::Harness;
use crate::application::services::suite_runner::run_suite;
use crate::commands::{SuiteArgs, SuiteFailed};
use crate::domain::Suite;
use crate::infra::config::load_suite;
use crate::infra::workdir::LocalWorkdirs;
use crate::output::progress::SuiteProgress;
use crate::output::{HumanRenderer, TerminalReporter, json};

/// Entry point for `provcheck run`.
///
/// # Errors
///
/// Returns an error if the suite cannot be loaded, or `SuiteFailed` if any
/// scenario failed.
pub async fn run(app: &AppContext, args: &SuiteArgs) -> Result<()> {
    let suite = load_suite(&args.suite, &args.load_options(false))?;
    execute(app, &suite).await
}

/// Run a loaded suite and render its report. Shared with `plan`.
pub(crate) async fn execute(app: &AppContext, suite: &Suite) -> Result<()> {
    let provisioner = app.provisioner(suite.timeouts);
    let inspector = app.inspector(suite.retry)?;
    let harness = Harness {
        provisioner: &provisioner,
        inspector: &inspector,
        workdirs: &LocalWorkdirs,
    };

    let report = if app.output.show_progress() {
        let progress = SuiteProgress::start(suite.scenarios.len());
        let reporter = TerminalReporter::new(&app.output).with_spinner(progress.bar());
        let report = run_suite(&harness, suite, &reporter).await;
        progress.finish(
            report.all_passed(),
            &format!("{} passed, {} failed", report.passed(), report.failed()),
        );
        report
    } else {
        let reporter = TerminalReporter::new(&app.output);
        run_suite(&harness, suite, &reporter).await
    };

    render(app, &report)?;
    if report.all_passed() {
        Ok(())
    } else {
        Err(SuiteFailed {
            failed: report.failed(),
            total: report.scenarios.len(),
        }
        .into())
    }
}

fn render(app: &AppContext, report: &SuiteReport) -> Result<()> {
    if app.is_json() {
        println!("{}", json::format_report(report)?);
    } else {
        HumanRenderer::new(&app.output).render_report(report);
    }
    Ok(())
}
