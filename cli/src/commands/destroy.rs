//! `provcheck destroy` — best-effort teardown of leftovers from an
//! interrupted run.
//!
//! Runs against each scenario's configuration directory in place, so it
//! only finds resources whose state lives there (or in a remote backend).

use anyhow::Result;

use crate::app::AppContext;
use crate::application::services::suite_runner::destroy_suite;
use crate::commands::{SuiteArgs, SuiteFailed};
use crate::infra::config::load_suite;
use crate::output::{HumanRenderer, TerminalReporter, json};

/// Entry point for `provcheck destroy`.
///
/// # Errors
///
/// Returns an error if the suite cannot be loaded or any destroy failed.
pub async fn run(app: &AppContext, args: &SuiteArgs) -> Result<()> {
    // Nothing is inspected, so project/zone are not required.
    let suite = load_suite(&args.suite, &args.load_options(true))?;
    let provisioner = app.provisioner(suite.timeouts);
    let reporter = TerminalReporter::new(&app.output);

    let results = destroy_suite(&provisioner, &suite, &reporter).await;

    if app.is_json() {
        println!("{}", json::format_destroy(&results)?);
    } else {
        HumanRenderer::new(&app.output).render_destroy(&results);
    }

    let failed = results.iter().filter(|(_, ok)| !ok).count();
    if failed > 0 {
        return Err(SuiteFailed {
            failed,
            total: results.len(),
        }
        .into());
    }
    Ok(())
}
