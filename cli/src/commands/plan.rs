//! `provcheck plan` — dry-run every scenario; nothing is created.

use anyhow::Result;

use crate::app::AppContext;
use crate::commands::SuiteArgs;
use crate::commands::run::execute;
use crate::infra::config::load_suite;

/// Entry point for `provcheck plan`.
///
/// # Errors
///
/// Returns an error if the suite cannot be loaded or any scenario failed.
pub async fn run(app: &AppContext, args: &SuiteArgs) -> Result<()> {
    let suite = load_suite(&args.suite, &args.load_options(true))?;
    execute(app, &suite).await
}
