//! `provcheck validate` — load and validate a suite file without touching
//! any infrastructure.

use anyhow::Result;

use crate::app::AppContext;
use crate::commands::SuiteArgs;
use crate::infra::config::load_suite;
use crate::output::{HumanRenderer, json};

/// Entry point for `provcheck validate`.
///
/// # Errors
///
/// Returns an error listing every problem found in the suite file.
pub fn run(app: &AppContext, args: &SuiteArgs) -> Result<()> {
    let suite = load_suite(&args.suite, &args.load_options(false))?;
    if app.is_json() {
        println!("{}", json::format_suite(&suite)?);
    } else {
        HumanRenderer::new(&app.output).render_suite(&suite);
    }
    Ok(())
}
