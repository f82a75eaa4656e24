//! `provcheck version`

use anyhow::Result;

use crate::output::{HumanRenderer, OutputContext, json};

/// Print the version, as a JSON object with `--json`.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn run(ctx: &OutputContext, as_json: bool) -> Result<()> {
    let version = env!("CARGO_PKG_VERSION");
    if as_json {
        println!("{}", json::format_version(version)?);
    } else {
        HumanRenderer::new(ctx).render_version(version);
    }
    Ok(())
}
