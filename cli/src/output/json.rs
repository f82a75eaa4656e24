//! JSON output helpers.
//!
//! Every `--json` code path prints exactly one pretty-printed object on
//! stdout; progress and logs go to stderr or are suppressed.

use anyhow::{Context, Result};
use provcheck_common::SuiteReport;

use crate::domain::Suite;

/// Format a JSON error object.
///
/// Output (pretty-printed):
/// ```json
/// {
///   "error": true,
///   "message": "...",
///   "code": "..."
/// }
/// ```
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn format_error(message: &str, code: &str) -> Result<String> {
    let obj = serde_json::json!({
        "error": true,
        "message": message,
        "code": code,
    });
    serde_json::to_string_pretty(&obj).context("JSON serialization failed")
}

/// Format the CLI version: `{"version": "X.Y.Z"}`.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn format_version(version: &str) -> Result<String> {
    serde_json::to_string_pretty(&serde_json::json!({ "version": version }))
        .context("JSON serialization failed")
}

/// Format a suite run with a pass/fail summary.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn format_report(report: &SuiteReport) -> Result<String> {
    let obj = serde_json::json!({
        "passed": report.passed(),
        "failed": report.failed(),
        "scenarios": report.scenarios,
    });
    serde_json::to_string_pretty(&obj).context("JSON serialization failed")
}

/// Format the validated scenario list.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn format_suite(suite: &Suite) -> Result<String> {
    let scenarios: Vec<_> = suite
        .scenarios
        .iter()
        .map(|s| {
            serde_json::json!({
                "name": s.name,
                "mode": s.mode,
                "config_dir": s.config_dir,
                "instance_name": s.variables.instance_name,
                "negative": s.expected.expects_failure(),
            })
        })
        .collect();
    let obj = serde_json::json!({
        "valid": true,
        "max_parallel": suite.max_parallel,
        "scenarios": scenarios,
    });
    serde_json::to_string_pretty(&obj).context("JSON serialization failed")
}

/// Format the result of a destroy sweep.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn format_destroy(results: &[(String, bool)]) -> Result<String> {
    let scenarios: Vec<_> = results
        .iter()
        .map(|(name, ok)| serde_json::json!({ "name": name, "destroyed": ok }))
        .collect();
    serde_json::to_string_pretty(&serde_json::json!({ "scenarios": scenarios }))
        .context("JSON serialization failed")
}
