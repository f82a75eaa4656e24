//! Provisioning results and parsing of the provisioning tool's text output.
//!
//! Pure functions only; the raw bytes come from the `Provisioner` adapter.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::domain::error::HarnessError;

pub const OUTPUT_VM_NAME: &str = "vm_name";
pub const OUTPUT_VM_INTERNAL_IP: &str = "vm_internal_ip";
pub const OUTPUT_VM_EXTERNAL_IP: &str = "vm_external_ip";

static ANSI_RE: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r"\x1b\[[0-9;?]*[A-Za-z]").expect("valid regex")
});

static PLAN_RE: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r"Plan: (\d+) to add, (\d+) to change, (\d+) to destroy").expect("valid regex")
});

/// Markers of a successful destroy that found nothing to remove.
const NOTHING_TO_DESTROY_MARKERS: &[&str] = &[
    "no objects need to be destroyed",
    "resources: 0 destroyed",
];

/// Markers of an error block caused by a resource that no longer exists.
const NOT_FOUND_MARKERS: &[&str] = &[
    "error 404",
    "notfound",
    "was not found",
    "does not exist",
];

// ── ApplyResult ──────────────────────────────────────────────────────────────

/// Named outputs captured after a successful apply.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ApplyResult {
    pub outputs: BTreeMap<String, String>,
}

impl ApplyResult {
    /// Look up an output by name.
    ///
    /// # Errors
    ///
    /// Returns `OutputNotFound` listing the available names.
    pub fn output(&self, name: &str) -> Result<&str, HarnessError> {
        self.outputs
            .get(name)
            .map(String::as_str)
            .ok_or_else(|| HarnessError::OutputNotFound {
                name: name.to_string(),
                available: if self.outputs.is_empty() {
                    "none".to_string()
                } else {
                    self.outputs.keys().cloned().collect::<Vec<_>>().join(", ")
                },
            })
    }

    /// Like [`output`](Self::output) but an absent output reads as empty.
    #[must_use]
    pub fn output_or_empty(&self, name: &str) -> &str {
        self.outputs.get(name).map_or("", String::as_str)
    }
}

/// Parse `output -json` into a name → string map.
///
/// String values are taken verbatim, `null` becomes the empty string and
/// every other value is rendered as compact JSON.
///
/// # Errors
///
/// Returns `Apply` if the bytes are not the expected JSON object.
pub fn parse_outputs(stdout: &[u8]) -> Result<ApplyResult, HarnessError> {
    let text = String::from_utf8_lossy(stdout);
    if text.trim().is_empty() {
        return Ok(ApplyResult::default());
    }
    let raw: BTreeMap<String, serde_json::Value> =
        serde_json::from_str(&text).map_err(|e| HarnessError::Apply {
            diagnostics: format!("cannot parse output JSON: {e}"),
        })?;

    let outputs = raw
        .into_iter()
        .map(|(name, entry)| {
            let value = match entry.get("value") {
                None | Some(serde_json::Value::Null) => String::new(),
                Some(serde_json::Value::String(s)) => s.clone(),
                Some(other) => other.to_string(),
            };
            (name, value)
        })
        .collect();
    Ok(ApplyResult { outputs })
}

// ── PlanSummary ──────────────────────────────────────────────────────────────

/// Resource counts reported by a dry-run plan.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PlanSummary {
    pub add: u32,
    pub change: u32,
    pub destroy: u32,
}

impl PlanSummary {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.add == 0 && self.change == 0 && self.destroy == 0
    }
}

/// Extract the `Plan: N to add, M to change, K to destroy` line.
/// Output without that line (e.g. "No changes.") yields an empty summary.
#[must_use]
pub fn parse_plan_summary(stdout: &str) -> PlanSummary {
    PLAN_RE
        .captures(stdout)
        .map(|caps| {
            let n = |i: usize| caps.get(i).and_then(|m| m.as_str().parse().ok()).unwrap_or(0);
            PlanSummary {
                add: n(1),
                change: n(2),
                destroy: n(3),
            }
        })
        .unwrap_or_default()
}

// ── Destroy ──────────────────────────────────────────────────────────────────

/// What a teardown call achieved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DestroyOutcome {
    Destroyed,
    /// Nothing was left to destroy; reported as a warning.
    AlreadyGone,
}

/// `true` when a successful destroy reports it had nothing to remove.
#[must_use]
pub fn nothing_to_destroy(diagnostics: &str) -> bool {
    let lower = diagnostics.to_ascii_lowercase();
    NOTHING_TO_DESTROY_MARKERS.iter().any(|m| lower.contains(m))
}

/// `true` when a failed destroy failed only because its resources are
/// gone: there is at least one `Error:` block and the summary line of every
/// block is a not-found error. Anything else may leave resources behind.
#[must_use]
pub fn only_not_found_errors(diagnostics: &str) -> bool {
    let summaries: Vec<String> = diagnostics
        .lines()
        .map(|line| line.trim_start_matches(['│', '╷', ' ', '\t']))
        .filter(|line| line.starts_with("Error:"))
        .map(str::to_ascii_lowercase)
        .collect();
    !summaries.is_empty()
        && summaries
            .iter()
            .all(|line| NOT_FOUND_MARKERS.iter().any(|m| line.contains(m)))
}

/// Join stderr and stdout into ANSI-free diagnostic text.
#[must_use]
pub fn diagnostics(stderr: &[u8], stdout: &[u8]) -> String {
    let stderr = String::from_utf8_lossy(stderr);
    let stdout = String::from_utf8_lossy(stdout);
    let joined = match (stderr.trim().is_empty(), stdout.trim().is_empty()) {
        (false, false) => format!("{}\n{}", stderr.trim_end(), stdout.trim_end()),
        (false, true) => stderr.trim_end().to_string(),
        _ => stdout.trim_end().to_string(),
    };
    ANSI_RE.replace_all(&joined, "").into_owned()
}
