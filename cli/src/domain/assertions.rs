//! Structural comparison of expected and observed instance state.
//!
//! All checks are pure and deterministic. Every check runs even after an
//! earlier one fails; callers receive the full list of mismatches.

use provcheck_common::{Mismatch, PlacementConstraint, ResourceSnapshot};

use crate::domain::error::HarnessError;
use crate::domain::expectations::{ContainmentOrder, Expectations, Exposure};
use crate::domain::provision::{
    ApplyResult, OUTPUT_VM_EXTERNAL_IP, OUTPUT_VM_INTERNAL_IP, OUTPUT_VM_NAME,
};

// ── Primitive checks ─────────────────────────────────────────────────────────

/// Equality check.
pub fn check_equal(field: &str, expected: &str, observed: &str, out: &mut Vec<Mismatch>) {
    if expected != observed {
        out.push(Mismatch::new(field, quoted(expected), quoted(observed)));
    }
}

/// Non-empty check.
pub fn check_non_empty(field: &str, observed: &str, out: &mut Vec<Mismatch>) {
    if observed.trim().is_empty() {
        out.push(Mismatch::new(field, "non-empty", "empty"));
    }
}

/// Presence/absence check for an optional address.
pub fn check_exposure(field: &str, expected: Exposure, observed: Option<&str>, out: &mut Vec<Mismatch>) {
    let present = observed.is_some_and(|v| !v.trim().is_empty());
    match (expected, present) {
        (Exposure::Absent, true) => out.push(Mismatch::new(
            field,
            "empty",
            quoted(observed.unwrap_or_default()),
        )),
        (Exposure::Present, false) => out.push(Mismatch::new(field, "non-empty", "empty")),
        _ => {}
    }
}

/// Boolean flag check; `None` skips the check.
pub fn check_flag(field: &str, expected: Option<bool>, observed: bool, out: &mut Vec<Mismatch>) {
    if let Some(want) = expected
        && want != observed
    {
        out.push(Mismatch::new(field, want.to_string(), observed.to_string()));
    }
}

/// Every expected item appears in `observed`, in any order.
#[must_use]
pub fn contains_unordered<T: PartialEq>(expected: &[T], observed: &[T]) -> bool {
    expected.iter().all(|e| observed.contains(e))
}

/// Expected items appear in `observed` as a subsequence (same relative order).
#[must_use]
pub fn contains_ordered<T: PartialEq>(expected: &[T], observed: &[T]) -> bool {
    let mut rest = observed.iter();
    expected.iter().all(|e| rest.any(|o| o == e))
}

/// Placement constraint containment check.
pub fn check_placement(
    expected: &[PlacementConstraint],
    order: ContainmentOrder,
    observed: &[PlacementConstraint],
    out: &mut Vec<Mismatch>,
) {
    if expected.is_empty() {
        return;
    }
    let ok = match order {
        ContainmentOrder::Unordered => contains_unordered(expected, observed),
        ContainmentOrder::Ordered => contains_ordered(expected, observed),
    };
    if !ok {
        out.push(Mismatch::new(
            "placement_constraints",
            format!("contains {}", list(expected)),
            list(observed),
        ));
    }
}

// ── Composite checks ─────────────────────────────────────────────────────────

/// Compare apply outputs and a live snapshot against expectations.
#[must_use]
pub fn check_instance(
    expect: &Expectations,
    outputs: &ApplyResult,
    snapshot: &ResourceSnapshot,
) -> Vec<Mismatch> {
    let mut out = Vec::new();

    check_equal("name", &expect.name, &snapshot.name, &mut out);
    if let Some(vm_name) = outputs.outputs.get(OUTPUT_VM_NAME) {
        check_equal("outputs.vm_name", vm_name, &snapshot.name, &mut out);
    }

    check_non_empty("network_interfaces", &snapshot.internal_address, &mut out);
    if let Some(ip) = outputs.outputs.get(OUTPUT_VM_INTERNAL_IP) {
        check_non_empty("outputs.vm_internal_ip", ip, &mut out);
        if !ip.is_empty() && !snapshot.internal_address.is_empty() {
            check_equal("outputs.vm_internal_ip", &snapshot.internal_address, ip, &mut out);
        }
    }

    check_exposure(
        "outputs.vm_external_ip",
        expect.external_address,
        Some(outputs.output_or_empty(OUTPUT_VM_EXTERNAL_IP)),
        &mut out,
    );
    check_exposure(
        "external_address",
        expect.external_address,
        snapshot.external_address.as_deref(),
        &mut out,
    );

    let flags = &snapshot.security_flags;
    check_flag("security.secure_boot", expect.flags.secure_boot, flags.secure_boot, &mut out);
    check_flag("security.vtpm", expect.flags.vtpm, flags.vtpm, &mut out);
    check_flag(
        "security.integrity_monitoring",
        expect.flags.integrity_monitoring,
        flags.integrity_monitoring,
        &mut out,
    );
    check_flag(
        "security.confidential_compute",
        expect.flags.confidential_compute,
        flags.confidential_compute,
        &mut out,
    );

    check_placement(
        &expect.placement,
        expect.placement_order,
        &snapshot.placement_constraints,
        &mut out,
    );

    if let Some(machine_type) = &expect.machine_type {
        check_equal("machine_type", machine_type, &snapshot.machine_type, &mut out);
    }

    if let Some(key) = &expect.cmek_key
        && !snapshot
            .disk_kms_keys
            .iter()
            .any(|k| k == key || k.starts_with(&format!("{key}/cryptoKeyVersions/")))
    {
        out.push(Mismatch::new(
            "disk_kms_keys",
            format!("contains {key}"),
            list(&snapshot.disk_kms_keys),
        ));
    }

    out
}

/// Every expected substring must appear in the tool's diagnostics.
#[must_use]
pub fn check_diagnostics(expected: &[String], diagnostics: &str) -> Vec<Mismatch> {
    expected
        .iter()
        .filter(|needle| !diagnostics.contains(needle.as_str()))
        .map(|needle| {
            Mismatch::new(
                "apply_error",
                format!("diagnostics containing {}", quoted(needle)),
                first_line(diagnostics),
            )
        })
        .collect()
}

/// Convert a mismatch list into a scenario result.
///
/// # Errors
///
/// Returns `Assertion` carrying every mismatch when the list is non-empty.
pub fn into_result(mismatches: Vec<Mismatch>) -> Result<(), HarnessError> {
    if mismatches.is_empty() {
        Ok(())
    } else {
        Err(HarnessError::Assertion(mismatches))
    }
}

fn quoted(s: &str) -> String {
    format!("'{s}'")
}

fn list<T: std::fmt::Display>(items: &[T]) -> String {
    if items.is_empty() {
        return "[]".to_string();
    }
    format!(
        "[{}]",
        items.iter().map(ToString::to_string).collect::<Vec<_>>().join("; ")
    )
}

fn first_line(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .map_or_else(|| "no diagnostics".to_string(), quoted)
}
