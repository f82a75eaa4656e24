//! Pure variable-set validation.
//!
//! Checked when a suite is loaded so malformed values are reported before any
//! provisioning tool is started.

use provcheck_common::InstanceVariables;
use regex::Regex;
use std::sync::LazyLock;

/// RFC 1035 label, the naming rule Compute Engine applies to instances.
pub static INSTANCE_NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    // Safety: this is a compile-time constant pattern.
    #[allow(clippy::expect_used)]
    Regex::new(r"^[a-z]([-a-z0-9]{0,61}[a-z0-9])?$").expect("valid regex")
});

/// Fully-qualified Cloud KMS crypto key path.
pub static KMS_KEY_RE: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r"^projects/[^/]+/locations/[^/]+/keyRings/[^/]+/cryptoKeys/[^/]+$")
        .expect("valid regex")
});

/// Validate a variable set. Returns every violation, not just the first.
#[must_use]
pub fn validate_variables(vars: &InstanceVariables) -> Vec<String> {
    let mut errors = Vec::new();

    if !INSTANCE_NAME_RE.is_match(&vars.instance_name) {
        errors.push(format!(
            "instance_name '{}' must start with a lowercase letter, contain only lowercase \
             letters, digits and hyphens, and be at most 63 characters",
            vars.instance_name
        ));
    }

    if let Some(image) = &vars.image
        && !is_publisher_family(image)
    {
        errors.push(format!(
            "image '{image}' must have the form publisher/family"
        ));
    }

    if let Some(key) = &vars.cmek_key_name
        && !KMS_KEY_RE.is_match(key)
    {
        errors.push(format!(
            "cmek_key_name '{key}' must be projects/<p>/locations/<l>/keyRings/<r>/cryptoKeys/<k>"
        ));
    }

    if let Some(groups) = &vars.sole_tenancy_node_groups
        && groups.iter().any(|g| g.trim().is_empty())
    {
        errors.push("sole_tenancy_node_groups must not contain empty names".to_string());
    }

    for (field, value) in [("machine_type", &vars.machine_type), ("zone", &vars.zone)] {
        if value.as_deref().is_some_and(|v| v.trim().is_empty()) {
            errors.push(format!("{field} must not be empty when set"));
        }
    }

    errors
}

fn is_publisher_family(image: &str) -> bool {
    matches!(image.split_once('/'), Some((publisher, family))
        if !publisher.is_empty() && !family.is_empty() && !family.contains('/'))
}
