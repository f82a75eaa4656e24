use serde::{Deserialize, Serialize};

/// Variable overlay passed to a declarative configuration.
///
/// Every option the harness understands is listed here with its type.
/// Unset options are omitted from the generated variable file so the
/// configuration's own defaults apply. Unknown keys are rejected when a
/// suite file is parsed.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct InstanceVariables {
    pub instance_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub machine_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zone: Option<String>,
    /// Boot image in `publisher/family` form, e.g. `debian-cloud/debian-11`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enable_iap: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enable_confidential_vm: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enable_shielded_secure_boot: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enable_shielded_vtpm: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enable_shielded_integrity_monitoring: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sole_tenancy_node_groups: Option<Vec<String>>,
    /// Fully-qualified KMS key path used for disk encryption.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cmek_key_name: Option<String>,
}

impl InstanceVariables {
    /// Minimal variable set naming only the instance.
    #[must_use]
    pub fn named(instance_name: impl Into<String>) -> Self {
        Self {
            instance_name: instance_name.into(),
            ..Self::default()
        }
    }
}
