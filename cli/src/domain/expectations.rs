//! Expected instance properties, derived from a variable set.
//!
//! Pure functions only.

use provcheck_common::{InstanceVariables, PlacementConstraint};
use serde::{Deserialize, Serialize};

/// Whether the instance must expose an external address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Exposure {
    /// No external address (e.g. access through IAP only).
    Absent,
    /// A non-empty external address.
    Present,
    #[default]
    Unchecked,
}

impl Exposure {
    /// IAP access replaces the external address: `true` means `Absent`,
    /// `false` means `Present`, unset means `Unchecked`.
    #[must_use]
    pub fn from_iap(enable_iap: Option<bool>) -> Self {
        match enable_iap {
            Some(true) => Self::Absent,
            Some(false) => Self::Present,
            None => Self::Unchecked,
        }
    }
}

/// How placement constraint lists are compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ContainmentOrder {
    /// Every expected constraint appears somewhere in the observed list.
    #[default]
    Unordered,
    /// Expected constraints appear in the observed list in the same order.
    Ordered,
}

/// Expected shielded/confidential flags. `None` means "not checked".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExpectedFlags {
    pub secure_boot: Option<bool>,
    pub vtpm: Option<bool>,
    pub integrity_monitoring: Option<bool>,
    pub confidential_compute: Option<bool>,
}

/// The `expect:` block of a scenario. Every field overrides the value
/// derived from the scenario's variables.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ExpectOverrides {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub external_address: Option<Exposure>,
    #[serde(default)]
    pub secure_boot: Option<bool>,
    #[serde(default)]
    pub vtpm: Option<bool>,
    #[serde(default)]
    pub integrity_monitoring: Option<bool>,
    #[serde(default)]
    pub confidential_compute: Option<bool>,
    #[serde(default)]
    pub placement: Option<Vec<PlacementConstraint>>,
    #[serde(default)]
    pub placement_order: Option<ContainmentOrder>,
    #[serde(default)]
    pub machine_type: Option<String>,
    #[serde(default)]
    pub cmek_key: Option<String>,
    /// Substrings the provisioning tool's diagnostics must contain. Marks the
    /// scenario as a negative test: success of apply/plan is a failure.
    #[serde(default)]
    pub apply_error: Option<Vec<String>>,
}

/// Resolved expectations for one scenario.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expectations {
    pub name: String,
    pub external_address: Exposure,
    pub flags: ExpectedFlags,
    pub placement: Vec<PlacementConstraint>,
    pub placement_order: ContainmentOrder,
    /// Expected machine type; matched against the short type name.
    pub machine_type: Option<String>,
    /// Expected KMS key; disk keys may carry a `/cryptoKeyVersions/N` suffix.
    pub cmek_key: Option<String>,
    pub apply_error: Option<Vec<String>>,
}

impl Expectations {
    /// Derive expectations from the variables, then apply overrides.
    #[must_use]
    pub fn derive(vars: &InstanceVariables, overrides: &ExpectOverrides) -> Self {
        let placement = vars
            .sole_tenancy_node_groups
            .as_ref()
            .filter(|groups| !groups.is_empty())
            .map(|groups| vec![PlacementConstraint::node_groups(groups.iter().cloned())])
            .unwrap_or_default();

        Self {
            name: overrides
                .name
                .clone()
                .unwrap_or_else(|| vars.instance_name.clone()),
            external_address: overrides
                .external_address
                .unwrap_or_else(|| Exposure::from_iap(vars.enable_iap)),
            flags: ExpectedFlags {
                secure_boot: overrides.secure_boot.or(vars.enable_shielded_secure_boot),
                vtpm: overrides.vtpm.or(vars.enable_shielded_vtpm),
                integrity_monitoring: overrides
                    .integrity_monitoring
                    .or(vars.enable_shielded_integrity_monitoring),
                confidential_compute: overrides
                    .confidential_compute
                    .or(vars.enable_confidential_vm),
            },
            placement: overrides.placement.clone().unwrap_or(placement),
            placement_order: overrides.placement_order.unwrap_or_default(),
            machine_type: overrides
                .machine_type
                .clone()
                .or_else(|| vars.machine_type.clone()),
            cmek_key: overrides
                .cmek_key
                .clone()
                .or_else(|| vars.cmek_key_name.clone()),
            apply_error: overrides.apply_error.clone(),
        }
    }

    /// `true` for negative scenarios that expect the tool to reject the config.
    #[must_use]
    pub fn expects_failure(&self) -> bool {
        self.apply_error.is_some()
    }
}
