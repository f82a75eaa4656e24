use serde::{Deserialize, Serialize};

/// Node-affinity key the compute API uses for sole-tenant node groups.
pub const NODE_GROUP_AFFINITY_KEY: &str = "compute.googleapis.com/node-group-name";

/// Shielded VM and confidential computing flags of an instance.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SecurityFlags {
    pub secure_boot: bool,
    pub vtpm: bool,
    pub integrity_monitoring: bool,
    pub confidential_compute: bool,
}

/// One node-affinity placement rule, e.g. `{key, "IN", [group]}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlacementConstraint {
    pub key: String,
    pub operator: String,
    #[serde(default)]
    pub values: Vec<String>,
}

impl PlacementConstraint {
    /// Constraint binding an instance to the given sole-tenant node groups.
    #[must_use]
    pub fn node_groups<I, S>(groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            key: NODE_GROUP_AFFINITY_KEY.to_string(),
            operator: "IN".to_string(),
            values: groups.into_iter().map(Into::into).collect(),
        }
    }
}

impl std::fmt::Display for PlacementConstraint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} [{}]", self.key, self.operator, self.values.join(", "))
    }
}

/// Point-in-time read of a live instance as reported by the control plane.
///
/// Snapshots are never mutated; fetch a new one if staleness is suspected.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResourceSnapshot {
    pub name: String,
    /// Short machine type name, e.g. `n2d-standard-2`.
    #[serde(default)]
    pub machine_type: String,
    /// Primary internal IPv4 address; empty when the instance has no NIC.
    #[serde(default)]
    pub internal_address: String,
    /// First NAT address across all access configs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_address: Option<String>,
    #[serde(default)]
    pub security_flags: SecurityFlags,
    #[serde(default)]
    pub placement_constraints: Vec<PlacementConstraint>,
    /// KMS key names protecting attached disks (key versions included).
    #[serde(default)]
    pub disk_kms_keys: Vec<String>,
    /// Lifecycle status, e.g. `RUNNING`.
    #[serde(default)]
    pub status: String,
}

impl ResourceSnapshot {
    /// `true` when the instance exposes a non-empty external address.
    #[must_use]
    pub fn has_external_address(&self) -> bool {
        self.external_address
            .as_deref()
            .is_some_and(|a| !a.trim().is_empty())
    }
}
