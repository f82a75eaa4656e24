pub mod report;
pub mod snapshot;
pub mod variables;

pub use report::{FailureKind, Mismatch, Outcome, ScenarioPhase, ScenarioReport, SuiteReport};
pub use snapshot::{NODE_GROUP_AFFINITY_KEY, PlacementConstraint, ResourceSnapshot, SecurityFlags};
pub use variables::InstanceVariables;
