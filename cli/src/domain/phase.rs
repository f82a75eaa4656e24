//! Scenario lifecycle state machine.
//!
//! `Init → Applying → Applied → Inspecting → Asserting → Destroying → Done`,
//! with `Failed` reachable from every non-terminal phase. Once apply has
//! succeeded, `Destroying` follows `Failed` so teardown always runs.
//!
//! Negative scenarios assert on the tool's diagnostics straight after a
//! rejected `Applying` or `Planning`; with nothing created, `Asserting` may
//! end in `Done` without teardown.

use provcheck_common::ScenarioPhase;

/// Whether `from → to` is a legal transition.
#[must_use]
pub fn can_transition(from: ScenarioPhase, to: ScenarioPhase) -> bool {
    use ScenarioPhase::{
        Applied, Applying, Asserting, Destroying, Done, Failed, Init, Inspecting, Planning,
    };
    matches!(
        (from, to),
        (Init, Applying | Planning | Failed)
            | (Planning, Asserting | Done | Failed)
            | (Applying, Applied | Asserting | Failed)
            | (Applied, Inspecting | Asserting | Destroying | Failed)
            | (Inspecting, Asserting | Destroying | Failed)
            | (Asserting, Destroying | Done | Failed)
            | (Failed, Destroying)
            | (Destroying, Done | Failed)
    )
}

/// Returned when a caller attempts an illegal transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("illegal scenario transition {from} -> {to}")]
pub struct IllegalTransition {
    pub from: ScenarioPhase,
    pub to: ScenarioPhase,
}

/// Records the phases one scenario passes through.
#[derive(Debug, Clone)]
pub struct PhaseTracker {
    history: Vec<ScenarioPhase>,
}

impl Default for PhaseTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl PhaseTracker {
    #[must_use]
    pub fn new() -> Self {
        Self {
            history: vec![ScenarioPhase::Init],
        }
    }

    #[must_use]
    pub fn current(&self) -> ScenarioPhase {
        self.history
            .last()
            .copied()
            .unwrap_or(ScenarioPhase::Init)
    }

    /// Move to `to`, recording it.
    ///
    /// # Errors
    ///
    /// Returns `IllegalTransition` and leaves the tracker unchanged if the
    /// move is not allowed from the current phase.
    pub fn advance(&mut self, to: ScenarioPhase) -> Result<(), IllegalTransition> {
        let from = self.current();
        if !can_transition(from, to) {
            return Err(IllegalTransition { from, to });
        }
        self.history.push(to);
        Ok(())
    }

    /// Whether the scenario entered `phase` at any point.
    #[must_use]
    pub fn visited(&self, phase: ScenarioPhase) -> bool {
        self.history.contains(&phase)
    }

    #[must_use]
    pub fn into_history(self) -> Vec<ScenarioPhase> {
        self.history
    }
}
