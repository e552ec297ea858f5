use super::types::ExecutionPhase;
use super::ReconfigurationEngine;
use crate::error::{ReconfError, Result};
use crate::model::{LifecycleState, Transition};
use tracing::debug;

impl ReconfigurationEngine {
    /// Engine lifecycle state
    pub fn state(&self) -> LifecycleState {
        *self.state.lock()
    }

    pub fn is_operational(&self) -> bool {
        self.operational.is_set()
    }

    /// Phase of the plan coordinator; does not wait for a running plan
    pub fn phase(&self) -> ExecutionPhase {
        self.coordinator.phase()
    }

    /// Remote calls dispatched and not yet finished
    pub fn in_flight_calls(&self) -> usize {
        self.gateway.in_flight()
    }

    /// Target state of `transition`, or an error leaving the state untouched
    pub(super) fn check_transition(&self, transition: Transition) -> Result<LifecycleState> {
        let from = self.state();
        transition
            .apply(from)
            .ok_or(ReconfError::Lifecycle { from, transition })
    }

    pub(super) fn set_state(&self, state: LifecycleState) {
        let mut current = self.state.lock();
        debug!("Engine state changed: {} -> {}", *current, state);
        *current = state;
    }
}
