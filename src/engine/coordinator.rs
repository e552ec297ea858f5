use super::types::{ExecutionPhase, OperationalFlag};
use crate::events::{EventBus, ReconfEvent};
use crate::kb::KnowledgeBase;
use crate::model::PlanResult;
use crate::orchestrator::{ActivationOrchestrator, AdaptationOrchestrator};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, info, warn};

/// Runs reconfiguration plans one at a time
#[derive(Clone)]
pub struct PlanCoordinator {
    kb: KnowledgeBase,
    activation: Arc<ActivationOrchestrator>,
    adaptation: Arc<AdaptationOrchestrator>,
    events: EventBus,
    operational: OperationalFlag,
    phase: Arc<Mutex<ExecutionPhase>>,
    execution_lock: Arc<AsyncMutex<()>>,
}

/// Puts the coordinator back to `Idle` however execution ends
struct PhaseGuard(Arc<Mutex<ExecutionPhase>>);

impl PhaseGuard {
    fn enter(phase: &Arc<Mutex<ExecutionPhase>>) -> Self {
        *phase.lock() = ExecutionPhase::Executing;
        Self(Arc::clone(phase))
    }
}

impl Drop for PhaseGuard {
    fn drop(&mut self) {
        *self.0.lock() = ExecutionPhase::Idle;
    }
}

impl PlanCoordinator {
    pub(super) fn new(
        kb: KnowledgeBase,
        activation: Arc<ActivationOrchestrator>,
        adaptation: Arc<AdaptationOrchestrator>,
        events: EventBus,
        operational: OperationalFlag,
        execution_lock: Arc<AsyncMutex<()>>,
    ) -> Self {
        Self {
            kb,
            activation,
            adaptation,
            events,
            operational,
            phase: Arc::new(Mutex::new(ExecutionPhase::Idle)),
            execution_lock,
        }
    }

    /// Current phase; never waits for a running plan
    pub fn phase(&self) -> ExecutionPhase {
        *self.phase.lock()
    }

    /// Fetch and run the latest pending plan.
    ///
    /// Returns the recorded result, or `None` when nothing was executed
    /// (engine not operational, no pending plan, or the KB unreachable).
    pub async fn execute(&self) -> Option<PlanResult> {
        if !self.operational.is_set() {
            debug!("Engine not active, ignoring execution request");
            return None;
        }

        let _serialized = self.execution_lock.lock().await;
        // Deactivation may have happened while waiting for the lock
        if !self.operational.is_set() {
            debug!("Engine deactivated while waiting, ignoring execution request");
            return None;
        }

        let Some(plan) = self.kb.fetch_latest_plan().await else {
            debug!("No pending reconfiguration plan");
            return None;
        };

        let _phase = PhaseGuard::enter(&self.phase);
        info!(
            "Executing reconfiguration plan {}: {} to deactivate, {} to activate, {} configurations",
            plan.start_time,
            plan.components_to_deactivate.len(),
            plan.components_to_activate.len(),
            plan.component_configurations.len()
        );

        let deactivated = self
            .activation
            .deactivate(&plan.components_to_deactivate)
            .await;
        let activated = self.activation.activate(&plan.components_to_activate).await;
        let adapted = self.adaptation.adapt(&plan.component_configurations).await;

        let result = PlanResult::from_success(deactivated && activated && adapted);
        if !(deactivated && activated && adapted) {
            warn!(
                "Plan {} failed (deactivation: {}, activation: {}, adaptation: {})",
                plan.start_time, deactivated, activated, adapted
            );
        }

        let persisted = self.kb.set_plan_result(plan.start_time, result).await;
        if persisted
            && result == PlanResult::Completed
            && !self.kb.supersede_pending_plans(plan.start_time).await
        {
            warn!("Could not mark plans older than {} outdated", plan.start_time);
        }

        if let Err(e) = self
            .events
            .publish(ReconfEvent::PlanExecuted {
                start_time: plan.start_time,
                result,
            })
            .await
        {
            debug!("Event not delivered: {}", e);
        }

        Some(result)
    }
}
