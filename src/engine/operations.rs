use super::ReconfigurationEngine;
use crate::gateway::{Request, Response};
use crate::model::{Component, ConfigRef, LifecycleState, PlanResult, Transition};
use tracing::debug;

/// Public operations. Each one is a no-op unless the engine is `Active`.
impl ReconfigurationEngine {
    /// Run the latest pending plan, if any
    pub async fn execute(&self) -> Option<PlanResult> {
        self.coordinator.execute().await
    }

    pub async fn activate_components(&self, components: &[Component]) -> bool {
        if !self.gate("activate_components") {
            return false;
        }
        let _serialized = self.execution_lock.lock().await;
        self.activation.activate(components).await
    }

    pub async fn deactivate_components(&self, components: &[Component]) -> bool {
        if !self.gate("deactivate_components") {
            return false;
        }
        let _serialized = self.execution_lock.lock().await;
        self.activation.deactivate(components).await
    }

    pub async fn adapt_parameters(&self, configs: &[ConfigRef]) -> bool {
        if !self.gate("adapt_parameters") {
            return false;
        }
        let _serialized = self.execution_lock.lock().await;
        self.adaptation.adapt(configs).await
    }

    /// Terminate the tracked processes of `component`
    pub async fn kill_component(&self, component: &str) -> bool {
        if !self.gate("kill_component") {
            return false;
        }
        let _serialized = self.execution_lock.lock().await;
        self.registry.kill(component).await
    }

    /// Raw bounded-wait remote call
    pub async fn call(&self, endpoint: &str, request: Request) -> Option<Response> {
        if !self.gate("call") {
            return None;
        }
        self.gateway.call(endpoint, request).await
    }

    pub async fn component_state(&self, component: &str) -> Option<LifecycleState> {
        if !self.gate("component_state") {
            return None;
        }
        self.lifecycle.get_state(component).await
    }

    pub async fn change_component_state(
        &self,
        component: &str,
        transition: Transition,
    ) -> Option<bool> {
        if !self.gate("change_component_state") {
            return None;
        }
        self.lifecycle.change_state(component, transition).await
    }

    fn gate(&self, operation: &str) -> bool {
        let operational = self.operational.is_set();
        if !operational {
            debug!("Engine not active, ignoring {}", operation);
        }
        operational
    }
}
