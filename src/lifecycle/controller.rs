use crate::gateway::{unexpected, Gateway, Request, Response};
use crate::model::{LifecycleState, Transition};
use std::fmt;
use tracing::{debug, error, warn};

/// State a managed component can be driven to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetState {
    Active,
    Inactive,
}

impl fmt::Display for TargetState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetState::Active => f.write_str("active"),
            TargetState::Inactive => f.write_str("inactive"),
        }
    }
}

/// Drives managed components through their lifecycle state machine
#[derive(Clone)]
pub struct LifecycleController {
    gateway: Gateway,
}

impl LifecycleController {
    pub fn new(gateway: Gateway) -> Self {
        Self { gateway }
    }

    pub async fn get_state(&self, component: &str) -> Option<LifecycleState> {
        let endpoint = format!("{}/get_state", component);
        match self.gateway.call(&endpoint, Request::GetState).await? {
            Response::State(state) => Some(state),
            other => {
                error!("{}", unexpected(&endpoint, "state", &other));
                None
            }
        }
    }

    /// Request `transition`; `Some(false)` when the component refused it
    pub async fn change_state(&self, component: &str, transition: Transition) -> Option<bool> {
        let endpoint = format!("{}/change_state", component);
        match self
            .gateway
            .call(&endpoint, Request::ChangeState { transition })
            .await?
        {
            Response::Ack { success } => Some(success),
            other => {
                error!("{}", unexpected(&endpoint, "ack", &other));
                None
            }
        }
    }

    /// Walk `component` to `target`, re-reading its state after every step.
    ///
    /// Success is decided by the last observed state. A failed remote call
    /// stops the walk for this component.
    pub async fn drive_to(&self, component: &str, target: TargetState) -> bool {
        let reached = match target {
            TargetState::Active => self.drive_to_active(component).await,
            TargetState::Inactive => self.drive_to_inactive(component).await,
        };

        match reached {
            Some(true) => {
                debug!("Component {} is {}", component, target);
                true
            }
            Some(false) => {
                error!("Component {} did not reach state {}", component, target);
                false
            }
            None => {
                error!(
                    "Transition of component {} to {} aborted: remote call failed",
                    component, target
                );
                false
            }
        }
    }

    async fn drive_to_active(&self, component: &str) -> Option<bool> {
        let mut state = self.get_state(component).await?;
        if state == LifecycleState::Unknown {
            // A node that has just started may not report its state yet
            state = self.get_state(component).await?;
        }
        if state == LifecycleState::Unconfigured {
            self.step(component, Transition::Configure, state).await?;
            state = self.get_state(component).await?;
        }
        if state == LifecycleState::Inactive {
            self.step(component, Transition::Activate, state).await?;
            state = self.get_state(component).await?;
        }
        Some(state == LifecycleState::Active)
    }

    async fn drive_to_inactive(&self, component: &str) -> Option<bool> {
        let mut state = self.get_state(component).await?;
        if state == LifecycleState::Active {
            self.step(component, Transition::Deactivate, state).await?;
            state = self.get_state(component).await?;
        }
        Some(state == LifecycleState::Inactive)
    }

    async fn step(
        &self,
        component: &str,
        transition: Transition,
        from: LifecycleState,
    ) -> Option<bool> {
        debug!(
            "Component {}: {} from {} (transition id {})",
            component,
            transition,
            from,
            transition.id(from)
        );
        let accepted = self.change_state(component, transition).await?;
        if !accepted {
            warn!("Component {} refused transition {}", component, transition);
        }
        Some(accepted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GatewayConfig;
    use crate::gateway::LocalTransport;
    use crate::lifecycle::MockLifecycleNode;
    use std::sync::Arc;
    use std::time::Duration;

    fn controller(transport: &LocalTransport) -> LifecycleController {
        LifecycleController::new(Gateway::new(
            Arc::new(transport.clone()),
            GatewayConfig {
                wait_timeout_ms: 100,
                call_timeout_ms: 200,
                poll_interval_ms: 10,
            },
        ))
    }

    #[tokio::test]
    async fn test_drive_unconfigured_to_active() {
        let transport = LocalTransport::new();
        let node = Arc::new(MockLifecycleNode::new("nav"));
        node.register(&transport);

        let controller = controller(&transport);
        assert!(controller.drive_to("nav", TargetState::Active).await);
        assert_eq!(node.state(), LifecycleState::Active);
        // get, configure, get, activate, get
        assert_eq!(node.calls(), 5);
    }

    #[tokio::test]
    async fn test_drive_active_is_noop_when_already_active() {
        let transport = LocalTransport::new();
        let node = Arc::new(MockLifecycleNode::new("nav").with_state(LifecycleState::Active));
        node.register(&transport);

        assert!(controller(&transport).drive_to("nav", TargetState::Active).await);
        assert_eq!(node.calls(), 1);
    }

    #[tokio::test]
    async fn test_drive_to_inactive() {
        let transport = LocalTransport::new();
        let node = Arc::new(MockLifecycleNode::new("nav").with_state(LifecycleState::Active));
        node.register(&transport);

        let controller = controller(&transport);
        assert!(controller.drive_to("nav", TargetState::Inactive).await);
        assert_eq!(node.state(), LifecycleState::Inactive);

        // Unconfigured is not Inactive and nothing moves it there
        let fresh = Arc::new(MockLifecycleNode::new("map"));
        fresh.register(&transport);
        assert!(!controller.drive_to("map", TargetState::Inactive).await);
    }

    #[tokio::test]
    async fn test_finalized_component_cannot_be_activated() {
        let transport = LocalTransport::new();
        let node =
            Arc::new(MockLifecycleNode::new("nav").with_state(LifecycleState::Finalized));
        node.register(&transport);

        assert!(!controller(&transport).drive_to("nav", TargetState::Active).await);
    }

    #[tokio::test]
    async fn test_unreachable_component_aborts() {
        let transport = LocalTransport::new();
        assert!(!controller(&transport).drive_to("ghost", TargetState::Active).await);
    }

    #[tokio::test]
    async fn test_slow_component_times_out() {
        let transport = LocalTransport::new();
        let node = Arc::new(MockLifecycleNode::new("nav").with_delay(Duration::from_secs(5)));
        node.register(&transport);

        let controller = controller(&transport);
        assert_eq!(controller.get_state("nav").await, None);
        assert!(!controller.drive_to("nav", TargetState::Active).await);
        assert_eq!(node.state(), LifecycleState::Unconfigured);
    }
}
