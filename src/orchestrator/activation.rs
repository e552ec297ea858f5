use crate::events::{EventBus, ReconfEvent};
use crate::kb::KnowledgeBase;
use crate::lifecycle::{LifecycleController, TargetState};
use crate::model::Component;
use crate::process::{LaunchDescriptor, Launcher, ProcessRegistry};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Starts and stops components, one at a time, continuing past failures
pub struct ActivationOrchestrator {
    launcher: Launcher,
    registry: Arc<ProcessRegistry>,
    lifecycle: LifecycleController,
    kb: KnowledgeBase,
    events: EventBus,
    persist_activity: bool,
}

impl ActivationOrchestrator {
    pub fn new(
        launcher: Launcher,
        registry: Arc<ProcessRegistry>,
        lifecycle: LifecycleController,
        kb: KnowledgeBase,
        events: EventBus,
        persist_activity: bool,
    ) -> Self {
        Self {
            launcher,
            registry,
            lifecycle,
            kb,
            events,
            persist_activity,
        }
    }

    /// Bring every component up. True only if all of them succeeded.
    pub async fn activate(&self, components: &[Component]) -> bool {
        let mut live = match self.registry.live_component_names().await {
            Some(live) => live,
            None => {
                warn!("Could not read running components, assuming none");
                HashSet::new()
            }
        };

        let mut success = true;
        for component in components {
            let activated = self.activate_one(component, &mut live).await;
            if !activated {
                error!("Activation of component {} failed", component.name);
            }
            success &= activated;
        }
        success
    }

    /// Bring every component down. True only if all of them succeeded.
    pub async fn deactivate(&self, components: &[Component]) -> bool {
        let live = self.registry.live_component_names().await;
        if live.is_none() {
            warn!("Could not read running components, driving every managed component");
        }

        let mut success = true;
        for component in components {
            let deactivated = self.deactivate_one(component, live.as_ref()).await;
            if !deactivated {
                error!("Deactivation of component {} failed", component.name);
            }
            success &= deactivated;
        }
        success
    }

    async fn activate_one(&self, component: &Component, live: &mut HashSet<String>) -> bool {
        if live.contains(&component.name) {
            debug!("Component {} already running", component.name);
        } else {
            let descriptor = LaunchDescriptor::from_component(component);
            let Some(launched) = self.launcher.launch(&descriptor).await else {
                return false;
            };
            if !self.registry.track(&component.name, launched).await {
                return false;
            }
            live.insert(component.name.clone());
        }

        if component.is_managed()
            && !self
                .lifecycle
                .drive_to(&component.name, TargetState::Active)
                .await
        {
            return false;
        }

        if self.persist_activity && !self.kb.set_component_active(&component.name, true).await {
            return false;
        }

        info!("Component {} activated", component.name);
        self.publish(ReconfEvent::ComponentActivated {
            name: component.name.clone(),
        })
        .await;
        true
    }

    async fn deactivate_one(&self, component: &Component, live: Option<&HashSet<String>>) -> bool {
        let stopped = if component.is_managed() {
            if live.is_some_and(|live| !live.contains(&component.name)) {
                debug!("Component {} not running, nothing to drive", component.name);
                true
            } else {
                self.lifecycle
                    .drive_to(&component.name, TargetState::Inactive)
                    .await
            }
        } else {
            self.registry.kill(&component.name).await
        };
        if !stopped {
            return false;
        }

        if self.persist_activity && !self.kb.set_component_active(&component.name, false).await {
            return false;
        }

        info!("Component {} deactivated", component.name);
        self.publish(ReconfEvent::ComponentDeactivated {
            name: component.name.clone(),
        })
        .await;
        true
    }

    async fn publish(&self, event: ReconfEvent) {
        if let Err(e) = self.events.publish(event).await {
            debug!("Event not delivered: {}", e);
        }
    }
}
