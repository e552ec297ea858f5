use super::seed::KbSeed;
use crate::config::KbConfig;
use crate::events::{EventBus, ReconfEvent};
use crate::gateway::{Endpoint, LocalTransport, Request, Response};
use crate::model::{
    Component, ComponentParameters, ComponentProcess, ConfigRef, PlanResult, ReconfigurationPlan,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Default)]
struct KbState {
    components: HashMap<String, Component>,
    configurations: HashMap<String, ComponentParameters>,
    plans: BTreeMap<DateTime<Utc>, ReconfigurationPlan>,
    processes: Vec<ComponentProcess>,
}

/// Knowledge base held in memory, served through a [`LocalTransport`]
pub struct MemoryKnowledgeBase {
    state: Mutex<KbState>,
    events: Option<EventBus>,
}

impl MemoryKnowledgeBase {
    pub fn new(events: Option<EventBus>) -> Self {
        Self {
            state: Mutex::new(KbState::default()),
            events,
        }
    }

    /// Build a knowledge base from seed data; seeded plans do not raise events
    pub fn from_seed(seed: KbSeed, events: Option<EventBus>) -> Self {
        let kb = Self::new(events);
        {
            let mut state = kb.state.lock();
            for component in seed.components {
                state.components.insert(component.name.clone(), component);
            }
            for configuration in seed.configurations {
                state.configurations.insert(
                    configuration.name,
                    ComponentParameters {
                        component: configuration.component,
                        parameters: configuration.parameters,
                    },
                );
            }
            for plan in seed.plans {
                state.plans.insert(plan.start_time, plan);
            }
        }
        kb
    }

    /// Serve every knowledge base endpoint on `transport`
    pub fn register(self: &Arc<Self>, transport: &LocalTransport, endpoints: &KbConfig) {
        for (_, name) in endpoints.endpoints() {
            transport.register(name, Arc::clone(self) as Arc<dyn Endpoint>);
        }
    }

    pub fn add_component(&self, component: Component) {
        self.state
            .lock()
            .components
            .insert(component.name.clone(), component);
    }

    pub fn add_configuration<S: Into<String>>(&self, name: S, parameters: ComponentParameters) {
        self.state
            .lock()
            .configurations
            .insert(name.into(), parameters);
    }

    /// Store a plan and announce it on the event bus
    pub async fn insert_plan(&self, plan: ReconfigurationPlan) {
        let start_time = plan.start_time;
        self.state.lock().plans.insert(start_time, plan);
        info!("Reconfiguration plan {} inserted", start_time);

        if let Some(events) = &self.events {
            if let Err(e) = events.publish(ReconfEvent::PlanInserted { start_time }).await {
                debug!("No listener for inserted plan: {}", e);
            }
        }
    }

    pub fn component(&self, name: &str) -> Option<Component> {
        self.state.lock().components.get(name).cloned()
    }

    pub fn plan(&self, start_time: DateTime<Utc>) -> Option<ReconfigurationPlan> {
        self.state.lock().plans.get(&start_time).cloned()
    }

    /// Every process record, ended ones included
    pub fn processes(&self) -> Vec<ComponentProcess> {
        self.state.lock().processes.clone()
    }

    pub fn active_processes(&self) -> Vec<ComponentProcess> {
        self.state
            .lock()
            .processes
            .iter()
            .filter(|p| p.is_active())
            .cloned()
            .collect()
    }

    fn latest_pending_plan(state: &KbState) -> Option<ReconfigurationPlan> {
        state
            .plans
            .values()
            .rev()
            .find(|plan| plan.is_pending())
            .cloned()
    }

    fn set_plan_result(state: &mut KbState, start_time: DateTime<Utc>, result: PlanResult) -> bool {
        match state.plans.get_mut(&start_time) {
            Some(plan) if plan.is_pending() && result != PlanResult::Pending => {
                plan.result = result;
                true
            }
            Some(plan) => {
                warn!(
                    "Plan {} already has result {}, refusing {}",
                    start_time, plan.result, result
                );
                false
            }
            None => {
                warn!("Unknown plan {}", start_time);
                false
            }
        }
    }

    fn supersede_pending_plans(state: &mut KbState, before: DateTime<Utc>) -> usize {
        let mut count = 0;
        for plan in state
            .plans
            .range_mut(..before)
            .map(|(_, plan)| plan)
            .filter(|plan| plan.is_pending())
        {
            plan.result = PlanResult::Outdated;
            count += 1;
        }
        count
    }

    fn set_component_active(state: &mut KbState, name: &str, is_active: bool) -> bool {
        match state.components.get_mut(name) {
            Some(component) => {
                component.is_active = is_active;
                true
            }
            None => {
                warn!("Unknown component {}", name);
                false
            }
        }
    }

    fn insert_process(state: &mut KbState, component: String, pid: u32, pgid: u32) -> bool {
        if state
            .processes
            .iter()
            .any(|p| p.is_active() && p.component_name == component)
        {
            warn!("Component {} already has an active process", component);
            return false;
        }
        state.processes.push(ComponentProcess {
            component_name: component,
            pid,
            process_group_id: pgid,
            start_time: Utc::now(),
            end_time: None,
        });
        true
    }

    fn end_process(state: &mut KbState, component: &str, start_time: DateTime<Utc>) -> bool {
        match state
            .processes
            .iter_mut()
            .find(|p| p.is_active() && p.component_name == component && p.start_time == start_time)
        {
            Some(process) => {
                process.end_time = Some(Utc::now());
                true
            }
            None => false,
        }
    }

    fn component_parameters(state: &KbState, config: &ConfigRef) -> Option<ComponentParameters> {
        state.configurations.get(&config.name).cloned()
    }
}

#[async_trait]
impl Endpoint for MemoryKnowledgeBase {
    async fn handle(&self, request: Request) -> Response {
        let kind = request.kind();
        let mut state = self.state.lock();
        let response = match request {
            Request::GetLatestPlan => Response::Plan(Self::latest_pending_plan(&state)),
            Request::SetPlanResult { start_time, result } => Response::Ack {
                success: Self::set_plan_result(&mut state, start_time, result),
            },
            Request::SupersedePendingPlans { before } => {
                let count = Self::supersede_pending_plans(&mut state, before);
                debug!("Marked {} pending plans older than {} outdated", count, before);
                Response::Ack { success: true }
            }
            Request::SetComponentActive {
                component,
                is_active,
            } => Response::Ack {
                success: Self::set_component_active(&mut state, &component, is_active),
            },
            Request::GetComponentParameters { config } => {
                Response::ComponentParameters(Self::component_parameters(&state, &config))
            }
            Request::InsertComponentProcess {
                component,
                pid,
                process_group_id,
            } => Response::Ack {
                success: Self::insert_process(&mut state, component, pid, process_group_id),
            },
            Request::EndComponentProcess {
                component,
                start_time,
            } => Response::Ack {
                success: Self::end_process(&mut state, &component, start_time),
            },
            Request::GetActiveComponentProcesses => Response::ComponentProcesses(
                state
                    .processes
                    .iter()
                    .filter(|p| p.is_active())
                    .cloned()
                    .collect(),
            ),
            Request::GetState
            | Request::ChangeState { .. }
            | Request::SetParametersAtomically { .. } => Response::Unsupported {
                request: kind.to_string(),
            },
        };
        debug!("KB answered {} with {}", kind, response.kind());
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Parameter, ParameterValue};
    use chrono::Duration;

    fn kb_with_plans() -> (MemoryKnowledgeBase, DateTime<Utc>, DateTime<Utc>) {
        let kb = MemoryKnowledgeBase::new(None);
        let older = Utc::now() - Duration::seconds(10);
        let newer = Utc::now();
        {
            let mut state = kb.state.lock();
            state.plans.insert(older, ReconfigurationPlan::new(older));
            state.plans.insert(newer, ReconfigurationPlan::new(newer));
        }
        (kb, older, newer)
    }

    #[tokio::test]
    async fn test_latest_pending_plan() {
        let (kb, older, newer) = kb_with_plans();

        let response = kb.handle(Request::GetLatestPlan).await;
        match response {
            Response::Plan(Some(plan)) => assert_eq!(plan.start_time, newer),
            other => panic!("unexpected response {:?}", other),
        }

        kb.handle(Request::SetPlanResult {
            start_time: newer,
            result: PlanResult::Failed,
        })
        .await;
        match kb.handle(Request::GetLatestPlan).await {
            Response::Plan(Some(plan)) => assert_eq!(plan.start_time, older),
            other => panic!("unexpected response {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_plan_result_is_set_once() {
        let (kb, _, newer) = kb_with_plans();
        let set = |result| Request::SetPlanResult {
            start_time: newer,
            result,
        };

        assert_eq!(
            kb.handle(set(PlanResult::Completed)).await,
            Response::Ack { success: true }
        );
        assert_eq!(
            kb.handle(set(PlanResult::Failed)).await,
            Response::Ack { success: false }
        );
        assert_eq!(kb.plan(newer).unwrap().result, PlanResult::Completed);
    }

    #[tokio::test]
    async fn test_supersede_marks_pending_plans_outdated() {
        let (kb, older, newer) = kb_with_plans();
        kb.handle(Request::SetPlanResult {
            start_time: newer,
            result: PlanResult::Completed,
        })
        .await;
        kb.handle(Request::SupersedePendingPlans { before: newer })
            .await;

        assert_eq!(kb.plan(older).unwrap().result, PlanResult::Outdated);
        assert_eq!(kb.plan(newer).unwrap().result, PlanResult::Completed);
        assert_eq!(
            kb.handle(Request::GetLatestPlan).await,
            Response::Plan(None)
        );
    }

    #[tokio::test]
    async fn test_supersede_keeps_newer_pending_plans() {
        let (kb, older, newer) = kb_with_plans();
        kb.handle(Request::SetPlanResult {
            start_time: older,
            result: PlanResult::Completed,
        })
        .await;
        kb.handle(Request::SupersedePendingPlans { before: older })
            .await;

        assert_eq!(kb.plan(newer).unwrap().result, PlanResult::Pending);
        match kb.handle(Request::GetLatestPlan).await {
            Response::Plan(Some(plan)) => assert_eq!(plan.start_time, newer),
            other => panic!("unexpected response {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_component_active_flag() {
        let kb = MemoryKnowledgeBase::new(None);
        kb.add_component(Component::process("c1", "pkgA", "exeA"));

        let set = |component: &str| Request::SetComponentActive {
            component: component.to_string(),
            is_active: true,
        };
        assert_eq!(kb.handle(set("c1")).await, Response::Ack { success: true });
        assert!(kb.component("c1").unwrap().is_active);
        assert_eq!(
            kb.handle(set("unknown")).await,
            Response::Ack { success: false }
        );
    }

    #[tokio::test]
    async fn test_one_active_process_per_component() {
        let kb = MemoryKnowledgeBase::new(None);
        let insert = |pid| Request::InsertComponentProcess {
            component: "c1".to_string(),
            pid,
            process_group_id: pid,
        };

        assert_eq!(kb.handle(insert(100)).await, Response::Ack { success: true });
        assert_eq!(kb.handle(insert(101)).await, Response::Ack { success: false });

        let record = kb.active_processes().remove(0);
        assert_eq!(
            kb.handle(Request::EndComponentProcess {
                component: "c1".to_string(),
                start_time: record.start_time,
            })
            .await,
            Response::Ack { success: true }
        );
        assert!(kb.active_processes().is_empty());
        assert_eq!(kb.processes().len(), 1);
        assert_eq!(kb.handle(insert(102)).await, Response::Ack { success: true });
    }

    #[tokio::test]
    async fn test_component_parameters_lookup() {
        let kb = MemoryKnowledgeBase::new(None);
        let parameters = ComponentParameters {
            component: "c1".to_string(),
            parameters: vec![Parameter::new("rate", ParameterValue::Integer(5))],
        };
        kb.add_configuration("fast", parameters.clone());

        assert_eq!(
            kb.handle(Request::GetComponentParameters {
                config: ConfigRef::new("fast")
            })
            .await,
            Response::ComponentParameters(Some(parameters))
        );
        assert_eq!(
            kb.handle(Request::GetComponentParameters {
                config: ConfigRef::new("slow")
            })
            .await,
            Response::ComponentParameters(None)
        );
    }

    #[tokio::test]
    async fn test_insert_plan_publishes_event() {
        let bus = EventBus::new(8);
        let mut receiver = bus.subscribe();
        let kb = MemoryKnowledgeBase::new(Some(bus));

        let start_time = Utc::now();
        kb.insert_plan(ReconfigurationPlan::new(start_time)).await;

        match receiver.recv().await.unwrap() {
            ReconfEvent::PlanInserted { start_time: t } => assert_eq!(t, start_time),
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_lifecycle_requests_unsupported() {
        let kb = MemoryKnowledgeBase::new(None);
        assert_eq!(kb.handle(Request::GetState).await.kind(), "unsupported");
    }
}
