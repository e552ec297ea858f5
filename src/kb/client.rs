use crate::config::KbConfig;
use crate::gateway::{unexpected, Gateway, Request, Response};
use crate::model::{
    ComponentParameters, ComponentProcess, ConfigRef, PlanResult, ReconfigurationPlan,
};
use chrono::{DateTime, Utc};
use tracing::{debug, error};

/// Outcome of resolving a parameter profile
#[derive(Debug, Clone, PartialEq)]
pub enum ParameterLookup {
    Resolved(ComponentParameters),
    /// The knowledge base has no profile under this name
    Unresolved,
    /// The knowledge base could not be queried
    Failed,
}

/// Typed access to the knowledge base endpoints
#[derive(Clone)]
pub struct KnowledgeBase {
    gateway: Gateway,
    endpoints: KbConfig,
}

impl KnowledgeBase {
    pub fn new(gateway: Gateway, endpoints: KbConfig) -> Self {
        Self { gateway, endpoints }
    }

    /// Latest pending plan, `None` when there is none or the query failed
    pub async fn fetch_latest_plan(&self) -> Option<ReconfigurationPlan> {
        let endpoint = &self.endpoints.get_latest_plan;
        match self.gateway.call(endpoint, Request::GetLatestPlan).await? {
            Response::Plan(plan) => plan,
            other => {
                error!("{}", unexpected(endpoint, "plan", &other));
                None
            }
        }
    }

    pub async fn set_plan_result(&self, start_time: DateTime<Utc>, result: PlanResult) -> bool {
        let endpoint = &self.endpoints.set_plan_result;
        let request = Request::SetPlanResult { start_time, result };
        let success = self.ack(endpoint, request).await;
        if !success {
            error!(
                "Error setting result {} for plan {} in the KB",
                result, start_time
            );
        }
        success
    }

    /// Ask the knowledge base to mark pending plans older than `before` outdated
    pub async fn supersede_pending_plans(&self, before: DateTime<Utc>) -> bool {
        let endpoint = &self.endpoints.supersede_plans;
        self.ack(endpoint, Request::SupersedePendingPlans { before })
            .await
    }

    pub async fn set_component_active(&self, component: &str, is_active: bool) -> bool {
        let endpoint = &self.endpoints.set_component_active;
        let request = Request::SetComponentActive {
            component: component.to_string(),
            is_active,
        };
        let success = self.ack(endpoint, request).await;
        if !success {
            error!(
                "Error setting component {} to active {} in the KB",
                component, is_active
            );
        }
        success
    }

    pub async fn component_parameters(&self, config: &ConfigRef) -> ParameterLookup {
        let endpoint = &self.endpoints.get_component_parameters;
        let request = Request::GetComponentParameters {
            config: config.clone(),
        };
        match self.gateway.call(endpoint, request).await {
            Some(Response::ComponentParameters(Some(parameters))) => {
                ParameterLookup::Resolved(parameters)
            }
            Some(Response::ComponentParameters(None)) => {
                debug!("Configuration {} has no parameters in the KB", config);
                ParameterLookup::Unresolved
            }
            Some(other) => {
                error!("{}", unexpected(endpoint, "component_parameters", &other));
                ParameterLookup::Failed
            }
            None => ParameterLookup::Failed,
        }
    }

    pub async fn insert_component_process(
        &self,
        component: &str,
        pid: u32,
        process_group_id: u32,
    ) -> bool {
        let endpoint = &self.endpoints.insert_component_process;
        let request = Request::InsertComponentProcess {
            component: component.to_string(),
            pid,
            process_group_id,
        };
        self.ack(endpoint, request).await
    }

    pub async fn end_component_process(&self, process: &ComponentProcess) -> bool {
        let endpoint = &self.endpoints.end_component_process;
        let request = Request::EndComponentProcess {
            component: process.component_name.clone(),
            start_time: process.start_time,
        };
        self.ack(endpoint, request).await
    }

    /// Process records without an end time, `None` if the query failed
    pub async fn active_component_processes(&self) -> Option<Vec<ComponentProcess>> {
        let endpoint = &self.endpoints.get_active_component_processes;
        match self
            .gateway
            .call(endpoint, Request::GetActiveComponentProcesses)
            .await?
        {
            Response::ComponentProcesses(processes) => Some(processes),
            other => {
                error!("{}", unexpected(endpoint, "component_processes", &other));
                None
            }
        }
    }

    async fn ack(&self, endpoint: &str, request: Request) -> bool {
        match self.gateway.call(endpoint, request).await {
            Some(Response::Ack { success }) => success,
            Some(other) => {
                error!("{}", unexpected(endpoint, "ack", &other));
                false
            }
            None => false,
        }
    }
}
