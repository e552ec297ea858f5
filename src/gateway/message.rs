use crate::model::{
    ComponentParameters, ComponentProcess, ConfigRef, LifecycleState, Parameter, PlanResult,
    ReconfigurationPlan, Transition,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Request envelope carried to an endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Request {
    GetLatestPlan,
    SetPlanResult {
        start_time: DateTime<Utc>,
        result: PlanResult,
    },
    /// Mark pending plans older than `before` outdated
    SupersedePendingPlans {
        before: DateTime<Utc>,
    },
    SetComponentActive {
        component: String,
        is_active: bool,
    },
    GetComponentParameters {
        config: ConfigRef,
    },
    InsertComponentProcess {
        component: String,
        pid: u32,
        process_group_id: u32,
    },
    EndComponentProcess {
        component: String,
        start_time: DateTime<Utc>,
    },
    GetActiveComponentProcesses,
    GetState,
    ChangeState {
        transition: Transition,
    },
    SetParametersAtomically {
        parameters: Vec<Parameter>,
    },
}

impl Request {
    pub fn kind(&self) -> &'static str {
        match self {
            Request::GetLatestPlan => "get_latest_plan",
            Request::SetPlanResult { .. } => "set_plan_result",
            Request::SupersedePendingPlans { .. } => "supersede_pending_plans",
            Request::SetComponentActive { .. } => "set_component_active",
            Request::GetComponentParameters { .. } => "get_component_parameters",
            Request::InsertComponentProcess { .. } => "insert_component_process",
            Request::EndComponentProcess { .. } => "end_component_process",
            Request::GetActiveComponentProcesses => "get_active_component_processes",
            Request::GetState => "get_state",
            Request::ChangeState { .. } => "change_state",
            Request::SetParametersAtomically { .. } => "set_parameters_atomically",
        }
    }
}

/// Response envelope returned by an endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Response {
    Plan(Option<ReconfigurationPlan>),
    Ack {
        success: bool,
    },
    ComponentParameters(Option<ComponentParameters>),
    ComponentProcesses(Vec<ComponentProcess>),
    State(LifecycleState),
    ParametersSet {
        successful: bool,
        reason: String,
    },
    /// The endpoint does not serve this request kind
    Unsupported {
        request: String,
    },
}

impl Response {
    pub fn kind(&self) -> &'static str {
        match self {
            Response::Plan(_) => "plan",
            Response::Ack { .. } => "ack",
            Response::ComponentParameters(_) => "component_parameters",
            Response::ComponentProcesses(_) => "component_processes",
            Response::State(_) => "state",
            Response::ParametersSet { .. } => "parameters_set",
            Response::Unsupported { .. } => "unsupported",
        }
    }
}
