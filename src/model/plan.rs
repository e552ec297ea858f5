use super::component::Component;
use super::parameter::Parameter;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Terminal or pending outcome of a reconfiguration plan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanResult {
    Pending,
    Completed,
    Failed,
    /// Superseded by a later plan that completed
    Outdated,
}

impl PlanResult {
    pub fn from_success(success: bool) -> Self {
        if success {
            PlanResult::Completed
        } else {
            PlanResult::Failed
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PlanResult::Pending => "pending",
            PlanResult::Completed => "completed",
            PlanResult::Failed => "failed",
            PlanResult::Outdated => "outdated",
        }
    }
}

impl fmt::Display for PlanResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Named parameter profile, resolved by the knowledge base
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConfigRef {
    pub name: String,
}

impl ConfigRef {
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self { name: name.into() }
    }
}

impl fmt::Display for ConfigRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// A resolved parameter profile: the target component and the values to push
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentParameters {
    pub component: String,
    pub parameters: Vec<Parameter>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconfigurationPlan {
    /// Identity key of the plan
    pub start_time: DateTime<Utc>,
    #[serde(default)]
    pub components_to_deactivate: Vec<Component>,
    #[serde(default)]
    pub components_to_activate: Vec<Component>,
    #[serde(default)]
    pub component_configurations: Vec<ConfigRef>,
    #[serde(default = "default_plan_result")]
    pub result: PlanResult,
}

fn default_plan_result() -> PlanResult {
    PlanResult::Pending
}

impl ReconfigurationPlan {
    pub fn new(start_time: DateTime<Utc>) -> Self {
        Self {
            start_time,
            components_to_deactivate: Vec::new(),
            components_to_activate: Vec::new(),
            component_configurations: Vec::new(),
            result: PlanResult::Pending,
        }
    }

    pub fn deactivate(mut self, component: Component) -> Self {
        self.components_to_deactivate.push(component);
        self
    }

    pub fn activate(mut self, component: Component) -> Self {
        self.components_to_activate.push(component);
        self
    }

    pub fn configure(mut self, config: ConfigRef) -> Self {
        self.component_configurations.push(config);
        self
    }

    pub fn is_pending(&self) -> bool {
        self.result == PlanResult::Pending
    }
}
