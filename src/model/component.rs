use super::parameter::{Parameter, ParameterValue};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How a component runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentKind {
    /// Bare OS process, presence is its only observable state
    Process,
    /// Process exposing a remote lifecycle state machine
    ManagedProcess,
}

/// What the runtime is asked to start for a component
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LaunchTarget {
    Executable(String),
    LaunchFile(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Component {
    pub name: String,
    pub package: String,
    pub target: LaunchTarget,
    pub kind: ComponentKind,
    #[serde(default)]
    pub parameters: Vec<Parameter>,
    #[serde(default)]
    pub is_active: bool,
}

impl Component {
    pub fn new<S: Into<String>>(name: S, package: S, target: LaunchTarget, kind: ComponentKind) -> Self {
        Self {
            name: name.into(),
            package: package.into(),
            target,
            kind,
            parameters: Vec::new(),
            is_active: false,
        }
    }

    /// Bare process started from an executable
    pub fn process<S: Into<String>>(name: S, package: S, executable: S) -> Self {
        Self::new(
            name,
            package,
            LaunchTarget::Executable(executable.into()),
            ComponentKind::Process,
        )
    }

    /// Lifecycle-managed process started from an executable
    pub fn managed<S: Into<String>>(name: S, package: S, executable: S) -> Self {
        Self::new(
            name,
            package,
            LaunchTarget::Executable(executable.into()),
            ComponentKind::ManagedProcess,
        )
    }

    pub fn with_parameter<S: Into<String>>(mut self, name: S, value: ParameterValue) -> Self {
        self.parameters.push(Parameter::new(name, value));
        self
    }

    pub fn is_managed(&self) -> bool {
        self.kind == ComponentKind::ManagedProcess
    }
}

/// OS process started on behalf of a component
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentProcess {
    pub component_name: String,
    pub pid: u32,
    pub process_group_id: u32,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
}

impl ComponentProcess {
    pub fn is_active(&self) -> bool {
        self.end_time.is_none()
    }
}
