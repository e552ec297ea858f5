mod component;
mod lifecycle;
mod parameter;
mod plan;

pub use component::{Component, ComponentKind, ComponentProcess, LaunchTarget};
pub use lifecycle::{LifecycleState, Transition};
pub use parameter::{Parameter, ParameterValue, ParameterValueError, RawParameterValue};
pub use plan::{ComponentParameters, ConfigRef, PlanResult, ReconfigurationPlan};
