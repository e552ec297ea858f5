pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod gateway;
pub mod kb;
pub mod lifecycle;
pub mod model;
pub mod orchestrator;
pub mod process;

#[cfg(test)]
mod test_support;

pub use config::ReconfConfig;
pub use engine::{ExecutionPhase, ReconfigurationEngine, ShutdownReason, ShutdownTrigger};
pub use error::{EventBusError, GatewayError, ReconfError, Result};
pub use events::{EventBus, EventFilter, EventReceiver, ReconfEvent};
pub use gateway::{Endpoint, Gateway, LocalTransport, Request, Response, Transport};
pub use kb::{KbSeed, KnowledgeBase, MemoryKnowledgeBase, ParameterLookup};
pub use lifecycle::{LifecycleController, MockLifecycleNode, TargetState};
pub use model::{
    Component, ComponentKind, ComponentParameters, ComponentProcess, ConfigRef, LaunchTarget,
    LifecycleState, Parameter, ParameterValue, PlanResult, ReconfigurationPlan, Transition,
};
pub use process::{LaunchDescriptor, Launcher, ProcessHandle, ProcessRegistry};
