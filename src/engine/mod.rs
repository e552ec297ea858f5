//! The reconfiguration engine and its own lifecycle.
//!
//! `configure` subscribes to plan-ready events, `activate` opens the gate for
//! every public operation, `shutdown` terminates all component processes.

mod coordinator;
mod executor;
mod operations;
mod runtime;
mod shutdown;
mod startup;
mod state;
mod types;


pub use coordinator::PlanCoordinator;
pub use executor::ReconfigurationEngine;
pub use runtime::ShutdownTrigger;
pub use types::{ExecutionPhase, ShutdownReason};
