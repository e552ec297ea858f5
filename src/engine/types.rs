use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// What the plan coordinator is doing right now
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionPhase {
    Idle,
    Executing,
}

impl fmt::Display for ExecutionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionPhase::Idle => f.write_str("idle"),
            ExecutionPhase::Executing => f.write_str("executing"),
        }
    }
}

/// System shutdown reason
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShutdownReason {
    Signal(String),
    UserRequest,
}

impl fmt::Display for ShutdownReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShutdownReason::Signal(signal) => write!(f, "received {}", signal),
            ShutdownReason::UserRequest => f.write_str("user request"),
        }
    }
}

/// True only while the engine is `Active`. Readable by anyone, written only
/// by the engine's lifecycle hooks.
#[derive(Debug, Clone, Default)]
pub struct OperationalFlag(Arc<AtomicBool>);

impl OperationalFlag {
    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    pub(super) fn set(&self, value: bool) {
        self.0.store(value, Ordering::SeqCst);
    }
}
