mod controller;
mod mock;

pub use controller::{LifecycleController, TargetState};
pub use mock::MockLifecycleNode;
