//! Component processes: building launch commands, spawning them as process
//! group leaders and tracking them until they are terminated.

mod command;
mod launcher;
mod registry;
pub mod signal;

pub use command::{build_command, LaunchDescriptor};
pub use launcher::{LaunchedProcess, Launcher, ProcessHandle};
pub use registry::ProcessRegistry;
