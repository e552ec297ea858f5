use super::command::{build_command, LaunchDescriptor};
use super::signal;
use crate::config::LauncherConfig;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::{Child, Command};
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

/// Upper bound on stderr captured from a process that died during the grace window
const MAX_CAPTURED_STDERR: u64 = 64 * 1024;

/// Identity of a launched process group
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessHandle {
    pub pid: u32,
    pub process_group_id: u32,
}

/// A process that survived its grace window
#[derive(Debug)]
pub struct LaunchedProcess {
    pub handle: ProcessHandle,
    pub child: Child,
}

/// Spawns component processes as leaders of their own session
#[derive(Debug, Clone)]
pub struct Launcher {
    config: LauncherConfig,
}

impl Launcher {
    pub fn new(config: LauncherConfig) -> Self {
        Self { config }
    }

    /// Start `descriptor` and make sure it is still running after the grace window.
    ///
    /// Every failure is logged and reported as `None`.
    pub async fn launch(&self, descriptor: &LaunchDescriptor) -> Option<LaunchedProcess> {
        let args = build_command(&self.config.runtime_command, descriptor);
        let Some((program, rest)) = args.split_first() else {
            error!("Launch of {} failed: empty runtime command", descriptor);
            return None;
        };
        debug!("Launching {}: {}", descriptor, args.join(" "));

        let mut command = Command::new(program);
        command
            .args(rest)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());
        // SAFETY: the hook only calls setsid, which is async-signal-safe
        unsafe {
            command.pre_exec(signal::new_session);
        }

        let mut child = match command.spawn() {
            Ok(child) => child,
            Err(e) => {
                error!("Launch of {} failed: {}", descriptor, e);
                return None;
            }
        };

        let Some(pid) = child.id() else {
            error!("Launch of {} failed: process exited before its pid was read", descriptor);
            return None;
        };

        match timeout(self.config.grace_period(), child.wait()).await {
            Ok(Ok(status)) => {
                let stderr = self.captured_stderr(&mut child).await;
                error!(
                    "Launch of {} failed: exited with {} during grace period, stderr: {}",
                    descriptor,
                    status,
                    stderr.trim()
                );
                return None;
            }
            Ok(Err(e)) => {
                error!("Launch of {} failed: could not poll pid {}: {}", descriptor, pid, e);
                return None;
            }
            Err(_) => {}
        }

        let process_group_id = match signal::process_group_of(pid) {
            Ok(pgid) => pgid,
            Err(e) => {
                warn!("Could not read process group of pid {}: {}", pid, e);
                pid
            }
        };

        self.forward_stderr(descriptor, &mut child);

        info!(
            "Launched {} with pid {} (group {})",
            descriptor, pid, process_group_id
        );
        Some(LaunchedProcess {
            handle: ProcessHandle {
                pid,
                process_group_id,
            },
            child,
        })
    }

    async fn captured_stderr(&self, child: &mut Child) -> String {
        let Some(stderr) = child.stderr.take() else {
            return String::new();
        };
        let mut output = Vec::new();
        let mut reader = stderr.take(MAX_CAPTURED_STDERR);
        // A surviving grandchild may hold the pipe open
        match timeout(self.config.grace_period(), reader.read_to_end(&mut output)).await {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => debug!("Could not read stderr: {}", e),
            Err(_) => debug!("Timed out reading stderr"),
        }
        String::from_utf8_lossy(&output).into_owned()
    }

    fn forward_stderr(&self, descriptor: &LaunchDescriptor, child: &mut Child) {
        let Some(stderr) = child.stderr.take() else {
            return;
        };
        let source = descriptor
            .instance_name
            .clone()
            .unwrap_or_else(|| descriptor.package.clone());

        tokio::spawn(async move {
            let mut lines = BufReader::new(stderr).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                debug!("[{}] {}", source, line);
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_captured_stderr_survives_invalid_utf8() {
        let launcher = Launcher::new(LauncherConfig {
            runtime_command: "sh".to_string(),
            grace_period_ms: 1000,
        });
        let mut child = Command::new("sh")
            .arg("-c")
            .arg("printf 'bad \\377 byte\\n' >&2; exit 1")
            .stderr(Stdio::piped())
            .spawn()
            .unwrap();

        let output = launcher.captured_stderr(&mut child).await;
        child.wait().await.unwrap();

        assert!(output.starts_with("bad "));
        assert!(output.contains('\u{FFFD}'));
        assert!(output.trim_end().ends_with("byte"));
    }
}
