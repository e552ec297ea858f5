use super::launcher::LaunchedProcess;
use super::signal::{self, KillTarget};
use crate::config::RegistryConfig;
use crate::kb::KnowledgeBase;
use crate::model::ComponentProcess;
use std::collections::{HashMap, HashSet};
use std::io;
use std::time::Duration;
use tokio::process::Child;
use tokio::sync::Mutex;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

/// Tracks component processes through the knowledge base and terminates them
pub struct ProcessRegistry {
    kb: KnowledgeBase,
    /// Children spawned by this engine, keyed by pid, so they can be reaped
    children: Mutex<HashMap<u32, Child>>,
    reap_poll_interval: Duration,
    group_kill: bool,
}

impl ProcessRegistry {
    pub fn new(kb: KnowledgeBase, config: &RegistryConfig, group_kill: bool) -> Self {
        Self {
            kb,
            children: Mutex::new(HashMap::new()),
            reap_poll_interval: config.reap_poll_interval(),
            group_kill,
        }
    }

    /// Record a freshly launched process for `component`.
    ///
    /// If the knowledge base refuses the record the process is terminated so
    /// that nothing runs untracked.
    pub async fn track(&self, component: &str, launched: LaunchedProcess) -> bool {
        let LaunchedProcess { handle, mut child } = launched;

        if self
            .kb
            .insert_component_process(component, handle.pid, handle.process_group_id)
            .await
        {
            debug!("Tracking component {} with pid {}", component, handle.pid);
            self.children.lock().await.insert(handle.pid, child);
            return true;
        }

        error!(
            "Could not record process {} of component {}, terminating it",
            handle.pid, component
        );
        let target = self.target_of(handle.pid, handle.process_group_id);
        if let Err(e) = signal::terminate(target) {
            warn!("Could not terminate untracked pid {}: {}", handle.pid, e);
        }
        if let Err(e) = child.wait().await {
            warn!("Could not reap untracked pid {}: {}", handle.pid, e);
        }
        false
    }

    /// Names of components with an active record whose process still exists.
    ///
    /// Records whose process has vanished are closed. `None` if the knowledge
    /// base could not be queried.
    pub async fn live_component_names(&self) -> Option<HashSet<String>> {
        self.reap_exited().await;

        let records = self.kb.active_component_processes().await?;
        let mut live = HashSet::new();
        for record in records {
            if signal::is_alive(KillTarget::Process(record.pid)) {
                live.insert(record.component_name);
            } else {
                warn!(
                    "Component {} process with pid {} is gone, closing its record",
                    record.component_name, record.pid
                );
                self.kb.end_component_process(&record).await;
            }
        }
        Some(live)
    }

    /// Terminate every active process of `component`
    pub async fn kill(&self, component: &str) -> bool {
        let Some(records) = self.kb.active_component_processes().await else {
            error!("Could not list active processes to kill {}", component);
            return false;
        };

        let mut success = true;
        for record in records.iter().filter(|r| r.component_name == component) {
            success &= self.kill_process(record).await;
        }
        success
    }

    /// Terminate every active process known to the knowledge base
    pub async fn kill_all(&self) -> bool {
        let Some(records) = self.kb.active_component_processes().await else {
            error!("Could not list active processes, nothing was killed");
            return false;
        };

        info!("Killing {} component processes", records.len());
        let mut success = true;
        for record in &records {
            success &= self.kill_process(record).await;
        }
        success
    }

    async fn kill_process(&self, process: &ComponentProcess) -> bool {
        let target = self.target_of(process.pid, process.process_group_id);

        match signal::terminate(target) {
            Ok(()) => {
                debug!(
                    "Sent SIGTERM to {:?} of component {}",
                    target, process.component_name
                );
                self.wait_for_exit(process.pid, target).await;
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                warn!(
                    "Component {} process with pid {} not found",
                    process.component_name, process.pid
                );
                if let Some(mut child) = self.children.lock().await.remove(&process.pid) {
                    let _ = child.try_wait();
                }
            }
            Err(e) => {
                error!(
                    "Error killing component {} with pid {}: {}",
                    process.component_name, process.pid, e
                );
                return false;
            }
        }

        let closed = self.kb.end_component_process(process).await;
        if closed {
            info!(
                "Component {} process {} terminated",
                process.component_name, process.pid
            );
        } else {
            error!(
                "Could not close process record of component {}",
                process.component_name
            );
        }
        closed
    }

    /// Block until the OS reports `target` gone. No timeout.
    async fn wait_for_exit(&self, pid: u32, target: KillTarget) {
        let child = self.children.lock().await.remove(&pid);
        if let Some(mut child) = child {
            if let Err(e) = child.wait().await {
                warn!("Could not wait for pid {}: {}", pid, e);
            }
        }

        while signal::is_alive(target) {
            sleep(self.reap_poll_interval).await;
        }
    }

    async fn reap_exited(&self) {
        let mut children = self.children.lock().await;
        children.retain(|pid, child| match child.try_wait() {
            Ok(Some(status)) => {
                debug!("Reaped pid {} ({})", pid, status);
                false
            }
            Ok(None) => true,
            Err(_) => false,
        });
    }

    fn target_of(&self, pid: u32, process_group_id: u32) -> KillTarget {
        if self.group_kill {
            KillTarget::Group(process_group_id)
        } else {
            KillTarget::Process(pid)
        }
    }
}
