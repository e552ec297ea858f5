use super::ReconfigurationEngine;
use crate::error::Result;
use crate::model::Transition;
use tracing::{error, info, warn};

impl ReconfigurationEngine {
    /// Lower the operational flag. Active -> Inactive.
    pub async fn deactivate(&self) -> Result<()> {
        let next = self.check_transition(Transition::Deactivate)?;
        self.operational.set(false);
        self.set_state(next);
        info!("Reconfiguration engine inactive");
        Ok(())
    }

    /// Drop the plan subscription. Inactive -> Unconfigured.
    pub async fn cleanup(&self) -> Result<()> {
        let next = self.check_transition(Transition::Cleanup)?;
        self.operational.set(false);
        self.stop_subscription().await;
        self.set_state(next);
        info!("Reconfiguration engine cleaned up");
        Ok(())
    }

    /// Terminate every component process and finalize the engine.
    ///
    /// Waits for a running plan to finish first. Returns whether every
    /// process was terminated and its record closed.
    pub async fn shutdown(&self) -> Result<bool> {
        let next = self.check_transition(Transition::Shutdown)?;
        info!("Beginning shutdown");

        self.operational.set(false);
        self.stop_subscription().await;

        let _serialized = self.execution_lock.lock().await;
        let killed = self.registry.kill_all().await;
        if killed {
            info!("All component processes terminated");
        } else {
            error!("Some component processes could not be terminated");
        }

        self.set_state(next);
        info!("Reconfiguration engine finalized");
        Ok(killed)
    }

    async fn stop_subscription(&self) {
        let subscription = self.subscription.lock().take();
        if let Some(subscription) = subscription {
            subscription.token.cancel();
            if let Err(e) = subscription.task.await {
                warn!("Plan subscription task ended abnormally: {}", e);
            }
        }
    }
}
