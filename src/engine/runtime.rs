use super::{ReconfigurationEngine, ShutdownReason};
use crate::error::{ReconfError, Result};
use crate::events::ReconfEvent;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::signal;
use tokio::sync::oneshot;
use tracing::{debug, error, info};

type ShutdownSlot = Arc<Mutex<Option<oneshot::Sender<ShutdownReason>>>>;

/// Requests shutdown of a running engine from elsewhere
#[derive(Clone)]
pub struct ShutdownTrigger(ShutdownSlot);

impl ShutdownTrigger {
    /// Returns false if shutdown was already requested
    pub fn trigger(&self, reason: ShutdownReason) -> bool {
        match self.0.lock().take() {
            Some(sender) => sender.send(reason).is_ok(),
            None => false,
        }
    }
}

impl ReconfigurationEngine {
    pub fn shutdown_trigger(&self) -> ShutdownTrigger {
        ShutdownTrigger(Arc::clone(&self.shutdown_sender))
    }

    /// Wait for SIGINT, SIGTERM or a trigger, then shut down.
    ///
    /// Returns the process exit code: 0, or 1 if some component process
    /// could not be terminated.
    pub async fn run(&mut self) -> Result<i32> {
        info!("Reconfiguration engine is running");

        let shutdown_receiver = self
            .shutdown_receiver
            .take()
            .ok_or_else(|| ReconfError::system("Shutdown receiver already taken"))?;

        self.setup_signal_handlers();

        let reason = shutdown_receiver
            .await
            .map_err(|_| ReconfError::system("Shutdown channel closed unexpectedly"))?;

        info!("Shutdown initiated: {}", reason);
        if let Err(e) = self
            .events
            .publish(ReconfEvent::ShutdownRequested {
                reason: reason.to_string(),
            })
            .await
        {
            debug!("Event not delivered: {}", e);
        }

        let exit_code = if self.shutdown().await? { 0 } else { 1 };
        info!("Shutdown completed with exit code: {}", exit_code);
        Ok(exit_code)
    }

    fn setup_signal_handlers(&self) {
        #[cfg(unix)]
        {
            let trigger = self.shutdown_trigger();
            tokio::spawn(async move {
                match signal::unix::signal(signal::unix::SignalKind::terminate()) {
                    Ok(mut sigterm) => {
                        if sigterm.recv().await.is_some() {
                            info!("Received SIGTERM signal");
                            trigger.trigger(ShutdownReason::Signal("SIGTERM".to_string()));
                        }
                    }
                    Err(e) => error!("Failed to register SIGTERM handler: {}", e),
                }
            });
        }

        let trigger = self.shutdown_trigger();
        tokio::spawn(async move {
            if let Ok(()) = signal::ctrl_c().await {
                info!("Received SIGINT signal (Ctrl+C)");
                trigger.trigger(ShutdownReason::Signal("SIGINT".to_string()));
            }
        });
    }
}
