use super::executor::Subscription;
use super::ReconfigurationEngine;
use crate::error::{EventBusError, Result};
use crate::events::{EventFilter, EventReceiver};
use crate::model::Transition;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

impl ReconfigurationEngine {
    /// Subscribe to plan-ready events. Unconfigured -> Inactive.
    pub async fn configure(&self) -> Result<()> {
        let next = self.check_transition(Transition::Configure)?;
        info!("Configuring reconfiguration engine");

        for (key, endpoint) in self.config.kb.endpoints() {
            debug!("KB endpoint {}: {}", key, endpoint);
        }

        let token = CancellationToken::new();
        let cancelled = token.clone();
        let coordinator = self.coordinator.clone();
        let mut receiver = EventReceiver::new(
            self.events.subscribe(),
            EventFilter::EventTypes(vec!["plan_inserted"]),
            "plan-executor".to_string(),
        );

        let task = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = cancelled.cancelled() => break,
                    event = receiver.recv() => match event {
                        Ok(event) => {
                            debug!("Handling {}", event.description());
                            coordinator.execute().await;
                        }
                        Err(EventBusError::ChannelClosed) => break,
                        Err(e) => {
                            // Missed notifications still mean a plan may be waiting
                            warn!("Plan events lost: {}", e);
                            coordinator.execute().await;
                        }
                    }
                }
            }
            debug!("Plan subscription stopped");
        });

        *self.subscription.lock() = Some(Subscription { token, task });
        self.set_state(next);
        info!("Reconfiguration engine configured");
        Ok(())
    }

    /// Raise the operational flag. Inactive -> Active.
    pub async fn activate(&self) -> Result<()> {
        let next = self.check_transition(Transition::Activate)?;
        self.operational.set(true);
        self.set_state(next);
        info!("Reconfiguration engine active");
        Ok(())
    }
}
