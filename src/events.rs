use crate::error::EventBusError;
use crate::model::PlanResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

/// Events exchanged between the engine and its collaborators
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ReconfEvent {
    /// A new reconfiguration plan is ready in the knowledge base
    PlanInserted { start_time: DateTime<Utc> },
    /// A plan went through all phases and its result was recorded
    PlanExecuted {
        start_time: DateTime<Utc>,
        result: PlanResult,
    },
    ComponentActivated { name: String },
    ComponentDeactivated { name: String },
    /// A parameter profile was applied to a component
    ParametersAdapted { component: String, config: String },
    /// Engine shutdown requested
    ShutdownRequested { reason: String },
}

impl ReconfEvent {
    /// Get a human-readable description of the event
    pub fn description(&self) -> String {
        match self {
            ReconfEvent::PlanInserted { start_time } => {
                format!("Plan {} inserted", start_time)
            }
            ReconfEvent::PlanExecuted { start_time, result } => {
                format!("Plan {} executed: {}", start_time, result)
            }
            ReconfEvent::ComponentActivated { name } => {
                format!("Component {} activated", name)
            }
            ReconfEvent::ComponentDeactivated { name } => {
                format!("Component {} deactivated", name)
            }
            ReconfEvent::ParametersAdapted { component, config } => {
                format!("Parameters of {} adapted to {}", component, config)
            }
            ReconfEvent::ShutdownRequested { reason } => {
                format!("Shutdown requested: {}", reason)
            }
        }
    }

    /// Get the event type as a string for filtering
    pub fn event_type(&self) -> &'static str {
        match self {
            ReconfEvent::PlanInserted { .. } => "plan_inserted",
            ReconfEvent::PlanExecuted { .. } => "plan_executed",
            ReconfEvent::ComponentActivated { .. } => "component_activated",
            ReconfEvent::ComponentDeactivated { .. } => "component_deactivated",
            ReconfEvent::ParametersAdapted { .. } => "parameters_adapted",
            ReconfEvent::ShutdownRequested { .. } => "shutdown_requested",
        }
    }
}

/// Async event bus using broadcast channels
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<ReconfEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ReconfEvent> {
        self.sender.subscribe()
    }

    /// Publish an event to all subscribers.
    ///
    /// Fails when nobody is subscribed; callers treat that as informational.
    pub async fn publish(&self, event: ReconfEvent) -> Result<usize, EventBusError> {
        match &event {
            ReconfEvent::PlanExecuted { start_time, result } => {
                info!("Plan {} finished with result {}", start_time, result);
            }
            ReconfEvent::ShutdownRequested { reason } => {
                info!("Shutdown requested: {}", reason);
            }
            _ => debug!("Publishing event: {}", event.description()),
        }

        self.sender
            .send(event)
            .map_err(|e| EventBusError::PublishFailed {
                details: e.to_string(),
            })
    }
}

/// Event filter for selective event handling
#[derive(Debug, Clone)]
pub enum EventFilter {
    EventTypes(Vec<&'static str>),
}

impl EventFilter {
    pub fn matches(&self, event: &ReconfEvent) -> bool {
        match self {
            EventFilter::EventTypes(types) => types.contains(&event.event_type()),
        }
    }
}

/// Event receiver that skips events not matching its filter
pub struct EventReceiver {
    receiver: broadcast::Receiver<ReconfEvent>,
    filter: EventFilter,
    name: String,
}

impl EventReceiver {
    pub fn new(
        receiver: broadcast::Receiver<ReconfEvent>,
        filter: EventFilter,
        name: String,
    ) -> Self {
        Self {
            receiver,
            filter,
            name,
        }
    }

    /// Receive the next filtered event
    pub async fn recv(&mut self) -> Result<ReconfEvent, EventBusError> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => {
                    if self.filter.matches(&event) {
                        debug!(
                            "Receiver '{}' received event: {}",
                            self.name,
                            event.description()
                        );
                        return Ok(event);
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!("Receiver '{}' lagged behind by {} events", self.name, n);
                    return Err(EventBusError::PublishFailed {
                        details: format!("Receiver lagged behind by {} events", n),
                    });
                }
                Err(broadcast::error::RecvError::Closed) => {
                    debug!("Event bus closed for receiver '{}'", self.name);
                    return Err(EventBusError::ChannelClosed);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::{timeout, Duration};

    #[tokio::test]
    async fn test_event_bus_basic_functionality() {
        let bus = EventBus::new(10);
        let mut receiver = bus.subscribe();

        let event = ReconfEvent::ComponentActivated {
            name: "camera".to_string(),
        };

        let count = bus.publish(event.clone()).await.unwrap();
        assert_eq!(count, 1);

        let received = timeout(Duration::from_millis(100), receiver.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(received.event_type(), "component_activated");
    }

    #[tokio::test]
    async fn test_publish_without_subscribers_fails() {
        let bus = EventBus::new(4);
        let result = bus
            .publish(ReconfEvent::ShutdownRequested {
                reason: "test".to_string(),
            })
            .await;
        assert!(matches!(result, Err(EventBusError::PublishFailed { .. })));
    }

    #[tokio::test]
    async fn test_filtered_receiver_skips_other_events() {
        let bus = EventBus::new(10);
        let mut receiver = EventReceiver::new(
            bus.subscribe(),
            EventFilter::EventTypes(vec!["plan_inserted"]),
            "planner".to_string(),
        );

        bus.publish(ReconfEvent::ComponentActivated {
            name: "a".to_string(),
        })
        .await
        .unwrap();
        bus.publish(ReconfEvent::PlanInserted {
            start_time: Utc::now(),
        })
        .await
        .unwrap();

        let received = timeout(Duration::from_millis(100), receiver.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(received.event_type(), "plan_inserted");
        assert!(timeout(Duration::from_millis(50), receiver.recv()).await.is_err());
    }
}
