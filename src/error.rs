use crate::model::{LifecycleState, Transition};
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum ReconfError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("Deserialization error: {0}")]
    Deserialization(#[from] toml::de::Error),

    #[error("Invalid lifecycle transition {transition:?} from state {from:?}")]
    Lifecycle {
        from: LifecycleState,
        transition: Transition,
    },

    #[error("System error: {message}")]
    System { message: String },

    #[error("Component error in {component}: {message}")]
    Component { component: String, message: String },
}

impl ReconfError {
    pub fn system<S: Into<String>>(message: S) -> Self {
        Self::System {
            message: message.into(),
        }
    }

    pub fn component<S: Into<String>>(component: S, message: S) -> Self {
        Self::Component {
            component: component.into(),
            message: message.into(),
        }
    }
}

/// Why a remote call produced no response
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("service not available {endpoint} (waited {waited:?})")]
    Unreachable { endpoint: String, waited: Duration },

    #[error("call {call_id} to {endpoint} not completed within {budget:?}")]
    Timeout {
        endpoint: String,
        call_id: Uuid,
        budget: Duration,
    },

    #[error("call {call_id} to {endpoint} was cancelled before a response arrived")]
    Cancelled { endpoint: String, call_id: Uuid },

    #[error("unexpected response from {endpoint}: expected {expected}, got {got}")]
    UnexpectedResponse {
        endpoint: String,
        expected: &'static str,
        got: &'static str,
    },
}

#[derive(Error, Debug)]
pub enum EventBusError {
    #[error("Failed to publish event: {details}")]
    PublishFailed { details: String },

    #[error("Event channel closed")]
    ChannelClosed,
}

pub type Result<T> = std::result::Result<T, ReconfError>;
