use crate::gateway::{Endpoint, LocalTransport, Request, Response};
use crate::model::{LifecycleState, ParameterValue};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// In-process managed component: answers state queries, transitions and
/// atomic parameter updates like a real lifecycle node would
pub struct MockLifecycleNode {
    name: String,
    state: Mutex<LifecycleState>,
    parameters: Mutex<HashMap<String, ParameterValue>>,
    rejected: HashSet<String>,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl MockLifecycleNode {
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            state: Mutex::new(LifecycleState::Unconfigured),
            parameters: Mutex::new(HashMap::new()),
            rejected: HashSet::new(),
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_state(self, state: LifecycleState) -> Self {
        *self.state.lock() = state;
        self
    }

    /// Refuse any atomic update that touches `parameter`
    pub fn rejecting<S: Into<String>>(mut self, parameter: S) -> Self {
        self.rejected.insert(parameter.into());
        self
    }

    /// Answer every request after `delay`
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Serve `<name>/get_state`, `<name>/change_state` and `<name>/set_parameters_atomically`
    pub fn register(self: &Arc<Self>, transport: &LocalTransport) {
        for service in ["get_state", "change_state", "set_parameters_atomically"] {
            transport.register(
                format!("{}/{}", self.name, service),
                Arc::clone(self) as Arc<dyn Endpoint>,
            );
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> LifecycleState {
        *self.state.lock()
    }

    pub fn parameter(&self, name: &str) -> Option<ParameterValue> {
        self.parameters.lock().get(name).cloned()
    }

    /// Number of requests received, including ones answered too late
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Endpoint for MockLifecycleNode {
    async fn handle(&self, request: Request) -> Response {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        match request {
            Request::GetState => Response::State(self.state()),
            Request::ChangeState { transition } => {
                let mut state = self.state.lock();
                match transition.apply(*state) {
                    Some(next) => {
                        debug!("{}: {} -> {}", self.name, *state, next);
                        *state = next;
                        Response::Ack { success: true }
                    }
                    None => Response::Ack { success: false },
                }
            }
            Request::SetParametersAtomically { parameters } => {
                if let Some(bad) = parameters.iter().find(|p| self.rejected.contains(&p.name)) {
                    return Response::ParametersSet {
                        successful: false,
                        reason: format!("parameter '{}' cannot be set", bad.name),
                    };
                }
                let mut stored = self.parameters.lock();
                for parameter in parameters {
                    stored.insert(parameter.name, parameter.value);
                }
                Response::ParametersSet {
                    successful: true,
                    reason: String::new(),
                }
            }
            other => Response::Unsupported {
                request: other.kind().to_string(),
            },
        }
    }
}
