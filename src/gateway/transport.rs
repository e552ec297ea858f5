use super::message::{Request, Response};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

/// A named service able to answer requests
#[async_trait]
pub trait Endpoint: Send + Sync {
    async fn handle(&self, request: Request) -> Response;
}

/// Delivery mechanism between the gateway and endpoints
#[async_trait]
pub trait Transport: Send + Sync {
    /// Whether `endpoint` can currently accept calls
    fn is_available(&self, endpoint: &str) -> bool;

    /// Deliver `request`; `None` when the endpoint went away before answering
    async fn send(&self, endpoint: &str, request: Request) -> Option<Response>;
}

/// In-process transport routing calls to registered endpoints
#[derive(Clone, Default)]
pub struct LocalTransport {
    endpoints: Arc<RwLock<HashMap<String, Arc<dyn Endpoint>>>>,
}

impl LocalTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<S: Into<String>>(&self, name: S, endpoint: Arc<dyn Endpoint>) {
        let name = name.into();
        info!("Registering endpoint {}", name);
        self.endpoints.write().insert(name, endpoint);
    }

    pub fn unregister(&self, name: &str) -> bool {
        let removed = self.endpoints.write().remove(name).is_some();
        if removed {
            info!("Unregistered endpoint {}", name);
        }
        removed
    }

    pub fn endpoint_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.endpoints.read().keys().cloned().collect();
        names.sort();
        names
    }
}

#[async_trait]
impl Transport for LocalTransport {
    fn is_available(&self, endpoint: &str) -> bool {
        self.endpoints.read().contains_key(endpoint)
    }

    async fn send(&self, endpoint: &str, request: Request) -> Option<Response> {
        // Lock is released before awaiting the handler
        let target = self.endpoints.read().get(endpoint).cloned();
        match target {
            Some(target) => Some(target.handle(request).await),
            None => {
                debug!("Endpoint {} disappeared before delivery", endpoint);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::LifecycleState;

    struct Fixed;

    #[async_trait]
    impl Endpoint for Fixed {
        async fn handle(&self, _request: Request) -> Response {
            Response::State(LifecycleState::Inactive)
        }
    }

    #[tokio::test]
    async fn test_register_and_send() {
        let transport = LocalTransport::new();
        assert!(!transport.is_available("/cam/get_state"));

        transport.register("/cam/get_state", Arc::new(Fixed));
        assert!(transport.is_available("/cam/get_state"));

        let response = transport.send("/cam/get_state", Request::GetState).await;
        assert_eq!(response, Some(Response::State(LifecycleState::Inactive)));
    }

    #[tokio::test]
    async fn test_unregister() {
        let transport = LocalTransport::new();
        transport.register("a", Arc::new(Fixed));
        transport.register("b", Arc::new(Fixed));
        assert_eq!(transport.endpoint_names(), vec!["a", "b"]);

        assert!(transport.unregister("a"));
        assert!(!transport.unregister("a"));
        assert!(transport.send("a", Request::GetState).await.is_none());
    }
}
