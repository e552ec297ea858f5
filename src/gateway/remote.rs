use super::message::{Request, Response};
use super::transport::Transport;
use crate::config::GatewayConfig;
use crate::error::GatewayError;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, timeout, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};
use uuid::Uuid;

/// Bounded-wait remote call primitive
#[derive(Clone)]
pub struct Gateway {
    transport: Arc<dyn Transport>,
    config: GatewayConfig,
    in_flight: Arc<AtomicUsize>,
}

/// Decrements the in-flight counter when the dispatched task ends
struct InFlightGuard(Arc<AtomicUsize>);

impl InFlightGuard {
    fn new(counter: Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl Gateway {
    pub fn new(transport: Arc<dyn Transport>, config: GatewayConfig) -> Self {
        Self {
            transport,
            config,
            in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Number of dispatched calls that have not finished or been cancelled yet
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Call `endpoint`, logging a single error line and returning `None` on failure
    pub async fn call(&self, endpoint: &str, request: Request) -> Option<Response> {
        match self.try_call(endpoint, request).await {
            Ok(response) => Some(response),
            Err(e) => {
                error!("{}", e);
                None
            }
        }
    }

    /// Call `endpoint` and classify any failure
    pub async fn try_call(
        &self,
        endpoint: &str,
        request: Request,
    ) -> Result<Response, GatewayError> {
        self.wait_for_endpoint(endpoint).await?;

        let call_id = Uuid::new_v4();
        let token = CancellationToken::new();
        let cancelled = token.clone();
        let guard = InFlightGuard::new(Arc::clone(&self.in_flight));
        let transport = Arc::clone(&self.transport);
        let name = endpoint.to_string();

        debug!(
            "Dispatching {} call {} to {}",
            request.kind(),
            call_id,
            endpoint
        );

        let handle = tokio::spawn(async move {
            let _guard = guard;
            tokio::select! {
                _ = cancelled.cancelled() => Err(GatewayError::Cancelled {
                    endpoint: name.clone(),
                    call_id,
                }),
                response = transport.send(&name, request) => {
                    response.ok_or_else(|| GatewayError::Unreachable {
                        endpoint: name.clone(),
                        waited: Duration::ZERO,
                    })
                }
            }
        });

        let budget = self.config.call_timeout();
        match timeout(budget, handle).await {
            Ok(Ok(result)) => {
                if result.is_ok() {
                    debug!("Call {} to {} completed", call_id, endpoint);
                }
                result
            }
            Ok(Err(join_error)) => {
                debug!("Call {} task failed: {}", call_id, join_error);
                Err(GatewayError::Cancelled {
                    endpoint: endpoint.to_string(),
                    call_id,
                })
            }
            Err(_) => {
                token.cancel();
                Err(GatewayError::Timeout {
                    endpoint: endpoint.to_string(),
                    call_id,
                    budget,
                })
            }
        }
    }

    async fn wait_for_endpoint(&self, endpoint: &str) -> Result<(), GatewayError> {
        let waited = self.config.wait_timeout();
        let deadline = Instant::now() + waited;

        loop {
            if self.transport.is_available(endpoint) {
                return Ok(());
            }
            let now = Instant::now();
            if now >= deadline {
                return Err(GatewayError::Unreachable {
                    endpoint: endpoint.to_string(),
                    waited,
                });
            }
            sleep(self.config.poll_interval().min(deadline - now)).await;
        }
    }
}

/// Error for a response of the wrong shape
pub fn unexpected(endpoint: &str, expected: &'static str, got: &Response) -> GatewayError {
    GatewayError::UnexpectedResponse {
        endpoint: endpoint.to_string(),
        expected,
        got: got.kind(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::{Endpoint, LocalTransport};
    use crate::model::LifecycleState;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::io::Write;

    struct Slow(Duration);

    /// Collects formatted log output for inspection
    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl CapturedLogs {
        fn lines(&self) -> Vec<String> {
            String::from_utf8_lossy(&self.0.lock())
                .lines()
                .map(str::to_string)
                .collect()
        }
    }

    #[async_trait]
    impl Endpoint for Slow {
        async fn handle(&self, _request: Request) -> Response {
            sleep(self.0).await;
            Response::State(LifecycleState::Active)
        }
    }

    fn gateway(transport: &LocalTransport, wait_ms: u64, call_ms: u64) -> Gateway {
        Gateway::new(
            Arc::new(transport.clone()),
            GatewayConfig {
                wait_timeout_ms: wait_ms,
                call_timeout_ms: call_ms,
                poll_interval_ms: 10,
            },
        )
    }

    #[tokio::test]
    async fn test_successful_call() {
        let transport = LocalTransport::new();
        transport.register("/n/get_state", Arc::new(Slow(Duration::from_millis(5))));
        let gateway = gateway(&transport, 100, 500);

        let response = gateway.call("/n/get_state", Request::GetState).await;
        assert_eq!(response, Some(Response::State(LifecycleState::Active)));
        assert_eq!(gateway.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_returns_none_after_wait() {
        let transport = LocalTransport::new();
        let gateway = gateway(&transport, 100, 500);

        let started = Instant::now();
        let result = gateway.try_call("/missing/get_state", Request::GetState).await;
        let elapsed = started.elapsed();

        assert!(matches!(result, Err(GatewayError::Unreachable { .. })));
        assert!(elapsed >= Duration::from_millis(100));
        assert!(elapsed < Duration::from_millis(1000));
        assert_eq!(gateway.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_endpoint_appearing_during_wait() {
        let transport = LocalTransport::new();
        let gateway = gateway(&transport, 1000, 500);

        let late = transport.clone();
        tokio::spawn(async move {
            sleep(Duration::from_millis(50)).await;
            late.register("/late/get_state", Arc::new(Slow(Duration::ZERO)));
        });

        let response = gateway.call("/late/get_state", Request::GetState).await;
        assert!(response.is_some());
    }

    #[tokio::test]
    async fn test_timeout_cancels_in_flight_call() {
        let transport = LocalTransport::new();
        transport.register("/stuck/get_state", Arc::new(Slow(Duration::from_secs(30))));
        let gateway = gateway(&transport, 100, 200);

        let started = Instant::now();
        let result = gateway.try_call("/stuck/get_state", Request::GetState).await;
        let elapsed = started.elapsed();

        assert!(matches!(result, Err(GatewayError::Timeout { .. })));
        assert!(elapsed >= Duration::from_millis(200));
        assert!(elapsed < Duration::from_millis(1500));

        // The cancelled task releases its slot shortly after
        for _ in 0..50 {
            if gateway.in_flight() == 0 {
                break;
            }
            sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(gateway.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_repeated_timeouts_do_not_accumulate() {
        let transport = LocalTransport::new();
        transport.register("/stuck/get_state", Arc::new(Slow(Duration::from_secs(30))));
        let gateway = gateway(&transport, 50, 50);

        for _ in 0..5 {
            assert!(gateway.call("/stuck/get_state", Request::GetState).await.is_none());
        }

        sleep(Duration::from_millis(100)).await;
        assert_eq!(gateway.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_timeout_logs_one_error_line() {
        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::ERROR)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        // Current-thread runtime: the spawned call task logs through this default too
        let _guard = tracing::subscriber::set_default(subscriber);

        let transport = LocalTransport::new();
        transport.register("/stuck/get_state", Arc::new(Slow(Duration::from_secs(30))));
        let gateway = gateway(&transport, 100, 100);

        assert!(gateway.call("/stuck/get_state", Request::GetState).await.is_none());
        sleep(Duration::from_millis(50)).await;

        let lines = logs.lines();
        assert_eq!(lines.len(), 1, "unexpected log output: {:?}", lines);
        assert!(lines[0].contains("ERROR"));
        assert!(lines[0].contains("/stuck/get_state"));
    }
}
