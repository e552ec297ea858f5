use super::coordinator::PlanCoordinator;
use super::types::{OperationalFlag, ShutdownReason};
use crate::config::ReconfConfig;
use crate::events::EventBus;
use crate::gateway::{Gateway, Transport};
use crate::kb::KnowledgeBase;
use crate::lifecycle::LifecycleController;
use crate::model::LifecycleState;
use crate::orchestrator::{ActivationOrchestrator, AdaptationOrchestrator};
use crate::process::{Launcher, ProcessRegistry};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::{oneshot, Mutex as AsyncMutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Plan-ready subscription started by `configure`
pub(super) struct Subscription {
    pub(super) token: CancellationToken,
    pub(super) task: JoinHandle<()>,
}

/// Reconfiguration execution engine: owns every collaborator and its own
/// lifecycle state
pub struct ReconfigurationEngine {
    pub(super) config: ReconfConfig,
    pub(super) events: EventBus,
    pub(super) gateway: Gateway,
    pub(super) registry: Arc<ProcessRegistry>,
    pub(super) lifecycle: LifecycleController,
    pub(super) activation: Arc<ActivationOrchestrator>,
    pub(super) adaptation: Arc<AdaptationOrchestrator>,
    pub(super) coordinator: PlanCoordinator,

    // Lifecycle management
    pub(super) state: Mutex<LifecycleState>,
    pub(super) operational: OperationalFlag,
    pub(super) execution_lock: Arc<AsyncMutex<()>>,
    pub(super) subscription: Mutex<Option<Subscription>>,
    pub(super) shutdown_sender: Arc<Mutex<Option<oneshot::Sender<ShutdownReason>>>>,
    pub(super) shutdown_receiver: Option<oneshot::Receiver<ShutdownReason>>,
}

impl ReconfigurationEngine {
    /// Wire the engine to `transport`. The engine starts `Unconfigured`.
    pub fn new(config: ReconfConfig, transport: Arc<dyn Transport>, events: EventBus) -> Self {
        let gateway = Gateway::new(transport, config.gateway.clone());
        let kb = KnowledgeBase::new(gateway.clone(), config.kb.clone());
        let registry = Arc::new(ProcessRegistry::new(
            kb.clone(),
            &config.registry,
            config.engine.process_group_kill,
        ));
        let lifecycle = LifecycleController::new(gateway.clone());
        let activation = Arc::new(ActivationOrchestrator::new(
            Launcher::new(config.launcher.clone()),
            Arc::clone(&registry),
            lifecycle.clone(),
            kb.clone(),
            events.clone(),
            config.engine.activity_persistence,
        ));
        let adaptation = Arc::new(AdaptationOrchestrator::new(
            gateway.clone(),
            kb.clone(),
            events.clone(),
            config.engine.parameter_adaptation,
        ));

        let operational = OperationalFlag::default();
        let execution_lock = Arc::new(AsyncMutex::new(()));
        let coordinator = PlanCoordinator::new(
            kb,
            Arc::clone(&activation),
            Arc::clone(&adaptation),
            events.clone(),
            operational.clone(),
            Arc::clone(&execution_lock),
        );
        let (shutdown_sender, shutdown_receiver) = oneshot::channel();

        Self {
            config,
            events,
            gateway,
            registry,
            lifecycle,
            activation,
            adaptation,
            coordinator,
            state: Mutex::new(LifecycleState::Unconfigured),
            operational,
            execution_lock,
            subscription: Mutex::new(None),
            shutdown_sender: Arc::new(Mutex::new(Some(shutdown_sender))),
            shutdown_receiver: Some(shutdown_receiver),
        }
    }

    pub fn config(&self) -> &ReconfConfig {
        &self.config
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }
}
