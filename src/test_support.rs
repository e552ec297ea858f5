//! Shared fixtures for tests that start real processes.

use crate::config::ReconfConfig;
use crate::events::EventBus;
use crate::gateway::{Gateway, LocalTransport};
use crate::kb::{KnowledgeBase, MemoryKnowledgeBase};
use crate::model::Component;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

/// Stand-in for the robotics runtime, invoked as `sh <script> <verb> <pkg> <target> ...`.
/// Targets starting with `missing` fail immediately, anything else keeps running.
const FAKE_RUNTIME: &str = r#"#!/bin/sh
case "$3" in
  missing*)
    echo "No executable found: $2 $3" >&2
    exit 1
    ;;
esac
exec sleep 30
"#;

pub fn test_config(dir: &Path) -> ReconfConfig {
    let script = dir.join("fake_runtime.sh");
    std::fs::write(&script, FAKE_RUNTIME).unwrap();

    let mut config = ReconfConfig::default();
    config.launcher.runtime_command = format!("sh {}", script.display());
    config.launcher.grace_period_ms = 300;
    config.gateway.wait_timeout_ms = 200;
    config.gateway.call_timeout_ms = 1000;
    config.gateway.poll_interval_ms = 10;
    config.registry.reap_poll_interval_ms = 10;
    config
}

/// Transport, memory KB and client wired together in a temp dir
pub struct TestRig {
    pub dir: TempDir,
    pub config: ReconfConfig,
    pub transport: LocalTransport,
    pub store: Arc<MemoryKnowledgeBase>,
    pub events: EventBus,
    pub gateway: Gateway,
    pub kb: KnowledgeBase,
}

impl TestRig {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        let transport = LocalTransport::new();
        let events = EventBus::new(config.engine.event_bus_capacity);

        let store = Arc::new(MemoryKnowledgeBase::new(Some(events.clone())));
        store.register(&transport, &config.kb);

        let gateway = Gateway::new(Arc::new(transport.clone()), config.gateway.clone());
        let kb = KnowledgeBase::new(gateway.clone(), config.kb.clone());

        Self {
            dir,
            config,
            transport,
            store,
            events,
            gateway,
            kb,
        }
    }

    /// Register components in the memory KB
    pub fn with_components(self, components: &[Component]) -> Self {
        for component in components {
            self.store.add_component(component.clone());
        }
        self
    }
}
