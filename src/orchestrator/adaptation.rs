use crate::events::{EventBus, ReconfEvent};
use crate::gateway::{unexpected, Gateway, Request, Response};
use crate::kb::{KnowledgeBase, ParameterLookup};
use crate::model::{ComponentParameters, ConfigRef, Parameter};
use tracing::{debug, error, info};

/// Applies named parameter profiles to running components
pub struct AdaptationOrchestrator {
    gateway: Gateway,
    kb: KnowledgeBase,
    events: EventBus,
    enabled: bool,
}

impl AdaptationOrchestrator {
    pub fn new(gateway: Gateway, kb: KnowledgeBase, events: EventBus, enabled: bool) -> Self {
        Self {
            gateway,
            kb,
            events,
            enabled,
        }
    }

    /// Apply every profile, continuing past failures. True only if none failed.
    pub async fn adapt(&self, configs: &[ConfigRef]) -> bool {
        if !self.enabled {
            if !configs.is_empty() {
                debug!("Parameter adaptation disabled, skipping {} configurations", configs.len());
            }
            return true;
        }

        let mut success = true;
        for config in configs {
            success &= self.adapt_one(config).await;
        }
        success
    }

    async fn adapt_one(&self, config: &ConfigRef) -> bool {
        let target = match self.kb.component_parameters(config).await {
            ParameterLookup::Resolved(target) => target,
            ParameterLookup::Unresolved => return true,
            ParameterLookup::Failed => {
                error!("Could not resolve configuration {}", config);
                return false;
            }
        };

        let endpoint = format!("{}/set_parameters_atomically", target.component);
        let request = Request::SetParametersAtomically {
            parameters: target.parameters.clone(),
        };

        let reason = match self.gateway.call(&endpoint, request).await {
            Some(Response::ParametersSet {
                successful: true, ..
            }) => {
                info!(
                    "Applied configuration {} to component {}",
                    config, target.component
                );
                if let Err(e) = self
                    .events
                    .publish(ReconfEvent::ParametersAdapted {
                        component: target.component.clone(),
                        config: config.name.clone(),
                    })
                    .await
                {
                    debug!("Event not delivered: {}", e);
                }
                return true;
            }
            Some(Response::ParametersSet { reason, .. }) => reason,
            Some(other) => unexpected(&endpoint, "parameters_set", &other).to_string(),
            None => "no response".to_string(),
        };

        error!(
            "Error in parameter adaptation: component {}, configuration {}, parameters [{}], reason: {}",
            target.component,
            config,
            describe(&target),
            reason
        );
        false
    }
}

fn describe(target: &ComponentParameters) -> String {
    target
        .parameters
        .iter()
        .map(|Parameter { name, value }| format!("{}={}", name, value))
        .collect::<Vec<_>>()
        .join(", ")
}
