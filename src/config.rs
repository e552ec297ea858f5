use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct ReconfConfig {
    pub gateway: GatewayConfig,
    pub launcher: LauncherConfig,
    pub registry: RegistryConfig,
    pub engine: EngineConfig,
    pub kb: KbConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct GatewayConfig {
    /// How long to wait for an endpoint to become reachable
    #[serde(default = "default_wait_timeout_ms")]
    pub wait_timeout_ms: u64,

    /// How long to wait for a dispatched call to complete
    #[serde(default = "default_call_timeout_ms")]
    pub call_timeout_ms: u64,

    /// Interval between reachability probes
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LauncherConfig {
    /// Runtime invocation prefix, split on whitespace (e.g. "ros2")
    #[serde(default = "default_runtime_command")]
    pub runtime_command: String,

    /// Window in which an exiting process counts as a failed launch
    #[serde(default = "default_grace_period_ms")]
    pub grace_period_ms: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct RegistryConfig {
    /// Interval between checks that a signalled process group is gone
    #[serde(default = "default_reap_poll_interval_ms")]
    pub reap_poll_interval_ms: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct EngineConfig {
    /// Signal the whole process group instead of only the leader
    #[serde(default = "default_true")]
    pub process_group_kill: bool,

    /// Push parameter profiles listed in plans
    #[serde(default = "default_true")]
    pub parameter_adaptation: bool,

    /// Record component activity in the knowledge base
    #[serde(default = "default_true")]
    pub activity_persistence: bool,

    /// Event bus capacity
    #[serde(default = "default_event_bus_capacity")]
    pub event_bus_capacity: usize,
}

/// Knowledge base endpoint names
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct KbConfig {
    #[serde(default = "default_get_latest_plan")]
    pub get_latest_plan: String,
    #[serde(default = "default_set_plan_result")]
    pub set_plan_result: String,
    #[serde(default = "default_supersede_plans")]
    pub supersede_plans: String,
    #[serde(default = "default_set_component_active")]
    pub set_component_active: String,
    #[serde(default = "default_get_component_parameters")]
    pub get_component_parameters: String,
    #[serde(default = "default_insert_component_process")]
    pub insert_component_process: String,
    #[serde(default = "default_end_component_process")]
    pub end_component_process: String,
    #[serde(default = "default_get_active_component_processes")]
    pub get_active_component_processes: String,
}

impl GatewayConfig {
    pub fn wait_timeout(&self) -> Duration {
        Duration::from_millis(self.wait_timeout_ms)
    }

    pub fn call_timeout(&self) -> Duration {
        Duration::from_millis(self.call_timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl LauncherConfig {
    pub fn grace_period(&self) -> Duration {
        Duration::from_millis(self.grace_period_ms)
    }
}

impl RegistryConfig {
    pub fn reap_poll_interval(&self) -> Duration {
        Duration::from_millis(self.reap_poll_interval_ms)
    }
}

impl KbConfig {
    /// All endpoint names with their keys
    pub fn endpoints(&self) -> [(&'static str, &str); 8] {
        [
            ("get_latest_plan", self.get_latest_plan.as_str()),
            ("set_plan_result", self.set_plan_result.as_str()),
            ("supersede_plans", self.supersede_plans.as_str()),
            ("set_component_active", self.set_component_active.as_str()),
            (
                "get_component_parameters",
                self.get_component_parameters.as_str(),
            ),
            (
                "insert_component_process",
                self.insert_component_process.as_str(),
            ),
            ("end_component_process", self.end_component_process.as_str()),
            (
                "get_active_component_processes",
                self.get_active_component_processes.as_str(),
            ),
        ]
    }
}

impl ReconfConfig {
    /// Load configuration from default sources (file + environment variables)
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_file("reconf.toml")
    }

    /// Load configuration from a specific file path.
    ///
    /// Environment variables use the `RECONF_` prefix and `__` between
    /// section and key, e.g. `RECONF_GATEWAY__CALL_TIMEOUT_MS=2000`.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path_str = path.as_ref().to_string_lossy();
        debug!("Loading configuration from: {}", path_str);

        let settings = Config::builder()
            .set_default("gateway.wait_timeout_ms", default_wait_timeout_ms())?
            .set_default("gateway.call_timeout_ms", default_call_timeout_ms())?
            .set_default("gateway.poll_interval_ms", default_poll_interval_ms())?
            .set_default("launcher.runtime_command", default_runtime_command())?
            .set_default("launcher.grace_period_ms", default_grace_period_ms())?
            .set_default(
                "registry.reap_poll_interval_ms",
                default_reap_poll_interval_ms(),
            )?
            .set_default("engine.process_group_kill", true)?
            .set_default("engine.parameter_adaptation", true)?
            .set_default("engine.activity_persistence", true)?
            .set_default(
                "engine.event_bus_capacity",
                default_event_bus_capacity() as i64,
            )?
            .set_default("kb.get_latest_plan", default_get_latest_plan())?
            .set_default("kb.set_plan_result", default_set_plan_result())?
            .set_default("kb.supersede_plans", default_supersede_plans())?
            .set_default("kb.set_component_active", default_set_component_active())?
            .set_default(
                "kb.get_component_parameters",
                default_get_component_parameters(),
            )?
            .set_default(
                "kb.insert_component_process",
                default_insert_component_process(),
            )?
            .set_default(
                "kb.end_component_process",
                default_end_component_process(),
            )?
            .set_default(
                "kb.get_active_component_processes",
                default_get_active_component_processes(),
            )?
            .add_source(File::with_name(&path_str).required(false))
            .add_source(
                Environment::with_prefix("RECONF")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        let config: ReconfConfig = settings.try_deserialize()?;

        info!("Configuration loaded successfully");
        debug!("Final configuration: {:#?}", config);

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.gateway.wait_timeout_ms == 0 || self.gateway.call_timeout_ms == 0 {
            return Err(ConfigError::Message(
                "Gateway timeouts must be greater than 0".to_string(),
            ));
        }

        if self.gateway.poll_interval_ms == 0 {
            return Err(ConfigError::Message(
                "Gateway poll interval must be greater than 0".to_string(),
            ));
        }

        if self.launcher.runtime_command.split_whitespace().next().is_none() {
            return Err(ConfigError::Message(
                "Launcher runtime command must not be empty".to_string(),
            ));
        }

        if self.launcher.grace_period_ms == 0 {
            return Err(ConfigError::Message(
                "Launcher grace period must be greater than 0".to_string(),
            ));
        }

        if self.registry.reap_poll_interval_ms == 0 {
            return Err(ConfigError::Message(
                "Registry reap poll interval must be greater than 0".to_string(),
            ));
        }

        if self.engine.event_bus_capacity == 0 {
            return Err(ConfigError::Message(
                "Event bus capacity must be greater than 0".to_string(),
            ));
        }

        for (key, endpoint) in self.kb.endpoints() {
            if endpoint.trim().is_empty() {
                return Err(ConfigError::Message(format!(
                    "Knowledge base endpoint '{}' must not be empty",
                    key
                )));
            }
        }

        Ok(())
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            wait_timeout_ms: default_wait_timeout_ms(),
            call_timeout_ms: default_call_timeout_ms(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

impl Default for LauncherConfig {
    fn default() -> Self {
        Self {
            runtime_command: default_runtime_command(),
            grace_period_ms: default_grace_period_ms(),
        }
    }
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            reap_poll_interval_ms: default_reap_poll_interval_ms(),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            process_group_kill: true,
            parameter_adaptation: true,
            activity_persistence: true,
            event_bus_capacity: default_event_bus_capacity(),
        }
    }
}

impl Default for KbConfig {
    fn default() -> Self {
        Self {
            get_latest_plan: default_get_latest_plan(),
            set_plan_result: default_set_plan_result(),
            supersede_plans: default_supersede_plans(),
            set_component_active: default_set_component_active(),
            get_component_parameters: default_get_component_parameters(),
            insert_component_process: default_insert_component_process(),
            end_component_process: default_end_component_process(),
            get_active_component_processes: default_get_active_component_processes(),
        }
    }
}

// Default value functions
fn default_wait_timeout_ms() -> u64 {
    5000
}
fn default_call_timeout_ms() -> u64 {
    5000
}
fn default_poll_interval_ms() -> u64 {
    20
}

fn default_runtime_command() -> String {
    "ros2".to_string()
}
fn default_grace_period_ms() -> u64 {
    1000
}

fn default_reap_poll_interval_ms() -> u64 {
    50
}

fn default_true() -> bool {
    true
}
fn default_event_bus_capacity() -> usize {
    64
}

fn default_get_latest_plan() -> String {
    "/kb/reconfiguration_plan/get_latest".to_string()
}
fn default_set_plan_result() -> String {
    "/kb/reconfiguration_plan/result/set".to_string()
}
fn default_supersede_plans() -> String {
    "/kb/reconfiguration_plan/outdated/set".to_string()
}
fn default_set_component_active() -> String {
    "/kb/component/active/set".to_string()
}
fn default_get_component_parameters() -> String {
    "/kb/component_parameters/get".to_string()
}
fn default_insert_component_process() -> String {
    "/kb/component_process/insert".to_string()
}
fn default_end_component_process() -> String {
    "/kb/component_process/end/set".to_string()
}
fn default_get_active_component_processes() -> String {
    "/kb/component_process/get_active".to_string()
}
