use crate::error::{ReconfError, Result};
use crate::model::{Component, Parameter, ReconfigurationPlan};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use tracing::info;

/// Initial contents of a [`MemoryKnowledgeBase`](super::MemoryKnowledgeBase)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KbSeed {
    #[serde(default)]
    pub components: Vec<Component>,
    #[serde(default)]
    pub configurations: Vec<SeedConfiguration>,
    #[serde(default)]
    pub plans: Vec<ReconfigurationPlan>,
}

/// Named parameter profile for one component
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedConfiguration {
    pub name: String,
    pub component: String,
    #[serde(default)]
    pub parameters: Vec<Parameter>,
}

impl KbSeed {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let seed: KbSeed = toml::from_str(&content)?;
        seed.validate()?;
        info!(
            "Loaded KB seed from {}: {} components, {} configurations, {} plans",
            path.as_ref().display(),
            seed.components.len(),
            seed.configurations.len(),
            seed.plans.len()
        );
        Ok(seed)
    }

    /// Component and configuration names must be unique
    pub fn validate(&self) -> Result<()> {
        let mut components = HashSet::new();
        for component in &self.components {
            if !components.insert(component.name.as_str()) {
                return Err(ReconfError::component(
                    component.name.as_str(),
                    "defined more than once in the seed",
                ));
            }
        }

        let mut configurations = HashSet::new();
        for configuration in &self.configurations {
            if !configurations.insert(configuration.name.as_str()) {
                return Err(ReconfError::system(format!(
                    "configuration {} defined more than once in the seed",
                    configuration.name
                )));
            }
        }
        Ok(())
    }

    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ComponentKind, LaunchTarget, ParameterValue, PlanResult};
    use std::io::Write;

    const SEED: &str = r#"
[[components]]
name = "c1"
package = "pkgA"
kind = "process"
target = { executable = "exeA" }

[[components]]
name = "nav"
package = "nav_pkg"
kind = "managed_process"
target = { launch_file = "nav.launch.py" }

[[configurations]]
name = "nav_slow"
component = "nav"

[[configurations.parameters]]
name = "max_speed"
value = { type = 3, double_value = 0.2 }

[[plans]]
start_time = "2024-05-01T10:00:00Z"
component_configurations = [{ name = "nav_slow" }]

[[plans.components_to_activate]]
name = "c1"
package = "pkgA"
kind = "process"
target = { executable = "exeA" }
"#;

    #[test]
    fn test_seed_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SEED.as_bytes()).unwrap();

        let seed = KbSeed::from_file(file.path()).unwrap();

        assert_eq!(seed.components.len(), 2);
        assert_eq!(seed.components[1].kind, ComponentKind::ManagedProcess);
        assert_eq!(
            seed.components[1].target,
            LaunchTarget::LaunchFile("nav.launch.py".to_string())
        );
        assert_eq!(
            seed.configurations[0].parameters[0].value,
            ParameterValue::Double(0.2)
        );

        let plan = &seed.plans[0];
        assert_eq!(plan.result, PlanResult::Pending);
        assert_eq!(plan.components_to_activate[0].name, "c1");
        assert_eq!(plan.component_configurations[0].name, "nav_slow");
    }

    #[test]
    fn test_duplicate_component_rejected() {
        let seed = KbSeed {
            components: vec![
                Component::process("c1", "pkgA", "exeA"),
                Component::process("c1", "pkgB", "exeB"),
            ],
            ..KbSeed::default()
        };
        assert!(matches!(
            seed.validate(),
            Err(ReconfError::Component { component, .. }) if component == "c1"
        ));
    }

    #[test]
    fn test_exported_seed_loads_back() {
        let seed = KbSeed {
            components: vec![Component::managed("nav", "nav_pkg", "nav_node")
                .with_parameter("rate", ParameterValue::Integer(10))],
            ..KbSeed::default()
        };

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(seed.to_toml().unwrap().as_bytes()).unwrap();

        let loaded = KbSeed::from_file(file.path()).unwrap();
        assert_eq!(loaded.components, seed.components);
    }

    #[test]
    fn test_missing_seed_file() {
        assert!(KbSeed::from_file("/nonexistent/seed.toml").is_err());
    }
}
