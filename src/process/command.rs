use crate::model::{Component, LaunchTarget, Parameter};
use std::fmt;

/// Everything needed to start a component
#[derive(Debug, Clone, PartialEq)]
pub struct LaunchDescriptor {
    pub package: String,
    pub target: LaunchTarget,
    pub instance_name: Option<String>,
    /// Only parameters with a value; unset ones are left out of the command
    pub parameters: Vec<Parameter>,
}

impl LaunchDescriptor {
    pub fn from_component(component: &Component) -> Self {
        Self {
            package: component.package.clone(),
            target: component.target.clone(),
            instance_name: Some(component.name.clone()),
            parameters: component
                .parameters
                .iter()
                .filter(|p| p.value.is_set())
                .cloned()
                .collect(),
        }
    }
}

impl fmt::Display for LaunchDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.target {
            LaunchTarget::Executable(exe) => write!(f, "{}/{}", self.package, exe)?,
            LaunchTarget::LaunchFile(file) => write!(f, "{}/{} (launch)", self.package, file)?,
        }
        if let Some(name) = &self.instance_name {
            write!(f, " as {}", name)?;
        }
        if !self.parameters.is_empty() {
            write!(f, " with")?;
            for parameter in &self.parameters {
                write!(f, " {}={}", parameter.name, parameter.value)?;
            }
        }
        Ok(())
    }
}

/// Build the argument vector for `descriptor`.
///
/// `runtime` is split on whitespace and prefixed to the runtime arguments:
/// `run <pkg> <exe> --ros-args -r __node:=<name> -r k:=v ...` for executables,
/// `launch <pkg> <file> k:=v ...` for launch files.
pub fn build_command(runtime: &str, descriptor: &LaunchDescriptor) -> Vec<String> {
    let mut args: Vec<String> = runtime.split_whitespace().map(str::to_string).collect();

    match &descriptor.target {
        LaunchTarget::Executable(executable) => {
            args.push("run".to_string());
            args.push(descriptor.package.clone());
            args.push(executable.clone());

            if descriptor.instance_name.is_some() || !descriptor.parameters.is_empty() {
                args.push("--ros-args".to_string());
                if let Some(name) = &descriptor.instance_name {
                    args.push("-r".to_string());
                    args.push(format!("__node:={}", name));
                }
                for parameter in &descriptor.parameters {
                    args.push("-r".to_string());
                    args.push(format!("{}:={}", parameter.name, parameter.value));
                }
            }
        }
        LaunchTarget::LaunchFile(file) => {
            args.push("launch".to_string());
            args.push(descriptor.package.clone());
            args.push(file.clone());
            for parameter in &descriptor.parameters {
                args.push(format!("{}:={}", parameter.name, parameter.value));
            }
        }
    }

    args
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ComponentKind, ParameterValue};

    #[test]
    fn test_run_command() {
        let component = Component::process("c1", "pkgA", "exeA")
            .with_parameter("rate", ParameterValue::Integer(10))
            .with_parameter("unset", ParameterValue::NotSet)
            .with_parameter("frames", ParameterValue::StringArray(vec!["map".into()]));

        let args = build_command("ros2", &LaunchDescriptor::from_component(&component));

        assert_eq!(
            args,
            vec![
                "ros2",
                "run",
                "pkgA",
                "exeA",
                "--ros-args",
                "-r",
                "__node:=c1",
                "-r",
                "rate:=10",
                "-r",
                "frames:=[\"map\"]",
            ]
        );
    }

    #[test]
    fn test_run_command_without_name_or_parameters() {
        let descriptor = LaunchDescriptor {
            package: "pkgA".to_string(),
            target: LaunchTarget::Executable("exeA".to_string()),
            instance_name: None,
            parameters: Vec::new(),
        };
        assert_eq!(
            build_command("ros2", &descriptor),
            vec!["ros2", "run", "pkgA", "exeA"]
        );
    }

    #[test]
    fn test_launch_command_omits_instance_name() {
        let component = Component::new(
            "nav",
            "nav_pkg",
            LaunchTarget::LaunchFile("nav.launch.py".to_string()),
            ComponentKind::ManagedProcess,
        )
        .with_parameter("use_sim", ParameterValue::Bool(true));

        let args = build_command("ros2", &LaunchDescriptor::from_component(&component));
        assert_eq!(
            args,
            vec!["ros2", "launch", "nav_pkg", "nav.launch.py", "use_sim:=true"]
        );
    }

    #[test]
    fn test_multi_word_runtime() {
        let component = Component::process("c1", "pkgA", "exeA");
        let args = build_command("sh /tmp/fake.sh", &LaunchDescriptor::from_component(&component));
        assert_eq!(&args[..4], &["sh", "/tmp/fake.sh", "run", "pkgA"]);
    }
}
