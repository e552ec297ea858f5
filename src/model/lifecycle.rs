use serde::{Deserialize, Serialize};
use std::fmt;

/// Primary states of a managed component
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    Unknown,
    Unconfigured,
    Inactive,
    Active,
    Finalized,
}

impl LifecycleState {
    pub fn id(&self) -> u8 {
        match self {
            LifecycleState::Unknown => 0,
            LifecycleState::Unconfigured => 1,
            LifecycleState::Inactive => 2,
            LifecycleState::Active => 3,
            LifecycleState::Finalized => 4,
        }
    }

    pub fn from_id(id: u8) -> Self {
        match id {
            1 => LifecycleState::Unconfigured,
            2 => LifecycleState::Inactive,
            3 => LifecycleState::Active,
            4 => LifecycleState::Finalized,
            _ => LifecycleState::Unknown,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            LifecycleState::Unknown => "unknown",
            LifecycleState::Unconfigured => "unconfigured",
            LifecycleState::Inactive => "inactive",
            LifecycleState::Active => "active",
            LifecycleState::Finalized => "finalized",
        }
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Requestable transitions between primary states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transition {
    Configure,
    Cleanup,
    Activate,
    Deactivate,
    Shutdown,
}

impl Transition {
    /// Wire id of the transition when requested from `from`.
    /// Shutdown has one id per source state.
    pub fn id(&self, from: LifecycleState) -> u8 {
        match (self, from) {
            (Transition::Configure, _) => 1,
            (Transition::Cleanup, _) => 2,
            (Transition::Activate, _) => 3,
            (Transition::Deactivate, _) => 4,
            (Transition::Shutdown, LifecycleState::Inactive) => 6,
            (Transition::Shutdown, LifecycleState::Active) => 7,
            (Transition::Shutdown, _) => 5,
        }
    }

    /// Resulting state, or `None` when the transition is not valid from `from`
    pub fn apply(&self, from: LifecycleState) -> Option<LifecycleState> {
        match (self, from) {
            (Transition::Configure, LifecycleState::Unconfigured) => Some(LifecycleState::Inactive),
            (Transition::Cleanup, LifecycleState::Inactive) => Some(LifecycleState::Unconfigured),
            (Transition::Activate, LifecycleState::Inactive) => Some(LifecycleState::Active),
            (Transition::Deactivate, LifecycleState::Active) => Some(LifecycleState::Inactive),
            (
                Transition::Shutdown,
                LifecycleState::Unconfigured | LifecycleState::Inactive | LifecycleState::Active,
            ) => Some(LifecycleState::Finalized),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Transition::Configure => "configure",
            Transition::Cleanup => "cleanup",
            Transition::Activate => "activate",
            Transition::Deactivate => "deactivate",
            Transition::Shutdown => "shutdown",
        }
    }
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_ids_round_trip() {
        for state in [
            LifecycleState::Unconfigured,
            LifecycleState::Inactive,
            LifecycleState::Active,
            LifecycleState::Finalized,
        ] {
            assert_eq!(LifecycleState::from_id(state.id()), state);
        }
        assert_eq!(LifecycleState::from_id(200), LifecycleState::Unknown);
    }

    #[test]
    fn test_transition_table() {
        use LifecycleState::*;

        assert_eq!(Transition::Configure.apply(Unconfigured), Some(Inactive));
        assert_eq!(Transition::Activate.apply(Inactive), Some(Active));
        assert_eq!(Transition::Deactivate.apply(Active), Some(Inactive));
        assert_eq!(Transition::Cleanup.apply(Inactive), Some(Unconfigured));
        assert_eq!(Transition::Shutdown.apply(Active), Some(Finalized));

        assert_eq!(Transition::Activate.apply(Unconfigured), None);
        assert_eq!(Transition::Configure.apply(Active), None);
        assert_eq!(Transition::Shutdown.apply(Finalized), None);
    }

    #[test]
    fn test_shutdown_ids_depend_on_source() {
        assert_eq!(Transition::Shutdown.id(LifecycleState::Unconfigured), 5);
        assert_eq!(Transition::Shutdown.id(LifecycleState::Inactive), 6);
        assert_eq!(Transition::Shutdown.id(LifecycleState::Active), 7);
        assert_eq!(Transition::Activate.id(LifecycleState::Inactive), 3);
    }
}
