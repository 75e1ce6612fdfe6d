use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Lifecycle label of a replica, as reported by the allocation state machine.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum RoutingState {
    Starting,
    Started,
    Stopping,
    Stopped,
    Failed,
}

impl RoutingState {
    pub const ALL: [RoutingState; 5] = [
        RoutingState::Starting,
        RoutingState::Started,
        RoutingState::Stopping,
        RoutingState::Stopped,
        RoutingState::Failed,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            RoutingState::Starting => "starting",
            RoutingState::Started => "started",
            RoutingState::Stopping => "stopping",
            RoutingState::Stopped => "stopped",
            RoutingState::Failed => "failed",
        }
    }
}

impl fmt::Display for RoutingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RoutingState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RoutingState::ALL
            .into_iter()
            .find(|state| state.as_str() == s)
            .ok_or_else(|| {
                format!(
                    "unknown routing state '{}', available: starting, started, stopping, stopped, failed",
                    s
                )
            })
    }
}

/// A routing state together with the reason the state machine gave for it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct RoutingStateAndReason {
    pub state: RoutingState,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl RoutingStateAndReason {
    pub fn new(state: RoutingState, reason: Option<String>) -> Self {
        Self { state, reason }
    }
}
