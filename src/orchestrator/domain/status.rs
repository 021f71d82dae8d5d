//! Orchestrator liveness status.

use super::ParseOrchestratorStatusError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Liveness status of a registered orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrchestratorStatus {
    /// The orchestrator heartbeats within the stale timeout.
    Active,
    /// The orchestrator has been silent past the stale timeout.
    Offline,
}

impl OrchestratorStatus {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Offline => "offline",
        }
    }
}

impl fmt::Display for OrchestratorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for OrchestratorStatus {
    type Error = ParseOrchestratorStatusError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "active" => Ok(Self::Active),
            "offline" => Ok(Self::Offline),
            _ => Err(ParseOrchestratorStatusError(value.to_owned())),
        }
    }
}
