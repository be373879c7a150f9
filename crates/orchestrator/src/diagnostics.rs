//! System health report.

use chrono::{DateTime, Utc};
use llm_providers::ProviderStatus;
use serde::Serialize;

use crate::registry::AgentStatus;
use crate::stats::AgentStats;

/// Coarse health of the whole system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OverallHealth {
    /// Agents active and at least one provider answering.
    Healthy,
    /// Answers still come back, but some will be canned.
    Degraded,
    /// No agent is active.
    Offline,
}

impl OverallHealth {
    /// Offline without an active agent; degraded without a provider or with
    /// any agent out of service.
    pub fn assess(active_agents: usize, total_agents: usize, provider_available: bool) -> Self {
        if active_agents == 0 {
            Self::Offline
        } else if !provider_available || active_agents < total_agents {
            Self::Degraded
        } else {
            Self::Healthy
        }
    }
}

/// One agent's row in the report.
#[derive(Debug, Clone, Serialize)]
pub struct AgentHealth {
    pub id: String,
    pub name: String,
    pub status: AgentStatus,
    pub enable_llm: bool,
    pub stats: AgentStats,
}

#[derive(Debug, Clone, Serialize)]
pub struct SystemDiagnostics {
    pub generated_at: DateTime<Utc>,
    pub session_count: usize,
    pub message_count: usize,
    pub agents: Vec<AgentHealth>,
    pub providers: Vec<ProviderStatus>,
    pub best_provider: Option<String>,
    pub tools: Vec<String>,
    pub overall: OverallHealth,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assess() {
        assert_eq!(OverallHealth::assess(0, 5, true), OverallHealth::Offline);
        assert_eq!(OverallHealth::assess(5, 5, false), OverallHealth::Degraded);
        assert_eq!(OverallHealth::assess(4, 5, true), OverallHealth::Degraded);
        assert_eq!(OverallHealth::assess(5, 5, true), OverallHealth::Healthy);
    }

    #[test]
    fn test_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&OverallHealth::Degraded).unwrap(),
            "\"degraded\""
        );
    }
}
