//! Per-agent request statistics.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;

use crate::message::ResponseSource;

/// Counters for one agent.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AgentStats {
    pub calls: u64,
    /// Requests where providers were exhausted, the task panicked or timed out.
    pub errors: u64,
    pub fallbacks: u64,
    pub average_latency_ms: f64,
    pub last_active: Option<DateTime<Utc>>,
}

impl AgentStats {
    fn record(&mut self, latency: Duration, source: ResponseSource, error: bool) {
        self.calls += 1;
        if error {
            self.errors += 1;
        }
        if source == ResponseSource::Fallback {
            self.fallbacks += 1;
        }
        let latency_ms = latency.as_secs_f64() * 1000.0;
        self.average_latency_ms += (latency_ms - self.average_latency_ms) / self.calls as f64;
        self.last_active = Some(Utc::now());
    }
}

/// Statistics for all agents.
#[derive(Debug, Default)]
pub struct StatsTracker {
    agents: RwLock<HashMap<String, AgentStats>>,
}

impl StatsTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn record(
        &self,
        agent_id: &str,
        latency: Duration,
        source: ResponseSource,
        error: bool,
    ) {
        self.agents
            .write()
            .await
            .entry(agent_id.to_string())
            .or_default()
            .record(latency, source, error);
    }

    /// Counters for one agent; zeroed if it has not handled anything yet.
    pub async fn get(&self, agent_id: &str) -> AgentStats {
        self.agents
            .read()
            .await
            .get(agent_id)
            .cloned()
            .unwrap_or_default()
    }

    pub async fn total_calls(&self) -> u64 {
        self.agents.read().await.values().map(|s| s.calls).sum()
    }
}
