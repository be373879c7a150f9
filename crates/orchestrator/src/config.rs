//! Orchestrator configuration.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::error::OrchestratorError;
use crate::registry::CollisionPolicy;
use crate::router::DEFAULT_ROUTING_THRESHOLD;

/// Settings for an [`crate::Orchestrator`].
#[derive(Debug, Clone, PartialEq)]
pub struct OrchestratorConfig {
    /// Agent that takes messages no specialist claims.
    pub default_agent: String,
    /// Earlier exchanges included in each prompt.
    pub history_turns: usize,
    /// Minimum routing score for a specialist.
    pub routing_threshold: u32,
    /// Bound on each tool execution.
    pub tool_timeout: Duration,
    /// Bound on one whole agent dispatch. Raised per request to cover a full
    /// walk of the provider chain plus the agent's tools.
    pub request_timeout: Duration,
    /// What `create_agent` does with an id already in use.
    pub collision_policy: CollisionPolicy,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            default_agent: "general".to_string(),
            history_turns: 5,
            routing_threshold: DEFAULT_ROUTING_THRESHOLD,
            tool_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(60),
            collision_policy: CollisionPolicy::Replace,
        }
    }
}

impl OrchestratorConfig {
    /// Create configuration from environment variables.
    ///
    /// - `SWITCHBOARD_DEFAULT_AGENT` (default: general)
    /// - `SWITCHBOARD_HISTORY_TURNS` (default: 5)
    /// - `SWITCHBOARD_ROUTING_THRESHOLD` (default: 1)
    /// - `SWITCHBOARD_TOOL_TIMEOUT_SECS` (default: 10)
    /// - `SWITCHBOARD_REQUEST_TIMEOUT_SECS` (default: 60)
    /// - `SWITCHBOARD_COLLISION_POLICY` - `replace` or `reject` (default: replace)
    pub fn from_env() -> Result<Self, OrchestratorError> {
        let defaults = Self::default();

        let collision_policy = match env_non_empty("SWITCHBOARD_COLLISION_POLICY") {
            Some(value) => value.parse()?,
            None => defaults.collision_policy,
        };

        Ok(Self {
            default_agent: env_non_empty("SWITCHBOARD_DEFAULT_AGENT")
                .unwrap_or(defaults.default_agent),
            history_turns: env_parse("SWITCHBOARD_HISTORY_TURNS")
                .unwrap_or(defaults.history_turns),
            routing_threshold: env_parse("SWITCHBOARD_ROUTING_THRESHOLD")
                .unwrap_or(defaults.routing_threshold),
            tool_timeout: env_parse("SWITCHBOARD_TOOL_TIMEOUT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.tool_timeout),
            request_timeout: env_parse("SWITCHBOARD_REQUEST_TIMEOUT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.request_timeout),
            collision_policy,
        })
    }

    pub fn with_default_agent(mut self, agent_id: impl Into<String>) -> Self {
        self.default_agent = agent_id.into();
        self
    }

    pub fn with_history_turns(mut self, turns: usize) -> Self {
        self.history_turns = turns;
        self
    }

    pub fn with_routing_threshold(mut self, threshold: u32) -> Self {
        self.routing_threshold = threshold;
        self
    }

    pub fn with_tool_timeout(mut self, timeout: Duration) -> Self {
        self.tool_timeout = timeout;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_collision_policy(mut self, policy: CollisionPolicy) -> Self {
        self.collision_policy = policy;
        self
    }
}

fn env_non_empty(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_parse<T: FromStr>(key: &str) -> Option<T> {
    env_non_empty(key).and_then(|v| v.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = OrchestratorConfig::default();
        assert_eq!(config.default_agent, "general");
        assert_eq!(config.routing_threshold, 1);
        assert_eq!(config.collision_policy, CollisionPolicy::Replace);
    }

    #[test]
    fn test_builders() {
        let config = OrchestratorConfig::default()
            .with_default_agent("support")
            .with_history_turns(2)
            .with_request_timeout(Duration::from_secs(3))
            .with_collision_policy(CollisionPolicy::Reject);

        assert_eq!(config.default_agent, "support");
        assert_eq!(config.history_turns, 2);
        assert_eq!(config.request_timeout, Duration::from_secs(3));
        assert_eq!(config.collision_policy, CollisionPolicy::Reject);
    }
}
