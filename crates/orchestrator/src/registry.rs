//! Runtime agents and the registry that owns them.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::OrchestratorError;
use crate::template::AgentTemplate;

/// Operational state of an agent. Only active agents take part in routing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentStatus {
    #[default]
    Active,
    Paused,
    Maintenance,
}

impl fmt::Display for AgentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Active => "active",
            Self::Paused => "paused",
            Self::Maintenance => "maintenance",
        })
    }
}

impl FromStr for AgentStatus {
    type Err = OrchestratorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "active" => Ok(Self::Active),
            "paused" => Ok(Self::Paused),
            "maintenance" => Ok(Self::Maintenance),
            other => Err(OrchestratorError::Configuration(format!(
                "unknown agent status: {}",
                other
            ))),
        }
    }
}

/// What happens when an agent is created under an id already in use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollisionPolicy {
    /// Reset the agent to the template's configuration in place.
    #[default]
    Replace,
    /// Refuse with [`OrchestratorError::AgentExists`].
    Reject,
}

impl FromStr for CollisionPolicy {
    type Err = OrchestratorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "replace" | "overwrite" => Ok(Self::Replace),
            "reject" => Ok(Self::Reject),
            other => Err(OrchestratorError::Configuration(format!(
                "unknown collision policy: {}",
                other
            ))),
        }
    }
}

/// Per-agent settings. Each agent owns its copy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentConfig {
    pub preferred_provider: Option<String>,
    pub preferred_model: Option<String>,
    pub enable_llm: bool,
    pub status: AgentStatus,
}

impl AgentConfig {
    fn from_template(template: &AgentTemplate) -> Self {
        Self {
            preferred_provider: template.default_provider.clone(),
            preferred_model: template.default_model.clone(),
            enable_llm: template.enable_llm,
            status: AgentStatus::Active,
        }
    }
}

/// Partial update for [`AgentConfig`]. `None` leaves a field unchanged; an
/// empty provider or model string clears the hint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentConfigUpdate {
    #[serde(default)]
    pub preferred_provider: Option<String>,
    #[serde(default)]
    pub preferred_model: Option<String>,
    #[serde(default)]
    pub enable_llm: Option<bool>,
    #[serde(default)]
    pub status: Option<AgentStatus>,
}

impl AgentConfigUpdate {
    pub fn provider(mut self, provider: impl Into<String>) -> Self {
        self.preferred_provider = Some(provider.into());
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.preferred_model = Some(model.into());
        self
    }

    pub fn llm(mut self, enabled: bool) -> Self {
        self.enable_llm = Some(enabled);
        self
    }

    pub fn status(mut self, status: AgentStatus) -> Self {
        self.status = Some(status);
        self
    }

    fn apply(self, config: &mut AgentConfig) {
        fn hint(value: String) -> Option<String> {
            let value = value.trim();
            (!value.is_empty()).then(|| value.to_string())
        }

        if let Some(provider) = self.preferred_provider {
            config.preferred_provider = hint(provider);
        }
        if let Some(model) = self.preferred_model {
            config.preferred_model = hint(model);
        }
        if let Some(enabled) = self.enable_llm {
            config.enable_llm = enabled;
        }
        if let Some(status) = self.status {
            config.status = status;
        }
    }
}

/// A runtime agent: shared template plus its own config.
#[derive(Debug, Clone)]
pub struct Agent {
    pub id: String,
    pub template: Arc<AgentTemplate>,
    pub config: AgentConfig,
}

impl Agent {
    pub fn new(id: impl Into<String>, template: Arc<AgentTemplate>) -> Self {
        let config = AgentConfig::from_template(&template);
        Self {
            id: id.into(),
            template,
            config,
        }
    }

    pub fn name(&self) -> &str {
        &self.template.name
    }

    pub fn specialties(&self) -> &[String] {
        &self.template.specialties
    }

    pub fn keywords(&self) -> &[String] {
        &self.template.keywords
    }

    pub fn tools(&self) -> &[String] {
        &self.template.tools
    }

    pub fn is_active(&self) -> bool {
        self.config.status == AgentStatus::Active
    }

    pub fn summary(&self) -> AgentSummary {
        AgentSummary {
            id: self.id.clone(),
            name: self.template.name.clone(),
            description: self.template.description.clone(),
            template_id: self.template.id.clone(),
            specialties: self.template.specialties.clone(),
            tools: self.template.tools.clone(),
            preferred_provider: self.config.preferred_provider.clone(),
            preferred_model: self.config.preferred_model.clone(),
            enable_llm: self.config.enable_llm,
            status: self.config.status,
        }
    }
}

/// Public view of an agent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgentSummary {
    pub id: String,
    pub name: String,
    pub description: String,
    pub template_id: String,
    pub specialties: Vec<String>,
    pub tools: Vec<String>,
    pub preferred_provider: Option<String>,
    pub preferred_model: Option<String>,
    pub enable_llm: bool,
    pub status: AgentStatus,
}

/// Agents by id, in creation order. Order is the routing tie-break.
#[derive(Debug, Default)]
pub struct AgentRegistry {
    agents: IndexMap<String, Agent>,
    policy: CollisionPolicy,
}

impl AgentRegistry {
    pub fn new(policy: CollisionPolicy) -> Self {
        Self {
            agents: IndexMap::new(),
            policy,
        }
    }

    pub fn policy(&self) -> CollisionPolicy {
        self.policy
    }

    /// Instantiate `template` under `id`, subject to the collision policy.
    pub fn create(
        &mut self,
        template: Arc<AgentTemplate>,
        id: &str,
    ) -> Result<&Agent, OrchestratorError> {
        let exists = self.agents.contains_key(id);
        if exists && self.policy == CollisionPolicy::Reject {
            return Err(OrchestratorError::AgentExists(id.to_string()));
        }

        info!(
            "{} agent {} from template {}",
            if exists { "Resetting" } else { "Creating" },
            id,
            template.id
        );

        // IndexMap keeps the original slot on re-insert.
        let (index, _) = self
            .agents
            .insert_full(id.to_string(), Agent::new(id, template));
        self.agents
            .get_index(index)
            .map(|(_, agent)| agent)
            .ok_or_else(|| OrchestratorError::UnknownAgent(id.to_string()))
    }

    pub fn get(&self, id: &str) -> Option<&Agent> {
        self.agents.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.agents.contains_key(id)
    }

    /// Apply a partial config update to one agent.
    pub fn configure(
        &mut self,
        id: &str,
        update: AgentConfigUpdate,
    ) -> Result<&Agent, OrchestratorError> {
        let agent = self
            .agents
            .get_mut(id)
            .ok_or_else(|| OrchestratorError::UnknownAgent(id.to_string()))?;
        update.apply(&mut agent.config);
        info!(
            "Configured agent {}: status={}, llm={}, provider={:?}, model={:?}",
            id,
            agent.config.status,
            agent.config.enable_llm,
            agent.config.preferred_provider,
            agent.config.preferred_model
        );
        Ok(agent)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Agent> {
        self.agents.values()
    }

    pub fn summaries(&self) -> Vec<AgentSummary> {
        self.iter().map(Agent::summary).collect()
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}
