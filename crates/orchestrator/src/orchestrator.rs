//! Main orchestrator that coordinates message processing.

use std::sync::Arc;
use std::time::{Duration, Instant};

use agent_tools::ToolRegistry;
use chrono::Utc;
use llm_providers::{ProviderRegistry, ProviderStatus, ProvidersConfig};
use provider_core::ProviderInfo;
use tokio::sync::RwLock;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::config::OrchestratorConfig;
use crate::diagnostics::{AgentHealth, OverallHealth, SystemDiagnostics};
use crate::dispatch::{AgentReply, DispatchRequest, Dispatcher};
use crate::error::OrchestratorError;
use crate::message::{AgentMessage, Message, MessageMetadata};
use crate::registry::{Agent, AgentConfigUpdate, AgentRegistry, AgentStatus, AgentSummary};
use crate::router::{RouteDecision, Router};
use crate::session::{SessionSnapshot, SessionStore};
use crate::sink::{NoOpSink, TranscriptSink};
use crate::stats::{AgentStats, StatsTracker};
use crate::template::{AgentTemplate, TemplateCatalog};

/// Main orchestrator that coordinates message processing.
///
/// The orchestrator:
/// - Routes each message to one agent by keyword score
/// - Runs the agent through the provider failover chain
/// - Falls back to canned replies when no provider answers
/// - Augments replies with triggered tools
/// - Keeps per-session history and per-agent statistics
///
/// Construct one at startup and share it; every method takes `&self`.
pub struct Orchestrator {
    config: OrchestratorConfig,
    router: Router,
    dispatcher: Dispatcher,
    sessions: SessionStore,
    agents: RwLock<AgentRegistry>,
    templates: RwLock<TemplateCatalog>,
    stats: StatsTracker,
    sink: Arc<dyn TranscriptSink>,
}

impl Orchestrator {
    /// Create an orchestrator with the built-in templates and one agent per
    /// template.
    ///
    /// Fails if the configured default agent is not among them.
    pub fn new(
        config: OrchestratorConfig,
        providers: Arc<ProviderRegistry>,
        tools: Arc<ToolRegistry>,
    ) -> Result<Self, OrchestratorError> {
        let templates = TemplateCatalog::with_builtins();
        let mut agents = AgentRegistry::new(config.collision_policy);
        for template in templates.templates() {
            let id = template.id.clone();
            agents.create(template, &id)?;
        }

        if !agents.contains(&config.default_agent) {
            return Err(OrchestratorError::Configuration(format!(
                "default agent '{}' does not match any template",
                config.default_agent
            )));
        }

        info!(
            "Orchestrator ready: {} agents, {} providers, {} tools (default agent: {})",
            agents.len(),
            providers.len(),
            tools.len(),
            config.default_agent
        );

        Ok(Self {
            router: Router::new(&config.default_agent, config.routing_threshold),
            dispatcher: Dispatcher::new(providers, tools),
            sessions: SessionStore::new(),
            agents: RwLock::new(agents),
            templates: RwLock::new(templates),
            stats: StatsTracker::new(),
            sink: Arc::new(NoOpSink),
            config,
        })
    }

    /// Create an orchestrator from environment variables.
    ///
    /// Providers come from [`ProvidersConfig::from_env`], tools from
    /// [`agent_tools::default_registry`].
    pub fn from_env() -> Result<Self, OrchestratorError> {
        let config = OrchestratorConfig::from_env()?;
        let providers = ProvidersConfig::from_env().build_registry()?;
        let tools = agent_tools::default_registry()
            .map_err(|e| OrchestratorError::Configuration(format!("tool setup failed: {}", e)))?
            .with_timeout(config.tool_timeout);

        Self::new(config, Arc::new(providers), Arc::new(tools))
    }

    /// Send every stored message pair to `sink`.
    pub fn with_sink(mut self, sink: Arc<dyn TranscriptSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Bound on one dispatch of `agent`.
    ///
    /// Never shorter than a full walk of the provider chain plus every tool
    /// the agent may run, so the outer bound cannot cut failover short.
    fn dispatch_bound(&self, agent: &Agent) -> Duration {
        let tools = u32::try_from(agent.tools().len()).unwrap_or(u32::MAX);
        let floor = self.dispatcher.providers().chain_budget()
            + self.dispatcher.tools().timeout().saturating_mul(tools);
        self.config.request_timeout.max(floor)
    }

    /// Process one user message and return the agent's reply.
    ///
    /// Only an empty message or session id is an error. Provider failures,
    /// tool failures, panics and timeouts all become a fallback reply.
    pub async fn process_message(
        &self,
        text: &str,
        session_id: &str,
        user_id: Option<&str>,
    ) -> Result<AgentMessage, OrchestratorError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(OrchestratorError::EmptyMessage);
        }
        let session_id = session_id.trim();
        if session_id.is_empty() {
            return Err(OrchestratorError::InvalidSession);
        }

        let started = Instant::now();
        let arrived_at = Utc::now();
        let session = self.sessions.get_or_create(session_id, user_id).await;

        let (decision, agent) = {
            let agents = self.agents.read().await;
            let decision = self.router.route(text, agents.iter());
            let agent = agents
                .get(&decision.agent_id)
                .cloned()
                .ok_or_else(|| OrchestratorError::UnknownAgent(decision.agent_id.clone()))?;
            (decision, agent)
        };

        info!(
            "Session {} routed to {} (score {}, defaulted: {})",
            session_id, agent.id, decision.score, decision.defaulted
        );

        let request = DispatchRequest {
            session_id: session_id.to_string(),
            agent: agent.clone(),
            text: text.to_string(),
            history: session.recent(self.config.history_turns).await,
            route_confidence: decision.confidence,
        };

        let bound = self.dispatch_bound(&agent);
        let dispatcher = self.dispatcher.clone();
        let mut handle = tokio::spawn(async move { dispatcher.dispatch(request).await });

        let (reply, failed) = match timeout(bound, &mut handle).await {
            Ok(Ok(reply)) => {
                let failed = reply.exhausted;
                (reply, failed)
            }
            Ok(Err(e)) => {
                warn!("Dispatch for agent {} failed: {}", agent.id, e);
                (AgentReply::fallback(&agent, text, decision.confidence), true)
            }
            Err(_) => {
                handle.abort();
                warn!("Dispatch for agent {} timed out after {:?}", agent.id, bound);
                (AgentReply::fallback(&agent, text, decision.confidence), true)
            }
        };

        let elapsed = started.elapsed();
        let processing_time_ms = elapsed.as_millis() as u64;

        let metadata = MessageMetadata {
            source: reply.source,
            processing_time_ms,
            provider_id: reply.provider_id.clone(),
            model: reply.model.clone(),
            tools_used: reply.tools_used.clone(),
        };
        let stored = session
            .append_pair(
                Message::user(text, arrived_at),
                Message::agent(&agent.id, &reply.content, Utc::now(), reply.confidence, metadata),
            )
            .await;

        self.stats
            .record(&agent.id, elapsed, reply.source, failed)
            .await;

        if let Err(e) = self.sink.record(session_id, &stored).await {
            warn!("Transcript sink failed for session {}: {}", session_id, e);
        }

        debug!(
            "Session {} answered by {} via {} in {} ms",
            session_id, agent.id, reply.source, processing_time_ms
        );

        let [_, agent_message] = stored;
        Ok(AgentMessage {
            message_id: agent_message.id,
            session_id: session_id.to_string(),
            agent_id: agent.id.clone(),
            agent_name: agent.name().to_string(),
            content: agent_message.content,
            confidence: reply.confidence,
            source: reply.source,
            provider_id: reply.provider_id,
            model: reply.model,
            tools_used: reply.tools_used,
            processing_time_ms,
            timestamp: agent_message.timestamp,
        })
    }

    /// Which agent would take `text` right now.
    pub async fn route(&self, text: &str) -> RouteDecision {
        let agents = self.agents.read().await;
        self.router.route(text, agents.iter())
    }

    pub async fn get_agent_list(&self) -> Vec<AgentSummary> {
        self.agents.read().await.summaries()
    }

    /// Apply a partial update to one agent.
    ///
    /// A preferred provider must be registered.
    pub async fn configure_agent(
        &self,
        agent_id: &str,
        update: AgentConfigUpdate,
    ) -> Result<AgentSummary, OrchestratorError> {
        if let Some(provider) = update.preferred_provider.as_deref() {
            let provider = provider.trim();
            if !provider.is_empty() && !self.dispatcher.providers().has_provider(provider) {
                return Err(OrchestratorError::UnknownProvider(provider.to_string()));
            }
        }

        let mut agents = self.agents.write().await;
        agents.configure(agent_id, update).map(|agent| agent.summary())
    }

    /// Instantiate a template under its own id.
    pub async fn create_agent(&self, template_id: &str) -> Result<AgentSummary, OrchestratorError> {
        self.create_agent_with_id(template_id, template_id).await
    }

    /// Instantiate a template under a chosen id.
    pub async fn create_agent_with_id(
        &self,
        template_id: &str,
        agent_id: &str,
    ) -> Result<AgentSummary, OrchestratorError> {
        let agent_id = agent_id.trim();
        if agent_id.is_empty() {
            return Err(OrchestratorError::Configuration(
                "agent id is empty".to_string(),
            ));
        }

        let template = self
            .templates
            .read()
            .await
            .get(template_id)
            .ok_or_else(|| OrchestratorError::UnknownTemplate(template_id.to_string()))?;

        let mut agents = self.agents.write().await;
        agents.create(template, agent_id).map(|agent| agent.summary())
    }

    /// Add or replace a template. Existing agents keep the template they
    /// were created from.
    pub async fn register_template(&self, template: AgentTemplate) -> Result<(), OrchestratorError> {
        if template.id.trim().is_empty() {
            return Err(OrchestratorError::Configuration(
                "template id is empty".to_string(),
            ));
        }
        self.templates.write().await.register(template);
        Ok(())
    }

    pub async fn templates(&self) -> Vec<Arc<AgentTemplate>> {
        self.templates.read().await.templates()
    }

    /// Provider statuses from the health cache. Never probes.
    pub async fn get_llm_providers(&self) -> Vec<ProviderStatus> {
        self.dispatcher.providers().statuses().await
    }

    /// Probe one provider now.
    pub async fn test_llm_provider(&self, id: &str) -> Result<ProviderStatus, OrchestratorError> {
        Ok(self.dispatcher.providers().test_provider(id).await?)
    }

    /// The provider a request would use right now.
    pub async fn best_provider(&self) -> Option<ProviderInfo> {
        self.dispatcher.providers().best_available().await
    }

    pub async fn session(&self, id: &str) -> Option<SessionSnapshot> {
        self.sessions.snapshot(id).await
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.len().await
    }

    /// The session store, for housekeeping such as [`SessionStore::prune_idle`].
    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    pub async fn agent_stats(&self, agent_id: &str) -> AgentStats {
        self.stats.get(agent_id).await
    }

    /// Report on sessions, agents, providers and tools.
    pub async fn perform_system_diagnostics(&self) -> SystemDiagnostics {
        let providers = self.dispatcher.providers();
        let best_provider = providers.best_available().await.map(|info| info.id);
        let provider_statuses = providers.statuses().await;

        let summaries = self.get_agent_list().await;
        let mut agents = Vec::with_capacity(summaries.len());
        for summary in summaries {
            agents.push(AgentHealth {
                stats: self.stats.get(&summary.id).await,
                id: summary.id,
                name: summary.name,
                status: summary.status,
                enable_llm: summary.enable_llm,
            });
        }

        let active = agents
            .iter()
            .filter(|a| a.status == AgentStatus::Active)
            .count();
        let overall = OverallHealth::assess(active, agents.len(), best_provider.is_some());

        info!(
            "Diagnostics: {:?}, {} active agents, best provider {:?}",
            overall, active, best_provider
        );

        SystemDiagnostics {
            generated_at: Utc::now(),
            session_count: self.sessions.len().await,
            message_count: self.sessions.total_messages().await,
            agents,
            providers: provider_statuses,
            best_provider,
            tools: self
                .dispatcher
                .tools()
                .list_tools()
                .into_iter()
                .map(str::to_string)
                .collect(),
            overall,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::ResponseSource;
    use mock_provider::EchoProvider;

    fn orchestrator() -> Orchestrator {
        let mut providers = ProviderRegistry::new();
        providers.register(Arc::new(EchoProvider::local("ollama")));
        Orchestrator::new(
            OrchestratorConfig::default(),
            Arc::new(providers),
            Arc::new(ToolRegistry::new()),
        )
        .unwrap()
    }

    #[test]
    fn test_unknown_default_agent_rejected() {
        let result = Orchestrator::new(
            OrchestratorConfig::default().with_default_agent("nobody"),
            Arc::new(ProviderRegistry::new()),
            Arc::new(ToolRegistry::new()),
        );
        assert!(matches!(result, Err(OrchestratorError::Configuration(_))));
    }

    #[tokio::test]
    async fn test_empty_input_rejected() {
        let orchestrator = orchestrator();
        assert!(matches!(
            orchestrator.process_message("   ", "s1", None).await,
            Err(OrchestratorError::EmptyMessage)
        ));
        assert!(matches!(
            orchestrator.process_message("hello", " ", None).await,
            Err(OrchestratorError::InvalidSession)
        ));
        assert_eq!(orchestrator.session_count().await, 0);
    }

    #[tokio::test]
    async fn test_llm_round_trip() {
        let orchestrator = orchestrator();
        let reply = orchestrator
            .process_message("I need marketing advice", "s1", Some("user-1"))
            .await
            .unwrap();

        assert_eq!(reply.agent_id, "marketing");
        assert_eq!(reply.agent_name, "Marketing Strategist");
        assert_eq!(reply.source, ResponseSource::Llm);
        assert_eq!(reply.provider_id.as_deref(), Some("ollama"));

        let session = orchestrator.session("s1").await.unwrap();
        assert_eq!(session.user_id.as_deref(), Some("user-1"));
        assert_eq!(session.messages[1].id, reply.message_id);
        assert_eq!(orchestrator.agent_stats("marketing").await.calls, 1);
    }

    #[tokio::test]
    async fn test_configure_unknown_provider() {
        let orchestrator = orchestrator();
        let result = orchestrator
            .configure_agent("sales", AgentConfigUpdate::default().provider("nowhere"))
            .await;
        assert!(matches!(result, Err(OrchestratorError::UnknownProvider(_))));

        let summary = orchestrator
            .configure_agent("sales", AgentConfigUpdate::default().provider("ollama"))
            .await
            .unwrap();
        assert_eq!(summary.preferred_provider.as_deref(), Some("ollama"));
    }

    #[tokio::test]
    async fn test_create_agent_unknown_template() {
        let orchestrator = orchestrator();
        let result = orchestrator.create_agent("astrology").await;
        assert!(matches!(result, Err(OrchestratorError::UnknownTemplate(_))));
    }

    #[tokio::test]
    async fn test_diagnostics_healthy_then_degraded() {
        let orchestrator = orchestrator();
        let report = orchestrator.perform_system_diagnostics().await;
        assert_eq!(report.overall, OverallHealth::Healthy);
        assert_eq!(report.best_provider.as_deref(), Some("ollama"));
        assert_eq!(report.agents.len(), 5);

        orchestrator
            .configure_agent(
                "technical",
                AgentConfigUpdate::default().status(AgentStatus::Maintenance),
            )
            .await
            .unwrap();
        let report = orchestrator.perform_system_diagnostics().await;
        assert_eq!(report.overall, OverallHealth::Degraded);
    }
}
