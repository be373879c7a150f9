//! The one dispatch path every agent goes through.
//!
//! Agents differ only in their data. A request moves through
//! `Routed -> AttemptingLlm -> {Succeeded | ExhaustedProviders} ->
//! ToolAugmentation -> Returned`, and every phase is logged at debug.

use std::fmt;
use std::sync::Arc;

use agent_tools::ToolRegistry;
use llm_providers::{ChainOutcome, ProviderRegistry};
use provider_core::GenerateRequest;
use tracing::{debug, warn};

use crate::fallback::fallback_response;
use crate::message::{Message, ResponseSource};
use crate::prompt::build_messages;
use crate::registry::Agent;

/// Confidence multiplier for canned replies.
const FALLBACK_CONFIDENCE_FACTOR: f32 = 0.6;
/// Confidence bonus when tools contributed to a model reply.
const TOOL_CONFIDENCE_BONUS: f32 = 0.1;

/// Per-request phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchPhase {
    Routed,
    AttemptingLlm,
    Succeeded,
    ExhaustedProviders,
    ToolAugmentation,
    Returned,
}

impl fmt::Display for DispatchPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Routed => "routed",
            Self::AttemptingLlm => "attempting_llm",
            Self::Succeeded => "succeeded",
            Self::ExhaustedProviders => "exhausted_providers",
            Self::ToolAugmentation => "tool_augmentation",
            Self::Returned => "returned",
        })
    }
}

/// Everything one dispatch needs, owned so it can move into a task.
#[derive(Debug, Clone)]
pub struct DispatchRequest {
    pub session_id: String,
    pub agent: Agent,
    pub text: String,
    /// Recent session messages, oldest first.
    pub history: Vec<Message>,
    pub route_confidence: f32,
}

/// What an agent produced for one message.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentReply {
    pub content: String,
    pub confidence: f32,
    pub source: ResponseSource,
    pub provider_id: Option<String>,
    pub model: Option<String>,
    pub tools_used: Vec<String>,
    /// Set when the provider chain ran and every provider failed.
    pub exhausted: bool,
}

impl AgentReply {
    /// Canned reply from the agent's template.
    pub fn fallback(agent: &Agent, text: &str, route_confidence: f32) -> Self {
        Self {
            content: fallback_response(&agent.template, text).to_string(),
            confidence: route_confidence * FALLBACK_CONFIDENCE_FACTOR,
            source: ResponseSource::Fallback,
            provider_id: None,
            model: None,
            tools_used: Vec::new(),
            exhausted: false,
        }
    }
}

/// Runs agents against the shared provider and tool registries.
#[derive(Clone)]
pub struct Dispatcher {
    providers: Arc<ProviderRegistry>,
    tools: Arc<ToolRegistry>,
}

impl Dispatcher {
    pub fn new(providers: Arc<ProviderRegistry>, tools: Arc<ToolRegistry>) -> Self {
        Self { providers, tools }
    }

    pub fn providers(&self) -> &Arc<ProviderRegistry> {
        &self.providers
    }

    pub fn tools(&self) -> &Arc<ToolRegistry> {
        &self.tools
    }

    /// Produce the agent's reply. Never fails; every error degrades.
    pub async fn dispatch(&self, request: DispatchRequest) -> AgentReply {
        let DispatchRequest {
            session_id,
            agent,
            text,
            history,
            route_confidence,
        } = request;

        phase(&session_id, &agent, DispatchPhase::Routed);

        let mut reply = if agent.config.enable_llm && agent.is_active() {
            self.generate(&session_id, &agent, &text, &history, route_confidence)
                .await
        } else {
            debug!(
                "Agent {} skips providers (llm={}, status={})",
                agent.id, agent.config.enable_llm, agent.config.status
            );
            AgentReply::fallback(&agent, &text, route_confidence)
        };

        phase(&session_id, &agent, DispatchPhase::ToolAugmentation);
        self.augment(&agent, &text, &mut reply).await;

        phase(&session_id, &agent, DispatchPhase::Returned);
        reply
    }

    async fn generate(
        &self,
        session_id: &str,
        agent: &Agent,
        text: &str,
        history: &[Message],
        route_confidence: f32,
    ) -> AgentReply {
        phase(session_id, agent, DispatchPhase::AttemptingLlm);

        let mut request = GenerateRequest::new(build_messages(&agent.template, history, text));
        request.model = agent.config.preferred_model.clone();

        let outcome = self
            .providers
            .generate(request, agent.config.preferred_provider.as_deref())
            .await;

        match outcome {
            ChainOutcome::Completed { generation, .. } => {
                phase(session_id, agent, DispatchPhase::Succeeded);
                AgentReply {
                    content: generation.text,
                    confidence: route_confidence,
                    source: ResponseSource::Llm,
                    provider_id: Some(generation.provider_id),
                    model: Some(generation.model),
                    tools_used: Vec::new(),
                    exhausted: false,
                }
            }
            exhausted @ ChainOutcome::Exhausted { .. } => {
                phase(session_id, agent, DispatchPhase::ExhaustedProviders);
                warn!(
                    "Agent {} falling back after provider failures: {}",
                    agent.id,
                    exhausted.summary()
                );
                AgentReply {
                    exhausted: true,
                    ..AgentReply::fallback(agent, text, route_confidence)
                }
            }
        }
    }

    /// Run the agent's triggered tools and append what they return.
    ///
    /// Each tool is bounded by the tool registry's timeout.
    async fn augment(&self, agent: &Agent, text: &str, reply: &mut AgentReply) {
        let invocations = self.tools.detect(text, agent.tools());
        if invocations.is_empty() {
            return;
        }

        let mut sections = Vec::new();
        for invocation in &invocations {
            match self.tools.invoke(invocation).await {
                Ok(output) if output.success && !output.content.trim().is_empty() => {
                    sections.push(format!("[{}]\n{}", invocation.name, output.content.trim()));
                    reply.tools_used.push(invocation.name.clone());
                }
                Ok(output) => {
                    debug!(
                        "Tool {} returned nothing usable: {}",
                        invocation.name, output.content
                    );
                }
                Err(e) => warn!("Tool {} failed: {}", invocation.name, e),
            }
        }

        if sections.is_empty() {
            return;
        }

        reply.content = format!("{}\n\n{}", reply.content.trim_end(), sections.join("\n\n"));
        if reply.source == ResponseSource::Llm {
            reply.source = ResponseSource::ToolAugmented;
            reply.confidence = (reply.confidence + TOOL_CONFIDENCE_BONUS).min(1.0);
        }
    }
}

fn phase(session_id: &str, agent: &Agent, phase: DispatchPhase) {
    debug!(session = %session_id, agent = %agent.id, "Dispatch phase: {}", phase);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::registry::{AgentConfigUpdate, AgentRegistry, CollisionPolicy};
    use crate::template::TemplateCatalog;
    use agent_tools::{async_trait, KnowledgeSearch, Tool, ToolArgs, ToolError, ToolOutput};
    use mock_provider::{EchoProvider, FailingProvider};
    use provider_core::Provider;

    struct BrokenTool;

    #[async_trait]
    impl Tool for BrokenTool {
        fn name(&self) -> &str {
            "broken"
        }

        fn description(&self) -> &str {
            "Always fails"
        }

        fn trigger(&self, _text: &str) -> Option<ToolArgs> {
            Some(ToolArgs::default())
        }

        async fn execute(&self, _args: ToolArgs) -> Result<ToolOutput, ToolError> {
            Err(ToolError::ExecutionFailed("garbage".to_string()))
        }
    }

    struct SlowTool;

    #[async_trait]
    impl Tool for SlowTool {
        fn name(&self) -> &str {
            "slow"
        }

        fn description(&self) -> &str {
            "Takes half a minute"
        }

        fn trigger(&self, _text: &str) -> Option<ToolArgs> {
            Some(ToolArgs::default())
        }

        async fn execute(&self, _args: ToolArgs) -> Result<ToolOutput, ToolError> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(ToolOutput::success("late"))
        }
    }

    fn agent(id: &str) -> Agent {
        let mut registry = AgentRegistry::new(CollisionPolicy::Replace);
        let template = TemplateCatalog::with_builtins().get(id).unwrap();
        registry.create(template, id).unwrap().clone()
    }

    fn dispatcher(providers: Vec<Arc<dyn Provider>>) -> Dispatcher {
        let mut registry = ProviderRegistry::new();
        for provider in providers {
            registry.register(provider);
        }
        let mut tools = ToolRegistry::new();
        tools.register(KnowledgeSearch::default());
        tools.register(BrokenTool);
        tools.register(SlowTool);
        Dispatcher::new(
            Arc::new(registry),
            Arc::new(tools.with_timeout(Duration::from_secs(1))),
        )
    }

    fn request(agent: Agent, text: &str) -> DispatchRequest {
        DispatchRequest {
            session_id: "s1".to_string(),
            agent,
            text: text.to_string(),
            history: Vec::new(),
            route_confidence: 0.7,
        }
    }

    #[tokio::test]
    async fn test_llm_reply() {
        let dispatcher = dispatcher(vec![Arc::new(EchoProvider::local("ollama")) as Arc<dyn Provider>]);
        let reply = dispatcher
            .dispatch(request(agent("marketing"), "I need marketing advice"))
            .await;

        assert_eq!(reply.source, ResponseSource::Llm);
        assert_eq!(reply.content, "I need marketing advice");
        assert_eq!(reply.provider_id.as_deref(), Some("ollama"));
        assert!((reply.confidence - 0.7).abs() < 1e-6);
        assert!(!reply.exhausted);
    }

    #[tokio::test]
    async fn test_exhausted_chain_falls_back() {
        let dispatcher = dispatcher(vec![
            Arc::new(FailingProvider::local("ollama")) as Arc<dyn Provider>,
            Arc::new(FailingProvider::remote("openai")) as Arc<dyn Provider>,
        ]);
        let marketing = agent("marketing");
        let reply = dispatcher
            .dispatch(request(marketing.clone(), "I need marketing advice"))
            .await;

        assert_eq!(reply.source, ResponseSource::Fallback);
        assert_eq!(reply.content, marketing.template.default_fallback);
        assert!(reply.exhausted);
        assert!((reply.confidence - 0.42).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_llm_disabled_skips_providers() {
        let echo = Arc::new(EchoProvider::local("ollama"));
        let dispatcher = dispatcher(vec![echo.clone() as Arc<dyn Provider>]);

        let mut registry = AgentRegistry::new(CollisionPolicy::Replace);
        let template = TemplateCatalog::with_builtins().get("support").unwrap();
        registry.create(template, "support").unwrap();
        let support = registry
            .configure("support", AgentConfigUpdate::default().llm(false))
            .unwrap()
            .clone();

        let reply = dispatcher.dispatch(request(support, "my login is broken")).await;
        assert_eq!(reply.source, ResponseSource::Fallback);
        assert!(!reply.exhausted);
        assert_eq!(echo.counts().generates(), 0);
        assert_eq!(echo.counts().probes(), 0);
    }

    #[tokio::test]
    async fn test_tool_augmentation() {
        let dispatcher = dispatcher(vec![Arc::new(EchoProvider::local("ollama")) as Arc<dyn Provider>]);
        let reply = dispatcher
            .dispatch(request(agent("sales"), "What does your pricing look like?"))
            .await;

        assert_eq!(reply.source, ResponseSource::ToolAugmented);
        assert_eq!(reply.tools_used, vec!["knowledge_search"]);
        assert!(reply.content.contains("[knowledge_search]"));
        assert!((reply.confidence - 0.8).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_failing_tool_is_omitted() {
        let dispatcher = dispatcher(vec![Arc::new(EchoProvider::local("ollama")) as Arc<dyn Provider>]);
        let mut broken = agent("general");
        broken.template = Arc::new(
            (*broken.template)
                .clone()
                .with_tools(&["broken", "missing"]),
        );

        let reply = dispatcher.dispatch(request(broken, "hello there")).await;
        assert_eq!(reply.source, ResponseSource::Llm);
        assert_eq!(reply.content, "hello there");
        assert!(reply.tools_used.is_empty());
        assert!(!reply.content.contains("garbage"));
    }

    #[tokio::test]
    async fn test_fallback_keeps_source_with_tools() {
        let dispatcher = dispatcher(vec![Arc::new(FailingProvider::local("ollama")) as Arc<dyn Provider>]);
        let reply = dispatcher
            .dispatch(request(agent("sales"), "How much do your packages cost?"))
            .await;

        assert_eq!(reply.source, ResponseSource::Fallback);
        assert_eq!(reply.tools_used, vec!["knowledge_search"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_tool_bounded_by_registry_timeout() {
        let dispatcher = dispatcher(vec![Arc::new(EchoProvider::local("ollama")) as Arc<dyn Provider>]);
        let mut slow = agent("general");
        slow.template = Arc::new((*slow.template).clone().with_tools(&["slow"]));

        let started = tokio::time::Instant::now();
        let reply = dispatcher.dispatch(request(slow, "hello there")).await;

        assert_eq!(reply.source, ResponseSource::Llm);
        assert!(reply.tools_used.is_empty());
        assert!(started.elapsed() < Duration::from_secs(2));
    }
}
