//! Keyword router that picks the agent for a message.
//!
//! Routing is a pure function of the text and the agents handed in, so the
//! same message against an unchanged registry always lands on the same agent.

use serde::Serialize;
use tracing::debug;

use crate::registry::Agent;

/// Points for each specialty found in the text.
pub const SPECIALTY_WEIGHT: u32 = 2;
/// Points for each keyword found in the text.
pub const KEYWORD_WEIGHT: u32 = 1;
/// Minimum score an agent needs to be picked over the default.
pub const DEFAULT_ROUTING_THRESHOLD: u32 = 1;
/// Confidence reported when the default agent takes the message.
pub const DEFAULT_CONFIDENCE: f32 = 0.3;

/// Outcome of routing one message.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteDecision {
    pub agent_id: String,
    pub score: u32,
    pub confidence: f32,
    /// Specialties and keywords that contributed to the score.
    pub matched: Vec<String>,
    /// True when no agent reached the threshold.
    pub defaulted: bool,
}

/// Scores active agents against message text.
#[derive(Debug, Clone)]
pub struct Router {
    default_agent: String,
    threshold: u32,
}

impl Router {
    pub fn new(default_agent: impl Into<String>, threshold: u32) -> Self {
        Self {
            default_agent: default_agent.into(),
            threshold,
        }
    }

    pub fn default_agent(&self) -> &str {
        &self.default_agent
    }

    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    /// Pick an agent for `text`.
    ///
    /// The highest score wins and ties go to the agent that comes first in
    /// `agents`. Below the threshold the default agent is returned whatever
    /// its status.
    pub fn route<'a>(&self, text: &str, agents: impl IntoIterator<Item = &'a Agent>) -> RouteDecision {
        let lowered = text.to_lowercase();
        let mut best: Option<(&Agent, u32, Vec<String>)> = None;

        for agent in agents.into_iter().filter(|a| a.is_active()) {
            let (score, matched) = score(agent, &lowered);
            debug!("Route score {} -> {}", agent.id, score);
            let better = match &best {
                Some((_, best_score, _)) => score > *best_score,
                None => true,
            };
            if better {
                best = Some((agent, score, matched));
            }
        }

        match best {
            Some((agent, score, matched)) if score >= self.threshold && score > 0 => {
                RouteDecision {
                    agent_id: agent.id.clone(),
                    score,
                    confidence: matched_confidence(score),
                    matched,
                    defaulted: false,
                }
            }
            _ => RouteDecision {
                agent_id: self.default_agent.clone(),
                score: 0,
                confidence: DEFAULT_CONFIDENCE,
                matched: Vec::new(),
                defaulted: true,
            },
        }
    }
}

fn score(agent: &Agent, lowered: &str) -> (u32, Vec<String>) {
    let mut total = 0;
    let mut matched = Vec::new();

    for specialty in agent.specialties() {
        if contains_term(lowered, specialty) {
            total += SPECIALTY_WEIGHT;
            matched.push(specialty.clone());
        }
    }
    for keyword in agent.keywords() {
        if contains_term(lowered, keyword) {
            total += KEYWORD_WEIGHT;
            matched.push(keyword.clone());
        }
    }

    (total, matched)
}

fn contains_term(lowered: &str, term: &str) -> bool {
    let term = term.trim();
    !term.is_empty() && lowered.contains(&term.to_lowercase())
}

/// `min(0.95, 0.5 + 0.1 * score)`
fn matched_confidence(score: u32) -> f32 {
    (0.5 + 0.1 * score as f32).min(0.95)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{AgentConfigUpdate, AgentRegistry, AgentStatus, CollisionPolicy};
    use crate::template::{AgentTemplate, TemplateCatalog};
    use std::sync::Arc;

    fn builtin_agents() -> AgentRegistry {
        let mut registry = AgentRegistry::new(CollisionPolicy::Replace);
        for template in TemplateCatalog::with_builtins().templates() {
            let id = template.id.clone();
            registry.create(template, &id).unwrap();
        }
        registry
    }

    #[test]
    fn test_routes_by_specialty() {
        let agents = builtin_agents();
        let decision = Router::new("general", 1).route("I need marketing advice", agents.iter());

        assert_eq!(decision.agent_id, "marketing");
        assert_eq!(decision.score, 2);
        assert!((decision.confidence - 0.7).abs() < 1e-6);
        assert_eq!(decision.matched, vec!["marketing"]);
        assert!(!decision.defaulted);
    }

    #[test]
    fn test_case_insensitive_and_additive() {
        let agents = builtin_agents();
        let decision = Router::new("general", 1)
            .route("Our WEBSITE hosting has an SSL bug", agents.iter());

        assert_eq!(decision.agent_id, "technical");
        assert_eq!(decision.score, 4);
    }

    #[test]
    fn test_defaults_below_threshold() {
        let agents = builtin_agents();
        let router = Router::new("general", 1);

        let decision = router.route("xyzzy", agents.iter());
        assert_eq!(decision.agent_id, "general");
        assert!(decision.defaulted);
        assert!((decision.confidence - DEFAULT_CONFIDENCE).abs() < 1e-6);

        // One keyword is not enough when the bar is higher.
        let strict = Router::new("general", 3);
        assert!(strict.route("my login fails", agents.iter()).defaulted);
    }

    #[test]
    fn test_tie_goes_to_first_registered() {
        let mut agents = AgentRegistry::new(CollisionPolicy::Replace);
        for id in ["alpha", "beta"] {
            let template = AgentTemplate::new(id, id, "prompt").with_specialties(&["widgets"]);
            agents.create(Arc::new(template), id).unwrap();
        }

        let router = Router::new("alpha", 1);
        for _ in 0..3 {
            assert_eq!(router.route("widgets please", agents.iter()).agent_id, "alpha");
        }
    }

    #[test]
    fn test_inactive_agents_are_skipped() {
        let mut agents = builtin_agents();
        agents
            .configure("marketing", AgentConfigUpdate::default().status(AgentStatus::Paused))
            .unwrap();

        let decision = Router::new("general", 1).route("marketing plan", agents.iter());
        // "plan" is a sales keyword.
        assert_eq!(decision.agent_id, "sales");
    }

    #[test]
    fn test_confidence_caps() {
        assert!((matched_confidence(1) - 0.6).abs() < 1e-6);
        assert!((matched_confidence(10) - 0.95).abs() < 1e-6);
    }
}
