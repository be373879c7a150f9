//! Agent templates: the static descriptors agents are built from.

use std::sync::Arc;

use indexmap::IndexMap;
use provider_core::hash_prompt;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Canned reply chosen when a message mentions any of the keywords.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FallbackRule {
    pub keywords: Vec<String>,
    pub response: String,
}

impl FallbackRule {
    pub fn new(keywords: &[&str], response: impl Into<String>) -> Self {
        Self {
            keywords: keywords.iter().map(|k| k.to_lowercase()).collect(),
            response: response.into(),
        }
    }
}

/// Static description of an agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentTemplate {
    pub id: String,
    pub name: String,
    pub description: String,
    /// Worth 2 routing points each.
    pub specialties: Vec<String>,
    /// Worth 1 routing point each.
    pub keywords: Vec<String>,
    /// Tool names in the order they are tried.
    pub tools: Vec<String>,
    pub default_provider: Option<String>,
    pub default_model: Option<String>,
    pub enable_llm: bool,
    pub system_prompt: String,
    pub fallback_responses: Vec<FallbackRule>,
    pub default_fallback: String,
}

fn owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl AgentTemplate {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        system_prompt: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            specialties: Vec::new(),
            keywords: Vec::new(),
            tools: Vec::new(),
            default_provider: None,
            default_model: None,
            enable_llm: true,
            system_prompt: system_prompt.into(),
            fallback_responses: Vec::new(),
            default_fallback: String::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_specialties(mut self, specialties: &[&str]) -> Self {
        self.specialties = owned(specialties);
        self
    }

    pub fn with_keywords(mut self, keywords: &[&str]) -> Self {
        self.keywords = owned(keywords);
        self
    }

    pub fn with_tools(mut self, tools: &[&str]) -> Self {
        self.tools = owned(tools);
        self
    }

    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.default_provider = Some(provider.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.default_model = Some(model.into());
        self
    }

    pub fn with_llm(mut self, enabled: bool) -> Self {
        self.enable_llm = enabled;
        self
    }

    pub fn with_fallback(mut self, keywords: &[&str], response: impl Into<String>) -> Self {
        self.fallback_responses
            .push(FallbackRule::new(keywords, response));
        self
    }

    pub fn with_default_fallback(mut self, response: impl Into<String>) -> Self {
        self.default_fallback = response.into();
        self
    }

    /// Whether any specialty matches, ignoring case.
    pub fn has_specialty(&self, specialty: &str) -> bool {
        self.specialties
            .iter()
            .any(|s| s.eq_ignore_ascii_case(specialty))
    }
}

/// Templates by id, in registration order.
#[derive(Debug, Default)]
pub struct TemplateCatalog {
    templates: IndexMap<String, Arc<AgentTemplate>>,
}

impl TemplateCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog holding the built-in templates.
    pub fn with_builtins() -> Self {
        let mut catalog = Self::new();
        for template in builtin_templates() {
            catalog.register(template);
        }
        catalog
    }

    /// Add or replace a template. Replacing keeps its position.
    pub fn register(&mut self, template: AgentTemplate) -> Arc<AgentTemplate> {
        info!(
            "Registering template {} (prompt {})",
            template.id,
            &hash_prompt(&template.system_prompt)[..12]
        );
        let template = Arc::new(template);
        self.templates
            .insert(template.id.clone(), Arc::clone(&template));
        template
    }

    pub fn get(&self, id: &str) -> Option<Arc<AgentTemplate>> {
        self.templates.get(id).cloned()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.templates.contains_key(id)
    }

    pub fn ids(&self) -> Vec<&str> {
        self.templates.keys().map(String::as_str).collect()
    }

    pub fn templates(&self) -> Vec<Arc<AgentTemplate>> {
        self.templates.values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

/// The five templates every orchestrator starts with.
pub fn builtin_templates() -> Vec<AgentTemplate> {
    vec![
        AgentTemplate::new(
            "general",
            "General Assistant",
            "You are the front-desk assistant for a digital marketing agency. Answer \
             briefly and point visitors to the right team when a question is specialised.",
        )
        .with_description("Handles greetings and anything no specialist claims")
        .with_specialties(&["general"])
        .with_keywords(&["hello", "information", "question", "company"])
        .with_tools(&["knowledge_search", "current_time", "calculator"])
        .with_fallback(
            &["hello", "hey", "morning"],
            "Hello! Thanks for reaching out. Ask me about our services, pricing or how we work.",
        )
        .with_fallback(
            &["contact", "email", "phone", "call"],
            "You can reach the team at hello@example.com or book a call through our website.",
        )
        .with_default_fallback(
            "Thanks for your message. A team member will follow up shortly, and in the meantime \
             feel free to ask about our services or pricing.",
        ),
        AgentTemplate::new(
            "marketing",
            "Marketing Strategist",
            "You are a marketing strategist. Give practical, concrete advice on campaigns, \
             SEO, content and social media for small businesses.",
        )
        .with_description("Campaign strategy, SEO, content and social media")
        .with_specialties(&["marketing", "seo", "social media", "content", "branding"])
        .with_keywords(&["campaign", "advertising", "audience", "brand", "traffic", "leads"])
        .with_tools(&["knowledge_search", "web_fetch"])
        .with_fallback(
            &["seo", "search", "ranking", "google"],
            "For SEO we usually start with a technical audit and keyword research, then work on \
             on-page fixes and local listings. Results tend to show within three to six months.",
        )
        .with_fallback(
            &["social", "instagram", "facebook", "linkedin"],
            "A steady social media presence starts with two or three channels where your \
             customers already are, a posting calendar and a clear voice.",
        )
        .with_fallback(
            &["campaign", "advertising", "ads", "budget"],
            "Good campaigns start from a clear goal and audience. We can help plan targeting, \
             creative and budget so every dollar is tracked.",
        )
        .with_default_fallback(
            "Happy to help with your marketing. Tell me about your business, your audience and \
             your goals, and I will suggest where to start.",
        ),
        AgentTemplate::new(
            "sales",
            "Sales Advisor",
            "You are a sales advisor. Explain packages and pricing honestly and help the \
             visitor pick the option that fits their budget.",
        )
        .with_description("Packages, pricing and quotes")
        .with_specialties(&["sales", "pricing", "quote"])
        .with_keywords(&["buy", "price", "cost", "package", "purchase", "discount", "plan"])
        .with_tools(&["knowledge_search", "calculator"])
        .with_fallback(
            &["price", "pricing", "cost", "package"],
            "Our Starter package begins at $500 per month and Growth at $1,500 per month. \
             Enterprise plans are quoted per project.",
        )
        .with_fallback(
            &["discount", "deal", "offer"],
            "We offer a discount on annual commitments. Ask for a quote and we will include it.",
        )
        .with_default_fallback(
            "I can walk you through our packages and put together a quote. What are you \
             looking to achieve?",
        ),
        AgentTemplate::new(
            "support",
            "Customer Support",
            "You are a patient customer support agent. Acknowledge the problem, ask for the \
             details you need and give clear next steps.",
        )
        .with_description("Account questions, problems and complaints")
        .with_specialties(&["support", "troubleshooting", "account"])
        .with_keywords(&["problem", "issue", "broken", "refund", "login", "password", "help"])
        .with_tools(&["knowledge_search", "current_time"])
        .with_fallback(
            &["login", "password", "account"],
            "Sorry you are having trouble signing in. Use the reset link on the login page, and \
             if that fails reply with the email on your account.",
        )
        .with_fallback(
            &["refund", "cancel", "billing"],
            "I have noted your billing request. Our accounts team handles refunds and \
             cancellations within two business days.",
        )
        .with_default_fallback(
            "Sorry about the trouble. Support is available Monday to Friday, 9am to 6pm \
             Eastern, and we will get back to you as soon as possible.",
        ),
        AgentTemplate::new(
            "technical",
            "Technical Specialist",
            "You are a web developer. Answer technical questions about websites, hosting and \
             integrations precisely, and say when something needs a closer look.",
        )
        .with_description("Websites, hosting and integrations")
        .with_specialties(&["technical", "web development", "integration"])
        .with_keywords(&["website", "hosting", "server", "dns", "ssl", "plugin", "bug"])
        .with_tools(&["web_fetch", "calculator"])
        .with_fallback(
            &["slow", "speed", "performance"],
            "Slow pages usually come down to image sizes, caching or hosting. We can run a \
             performance audit and send you the findings.",
        )
        .with_fallback(
            &["dns", "domain", "ssl", "certificate"],
            "Domain and certificate changes can take up to 48 hours to propagate. Send us the \
             domain and we will check the records.",
        )
        .with_default_fallback(
            "Thanks for the technical details. An engineer will review this and follow up with \
             next steps.",
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_ids_in_order() {
        let catalog = TemplateCatalog::with_builtins();
        assert_eq!(
            catalog.ids(),
            vec!["general", "marketing", "sales", "support", "technical"]
        );
    }

    #[test]
    fn test_builtins_have_fallbacks() {
        for template in builtin_templates() {
            assert!(!template.default_fallback.is_empty(), "{}", template.id);
            assert!(!template.fallback_responses.is_empty(), "{}", template.id);
            assert!(template.enable_llm);
        }
    }

    #[test]
    fn test_replace_keeps_position() {
        let mut catalog = TemplateCatalog::with_builtins();
        catalog.register(AgentTemplate::new("marketing", "Marketing v2", "prompt"));

        assert_eq!(catalog.len(), 5);
        assert_eq!(catalog.ids()[1], "marketing");
        assert_eq!(catalog.get("marketing").unwrap().name, "Marketing v2");
    }

    #[test]
    fn test_builder() {
        let template = AgentTemplate::new("legal", "Legal", "You review contracts.")
            .with_specialties(&["Contracts"])
            .with_model("llama3.2")
            .with_llm(false)
            .with_fallback(&["NDA"], "We can review your NDA.");

        assert!(template.has_specialty("contracts"));
        assert_eq!(template.default_model.as_deref(), Some("llama3.2"));
        assert!(!template.enable_llm);
        assert_eq!(template.fallback_responses[0].keywords, vec!["nda"]);
    }
}
