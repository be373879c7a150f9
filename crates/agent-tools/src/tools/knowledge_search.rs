//! Knowledge base search tool.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::error::ToolError;
use crate::knowledge::{tokenize, KnowledgeBase};
use crate::tool::{Tool, ToolArgs, ToolOutput};

/// Default number of entries returned.
const DEFAULT_LIMIT: usize = 3;

/// Words that make a message look like a question for the knowledge base.
const TRIGGER_WORDS: &[&str] = &[
    "service", "services", "pricing", "price", "prices", "cost", "costs", "package",
    "packages", "plan", "plans", "faq", "hours", "contact", "process", "seo", "offer",
];

/// Searches the knowledge base for entries relevant to the message.
///
/// # Parameters
///
/// - `query` (required): Free-text query.
/// - `limit` (optional, default: 3): Maximum entries returned.
pub struct KnowledgeSearch {
    knowledge: Arc<KnowledgeBase>,
}

impl KnowledgeSearch {
    /// Create a search tool over the given knowledge base.
    pub fn new(knowledge: Arc<KnowledgeBase>) -> Self {
        Self { knowledge }
    }

    /// The searched knowledge base.
    pub fn knowledge(&self) -> &KnowledgeBase {
        &self.knowledge
    }
}

impl Default for KnowledgeSearch {
    fn default() -> Self {
        Self::new(Arc::new(KnowledgeBase::default_corpus()))
    }
}

#[async_trait]
impl Tool for KnowledgeSearch {
    fn name(&self) -> &str {
        "knowledge_search"
    }

    fn description(&self) -> &str {
        "Searches the company knowledge base for services, pricing, process, \
         contact details and support hours."
    }

    fn trigger(&self, text: &str) -> Option<ToolArgs> {
        tokenize(text)
            .iter()
            .any(|token| TRIGGER_WORDS.contains(&token.as_str()))
            .then(|| ToolArgs::single("query", text))
    }

    async fn execute(&self, args: ToolArgs) -> Result<ToolOutput, ToolError> {
        let query = args.get_string("query")?;
        let limit = match args.get_number_opt("limit")? {
            Some(n) if n >= 1.0 => n as usize,
            Some(_) => {
                return Err(ToolError::InvalidParameter {
                    name: "limit".to_string(),
                    reason: "must be at least 1".to_string(),
                })
            }
            None => DEFAULT_LIMIT,
        };

        let hits = self.knowledge.search(&query, limit);
        debug!("Knowledge search '{}' matched {} entries", query, hits.len());

        if hits.is_empty() {
            return Ok(ToolOutput::failure("No matching knowledge base entries"));
        }

        let content = hits
            .iter()
            .map(|hit| format!("- {}: {}", hit.entry.topic, hit.entry.content))
            .collect::<Vec<_>>()
            .join("\n");

        Ok(ToolOutput::success(content))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trigger() {
        let tool = KnowledgeSearch::default();
        assert!(tool.trigger("What does your pricing look like?").is_some());
        assert!(tool.trigger("Tell me about SEO").is_some());
        assert!(tool.trigger("hello there").is_none());
    }

    #[tokio::test]
    async fn test_execute_returns_best_entry_first() {
        let tool = KnowledgeSearch::default();
        let output = tool
            .execute(ToolArgs::single("query", "what are your support hours"))
            .await
            .unwrap();

        assert!(output.success);
        assert!(output.content.starts_with("- Support hours:"));
    }

    #[tokio::test]
    async fn test_no_hits_is_unsuccessful() {
        let tool = KnowledgeSearch::default();
        let output = tool
            .execute(ToolArgs::single("query", "volcanic geology"))
            .await
            .unwrap();
        assert!(!output.success);
    }

    #[tokio::test]
    async fn test_invalid_limit() {
        let tool = KnowledgeSearch::default();
        let args = ToolArgs::single("query", "pricing").with("limit", serde_json::json!(0));
        assert!(matches!(
            tool.execute(args).await,
            Err(ToolError::InvalidParameter { .. })
        ));
    }
}
