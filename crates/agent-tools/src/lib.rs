//! Tool registry, built-in tools and knowledge base for Switchboard agents.
//!
//! This crate provides a `ToolRegistry` for registering and executing tools
//! that agents can use to augment their responses. Tools are external
//! capabilities (calculator, knowledge search, web fetch) that take input
//! and return output.
//!
//! # Architecture
//!
//! Each [`Tool`] decides from the message text whether it applies
//! ([`Tool::trigger`]) and derives its own arguments. The registry's
//! [`ToolRegistry::detect`] collects the triggered tools among an agent's
//! allowed list, and [`ToolRegistry::invoke`] runs one under the registry
//! timeout. A failing tool never affects the others.
//!
//! # Built-in Tools
//!
//! - [`Calculator`] - Safe mathematical expression evaluation using `meval`.
//! - [`KnowledgeSearch`] - Weighted keyword search over a [`KnowledgeBase`].
//! - [`CurrentTime`] - Current date and time.
//! - [`WebFetch`] - Fetch URL content, convert HTML to text, with SSRF protection.
//!
//! # Example
//!
//! ```rust,ignore
//! use agent_tools::default_registry;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), agent_tools::ToolError> {
//!     let registry = default_registry()?;
//!
//!     for invocation in registry.detect("what is 2 + 2 * 3?", &["calculator"]) {
//!         let output = registry.invoke(&invocation).await?;
//!         println!("{}", output.content); // "2 + 2 * 3 = 8"
//!     }
//!     Ok(())
//! }
//! ```

mod error;
mod knowledge;
mod registry;
mod tool;
pub mod tools;

pub use error::ToolError;
pub use knowledge::{tokenize, KnowledgeBase, KnowledgeEntry, KnowledgeHit};
pub use registry::{ToolRegistry, DEFAULT_TOOL_TIMEOUT};
pub use tool::{Tool, ToolArgs, ToolInvocation, ToolOutput};
pub use tools::{Calculator, CurrentTime, KnowledgeSearch, WebFetch};

// Re-export async_trait for convenience
pub use async_trait::async_trait;

/// Create a new registry with all built-in tools registered.
///
/// The knowledge search tool uses the built-in corpus.
pub fn default_registry() -> Result<ToolRegistry, ToolError> {
    let mut registry = ToolRegistry::new();

    registry.register(Calculator::new());
    registry.register(KnowledgeSearch::default());
    registry.register(CurrentTime::new());
    registry.register(WebFetch::new()?);

    Ok(registry)
}
