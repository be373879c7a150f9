//! Agent orchestration for Switchboard.
//!
//! This crate provides the [`Orchestrator`] type, which turns a free-text
//! message and a session id into a reply from one of several specialised
//! agents.
//!
//! # Features
//!
//! - Deterministic keyword routing with a default agent
//! - One shared dispatch path for every agent, driven by template data
//! - Provider failover through [`llm_providers::ProviderRegistry`]
//! - Canned fallback replies when every provider fails
//! - Tool augmentation from [`agent_tools::ToolRegistry`]
//! - Append-only sessions, per-agent statistics and system diagnostics
//!
//! # Architecture
//!
//! ```text
//! process_message(text, session_id, user_id)
//!          ↓
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      ORCHESTRATOR                           │
//! │                                                             │
//! │  1. Validate input, look up or create the session           │
//! │         ↓                                                   │
//! │  2. Route: +2 per specialty, +1 per keyword                 │
//! │         ↓                                                   │
//! │  3. Dispatch (spawned, bounded by request_timeout):         │
//! │     • provider chain → llm                                  │
//! │     • chain exhausted / llm disabled → fallback             │
//! │     • triggered tools → tool_augmented                      │
//! │         ↓                                                   │
//! │  4. Append user + agent messages to the session             │
//! │         ↓                                                   │
//! │  5. Update stats, write to the transcript sink              │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use orchestrator::Orchestrator;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let orchestrator = Orchestrator::from_env()?;
//!
//!     let reply = orchestrator
//!         .process_message("I need marketing advice", "session-1", None)
//!         .await?;
//!
//!     println!("{} ({}): {}", reply.agent_name, reply.source, reply.content);
//!     Ok(())
//! }
//! ```

mod config;
mod diagnostics;
mod dispatch;
mod error;
mod fallback;
mod message;
mod orchestrator;
mod prompt;
mod registry;
mod router;
mod session;
mod sink;
mod stats;
mod template;

pub use config::OrchestratorConfig;
pub use diagnostics::{AgentHealth, OverallHealth, SystemDiagnostics};
pub use dispatch::{AgentReply, DispatchPhase, DispatchRequest, Dispatcher};
pub use error::OrchestratorError;
pub use fallback::{fallback_response, GENERIC_FALLBACK};
pub use message::{AgentMessage, Message, MessageMetadata, MessageRole, ResponseSource};
pub use orchestrator::Orchestrator;
pub use prompt::{build_messages, system_prompt};
pub use registry::{
    Agent, AgentConfig, AgentConfigUpdate, AgentRegistry, AgentStatus, AgentSummary,
    CollisionPolicy,
};
pub use router::{RouteDecision, Router, DEFAULT_ROUTING_THRESHOLD};
pub use session::{Session, SessionSnapshot, SessionStore};
pub use sink::{LoggingSink, NoOpSink, TranscriptSink};
pub use stats::{AgentStats, StatsTracker};
pub use template::{builtin_templates, AgentTemplate, FallbackRule, TemplateCatalog};

// Re-export provider and tool types for convenience
pub use agent_tools::ToolRegistry;
pub use llm_providers::{ProviderRegistry, ProviderStatus};
