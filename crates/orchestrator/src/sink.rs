//! Transcript sinks: optional outbound copies of stored messages.
//!
//! The orchestrator writes each new message pair to its sink after storing it
//! in memory. Sink errors are logged and never change the response.

use async_trait::async_trait;
use tracing::info;

use crate::error::OrchestratorError;
use crate::message::Message;

/// Receives every stored message pair.
///
/// Abstracted to support different backends (databases, queues, tests).
#[async_trait]
pub trait TranscriptSink: Send + Sync {
    /// Record messages appended to a session, in storage order.
    async fn record(&self, session_id: &str, messages: &[Message])
        -> Result<(), OrchestratorError>;
}

/// Sink that drops everything.
#[derive(Debug, Clone, Default)]
pub struct NoOpSink;

#[async_trait]
impl TranscriptSink for NoOpSink {
    async fn record(
        &self,
        _session_id: &str,
        _messages: &[Message],
    ) -> Result<(), OrchestratorError> {
        Ok(())
    }
}

/// Sink that logs each message at info.
#[derive(Debug, Clone, Default)]
pub struct LoggingSink;

#[async_trait]
impl TranscriptSink for LoggingSink {
    async fn record(&self, session_id: &str, messages: &[Message]) -> Result<(), OrchestratorError> {
        for message in messages {
            info!(
                "[transcript {}] {:?} {}: {}",
                session_id,
                message.role,
                message.agent_id.as_deref().unwrap_or("user"),
                message.content
            );
        }
        Ok(())
    }
}
