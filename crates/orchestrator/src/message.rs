//! Stored session messages and the response returned to callers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Who wrote a stored message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Agent,
}

/// Where an agent response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseSource {
    /// A language-model provider produced the text.
    Llm,
    /// Every provider failed or the agent has LLM disabled; canned text.
    Fallback,
    /// Provider text with tool output appended.
    ToolAugmented,
}

impl ResponseSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Llm => "llm",
            Self::Fallback => "fallback",
            Self::ToolAugmented => "tool_augmented",
        }
    }
}

impl std::fmt::Display for ResponseSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Details attached to agent messages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageMetadata {
    pub source: ResponseSource,
    pub processing_time_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools_used: Vec<String>,
}

/// One stored message in a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub role: MessageRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    /// Set on agent messages only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<String>,
    /// Set on agent messages only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,
    /// Set on agent messages only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<MessageMetadata>,
}

impl Message {
    /// A message from the user.
    pub fn user(content: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role: MessageRole::User,
            content: content.into(),
            timestamp,
            agent_id: None,
            confidence: None,
            metadata: None,
        }
    }

    /// A response from an agent.
    pub fn agent(
        agent_id: impl Into<String>,
        content: impl Into<String>,
        timestamp: DateTime<Utc>,
        confidence: f32,
        metadata: MessageMetadata,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            role: MessageRole::Agent,
            content: content.into(),
            timestamp,
            agent_id: Some(agent_id.into()),
            confidence: Some(confidence),
            metadata: Some(metadata),
        }
    }

    pub fn is_user(&self) -> bool {
        self.role == MessageRole::User
    }
}

/// The response returned by [`crate::Orchestrator::process_message`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentMessage {
    /// Id of the stored agent message.
    pub message_id: Uuid,
    pub session_id: String,
    pub agent_id: String,
    pub agent_name: String,
    pub content: String,
    pub confidence: f32,
    pub source: ResponseSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default)]
    pub tools_used: Vec<String>,
    pub processing_time_ms: u64,
    pub timestamp: DateTime<Utc>,
}
