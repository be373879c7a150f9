//! Tool trait definition and types.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ToolError;

/// Arguments passed to a tool for execution.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolArgs {
    /// Parameters as key-value pairs.
    pub params: HashMap<String, Value>,
}

impl ToolArgs {
    /// Create new tool arguments with the given parameters.
    pub fn new(params: HashMap<String, Value>) -> Self {
        Self { params }
    }

    /// Create tool arguments holding one string parameter.
    pub fn single(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::default().with(key, Value::String(value.into()))
    }

    /// Add a parameter.
    pub fn with(mut self, key: impl Into<String>, value: Value) -> Self {
        self.params.insert(key.into(), value);
        self
    }

    /// Get a string parameter, returning an error if missing or not a string.
    pub fn get_string(&self, key: &str) -> Result<String, ToolError> {
        self.params
            .get(key)
            .ok_or_else(|| ToolError::MissingParameter(key.to_string()))?
            .as_str()
            .map(|s| s.to_string())
            .ok_or_else(|| ToolError::InvalidParameter {
                name: key.to_string(),
                reason: "expected string".to_string(),
            })
    }

    /// Get an optional f64 parameter.
    pub fn get_number_opt(&self, key: &str) -> Result<Option<f64>, ToolError> {
        match self.params.get(key) {
            Some(v) => {
                let num = v.as_f64().ok_or_else(|| ToolError::InvalidParameter {
                    name: key.to_string(),
                    reason: "expected number".to_string(),
                })?;
                Ok(Some(num))
            }
            None => Ok(None),
        }
    }
}

/// Output from a tool execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolOutput {
    /// The result content (text or JSON).
    pub content: String,
    /// Whether the execution produced something worth showing.
    pub success: bool,
}

impl ToolOutput {
    /// Create a successful output.
    pub fn success(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            success: true,
        }
    }

    /// Create a failed output.
    pub fn failure(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            success: false,
        }
    }
}

/// A tool triggered by a message, with the arguments derived from it.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolInvocation {
    /// Registered tool name.
    pub name: String,
    /// Arguments extracted from the message.
    pub args: ToolArgs,
}

/// Trait for tools that agents can invoke.
///
/// Tools are external capabilities (calculator, knowledge search, web fetch)
/// that take input parameters and return output. A tool decides from the
/// message text whether it applies via [`Tool::trigger`].
#[async_trait]
pub trait Tool: Send + Sync {
    /// The tool's unique name (used for dispatch).
    fn name(&self) -> &str;

    /// Human-readable description of what the tool does.
    fn description(&self) -> &str;

    /// Arguments for this tool if the message calls for it.
    fn trigger(&self, _text: &str) -> Option<ToolArgs> {
        None
    }

    /// Execute the tool with the given arguments.
    async fn execute(&self, args: ToolArgs) -> Result<ToolOutput, ToolError>;
}
