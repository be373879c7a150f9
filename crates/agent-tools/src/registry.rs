//! Tool registry for managing and executing tools.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use indexmap::IndexMap;
use serde_json::Value;
use tokio::time::timeout;
use tracing::{debug, info};

use crate::error::ToolError;
use crate::tool::{Tool, ToolArgs, ToolInvocation, ToolOutput};

/// Default bound on one tool execution.
pub const DEFAULT_TOOL_TIMEOUT: Duration = Duration::from_secs(10);

/// Registry for managing tools.
///
/// The registry holds a collection of tools and can dispatch execution
/// requests to the appropriate tool by name. Every execution is bounded by
/// the registry timeout.
pub struct ToolRegistry {
    /// Registered tools by name, in registration order.
    tools: IndexMap<String, Arc<dyn Tool>>,
    timeout: Duration,
}

impl ToolRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            tools: IndexMap::new(),
            timeout: DEFAULT_TOOL_TIMEOUT,
        }
    }

    /// Set the per-execution timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// The per-execution timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Register a tool.
    ///
    /// If a tool with the same name already exists, it will be replaced.
    pub fn register<T: Tool + 'static>(&mut self, tool: T) {
        self.register_arc(Arc::new(tool));
    }

    /// Register a shared tool.
    pub fn register_arc(&mut self, tool: Arc<dyn Tool>) {
        let name = tool.name().to_string();
        info!("Registering tool: {}", name);
        self.tools.insert(name, tool);
    }

    /// Get a list of registered tool names.
    pub fn list_tools(&self) -> Vec<&str> {
        self.tools.keys().map(|s| s.as_str()).collect()
    }

    /// Number of registered tools.
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Whether no tool is registered.
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Get a tool by name.
    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.get(name)
    }

    /// Check if a tool is registered.
    pub fn has_tool(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Tools among `allowed` whose trigger matches the text, in `allowed` order.
    ///
    /// Names that are not registered are skipped.
    pub fn detect<S: AsRef<str>>(&self, text: &str, allowed: &[S]) -> Vec<ToolInvocation> {
        allowed
            .iter()
            .filter_map(|name| {
                let name = name.as_ref();
                let tool = self.tools.get(name)?;
                let args = tool.trigger(text)?;
                debug!("Tool '{}' triggered", name);
                Some(ToolInvocation {
                    name: name.to_string(),
                    args,
                })
            })
            .collect()
    }

    /// Execute a tool by name with the given parameters.
    pub async fn execute(
        &self,
        name: &str,
        params: HashMap<String, Value>,
    ) -> Result<ToolOutput, ToolError> {
        self.execute_args(name, ToolArgs::new(params)).await
    }

    /// Execute a tool by name with prepared arguments, bounded by the timeout.
    pub async fn execute_args(&self, name: &str, args: ToolArgs) -> Result<ToolOutput, ToolError> {
        let tool = self
            .tools
            .get(name)
            .ok_or_else(|| ToolError::NotFound(name.to_string()))?;

        debug!("Executing tool '{}' with {} params", name, args.params.len());

        let result = timeout(self.timeout, tool.execute(args))
            .await
            .map_err(|_| ToolError::Timeout {
                name: name.to_string(),
                after: self.timeout,
            })??;

        debug!(
            "Tool '{}' completed: success={}, content_len={}",
            name,
            result.success,
            result.content.len()
        );

        Ok(result)
    }

    /// Run a detected invocation.
    pub async fn invoke(&self, invocation: &ToolInvocation) -> Result<ToolOutput, ToolError> {
        self.execute_args(&invocation.name, invocation.args.clone())
            .await
    }

    /// Execute a tool with JSON arguments string.
    ///
    /// This is a convenience method that parses the JSON string into parameters.
    pub async fn execute_json(
        &self,
        name: &str,
        args_json: &str,
    ) -> Result<ToolOutput, ToolError> {
        let params: HashMap<String, Value> = serde_json::from_str(args_json)?;
        self.execute(name, params).await
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct EchoTool;

    #[async_trait]
    impl Tool for EchoTool {
        fn name(&self) -> &str {
            "echo"
        }

        fn description(&self) -> &str {
            "Echoes back the input"
        }

        fn trigger(&self, text: &str) -> Option<ToolArgs> {
            text.strip_prefix("echo ")
                .map(|rest| ToolArgs::single("message", rest))
        }

        async fn execute(&self, args: ToolArgs) -> Result<ToolOutput, ToolError> {
            let message = args.get_string("message")?;
            Ok(ToolOutput::success(message))
        }
    }

    struct SlowTool;

    #[async_trait]
    impl Tool for SlowTool {
        fn name(&self) -> &str {
            "slow"
        }

        fn description(&self) -> &str {
            "Never finishes in time"
        }

        fn trigger(&self, _text: &str) -> Option<ToolArgs> {
            Some(ToolArgs::default())
        }

        async fn execute(&self, _args: ToolArgs) -> Result<ToolOutput, ToolError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(ToolOutput::success("late"))
        }
    }

    #[tokio::test]
    async fn test_registry_basic() {
        let mut registry = ToolRegistry::new();
        registry.register(EchoTool);

        assert!(registry.has_tool("echo"));
        assert!(!registry.has_tool("nonexistent"));
        assert_eq!(registry.list_tools(), vec!["echo"]);
    }

    #[tokio::test]
    async fn test_registry_execute() {
        let mut registry = ToolRegistry::new();
        registry.register(EchoTool);

        let mut params = HashMap::new();
        params.insert("message".to_string(), Value::String("hello".to_string()));

        let result = registry.execute("echo", params).await.unwrap();
        assert!(result.success);
        assert_eq!(result.content, "hello");
    }

    #[tokio::test]
    async fn test_registry_execute_json() {
        let mut registry = ToolRegistry::new();
        registry.register(EchoTool);

        let result = registry
            .execute_json("echo", r#"{"message": "world"}"#)
            .await
            .unwrap();
        assert!(result.success);
        assert_eq!(result.content, "world");
    }

    #[tokio::test]
    async fn test_registry_not_found() {
        let registry = ToolRegistry::new();
        let result = registry.execute("nonexistent", HashMap::new()).await;
        assert!(matches!(result, Err(ToolError::NotFound(_))));
    }

    #[test]
    fn test_detect_follows_allowed_order() {
        let mut registry = ToolRegistry::new();
        registry.register(EchoTool);
        registry.register(SlowTool);

        let found = registry.detect("echo hi", &["slow", "missing", "echo"]);
        let names: Vec<_> = found.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["slow", "echo"]);
        assert_eq!(found[1].args.get_string("message").unwrap(), "hi");

        assert!(registry.detect("hello", &["echo"]).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_execute_times_out() {
        let mut registry = ToolRegistry::new().with_timeout(Duration::from_secs(1));
        registry.register(SlowTool);

        let result = registry.execute_args("slow", ToolArgs::default()).await;
        assert!(matches!(result, Err(ToolError::Timeout { .. })));
    }
}
