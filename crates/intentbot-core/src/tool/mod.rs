pub mod android_intent;

use async_trait::async_trait;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use crate::error::ToolError;
use crate::platform::IntentDispatcher;

use self::android_intent::AndroidIntentTool;

/// Trait for tools the model can invoke.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Tool name used in function calls.
    fn name(&self) -> &str;

    /// Description of what the tool does.
    fn description(&self) -> &str;

    /// JSON Schema for tool parameters.
    fn parameters(&self) -> serde_json::Value;

    /// Execute the tool with given parameters. Handler failures are reported
    /// in the returned text so the model can see them.
    async fn execute(&self, params: HashMap<String, serde_json::Value>) -> String;
}

/// Schema advertised to the model for one tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

impl ToolDescriptor {
    /// OpenAI function-tool format.
    pub fn to_schema(&self) -> serde_json::Value {
        json!({
            "type": "function",
            "function": {
                "name": self.name,
                "description": self.description,
                "parameters": self.parameters,
            }
        })
    }
}

/// Extension trait for Tool to build its descriptor.
pub trait ToolSchema: Tool {
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters(),
        }
    }
}

impl<T: Tool + ?Sized> ToolSchema for T {}

/// Name-to-handler mapping consulted by the conversation loop.
pub struct ToolRegistry {
    tools: DashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: DashMap::new(),
        }
    }

    /// Registry holding the built-in `androidIntent` tool.
    pub fn with_defaults(dispatcher: Arc<dyn IntentDispatcher>) -> Self {
        let registry = Self::new();
        registry.register(Arc::new(AndroidIntentTool::new(dispatcher)));
        registry
    }

    /// Register a tool.
    pub fn register(&self, tool: Arc<dyn Tool>) {
        self.tools.insert(tool.name().to_string(), tool);
    }

    /// Get a tool by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).map(|r| r.value().clone())
    }

    /// Get a tool by name, failing with `ToolError::NotFound`.
    pub fn resolve(&self, name: &str) -> Result<Arc<dyn Tool>, ToolError> {
        self.get(name)
            .ok_or_else(|| ToolError::NotFound(name.to_string()))
    }

    /// Check if a tool is registered.
    pub fn has(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    pub fn descriptors(&self) -> Vec<ToolDescriptor> {
        let mut descriptors: Vec<_> = self.tools.iter().map(|e| e.value().descriptor()).collect();
        descriptors.sort_by(|a, b| a.name.cmp(&b.name));
        descriptors
    }

    /// Get all tool definitions in OpenAI format.
    pub fn definitions(&self) -> Vec<serde_json::Value> {
        self.descriptors().iter().map(ToolDescriptor::to_schema).collect()
    }

    /// Execute a tool by name. An unknown name is an error; anything the
    /// handler itself reports comes back as text.
    pub async fn execute(
        &self,
        name: &str,
        params: HashMap<String, serde_json::Value>,
    ) -> Result<String, ToolError> {
        let tool = self.resolve(name)?;
        debug!("Executing tool: {}", name);
        Ok(tool.execute(params).await)
    }

    /// Get list of registered tool names.
    pub fn tool_names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.tools.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    /// Number of registered tools.
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}
