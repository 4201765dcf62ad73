//! Tool system for AI agents
//!
//! Provides the core abstraction for defining tools that AI agents can call.

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::Error;

/// Definition of a tool that can be sent to the LLM
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Name of the tool
    pub name: String,
    /// Description for the LLM
    pub description: String,
    /// JSON Schema for parameters
    pub parameters: serde_json::Value,
}

impl ToolDefinition {
    /// Build a definition whose parameter schema is derived from an args struct
    pub fn for_args<A: JsonSchema>(name: impl Into<String>, description: impl Into<String>) -> Self {
        let schema = schemars::schema_for!(A);
        let mut parameters = serde_json::to_value(schema).unwrap_or_else(|_| {
            serde_json::json!({ "type": "object", "properties": {} })
        });
        // Providers reject the meta keys schemars adds at the root
        if let serde_json::Value::Object(map) = &mut parameters {
            map.remove("$schema");
            map.remove("title");
        }
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
        }
    }
}

/// Parse tool arguments, mapping failures to [`Error::ToolArguments`]
pub fn parse_arguments<A: for<'de> Deserialize<'de>>(
    tool_name: &str,
    arguments: &str,
) -> Result<A, Error> {
    // Some models send an empty string for argument-less calls
    let raw = if arguments.trim().is_empty() || arguments.trim() == "null" {
        "{}"
    } else {
        arguments
    };
    serde_json::from_str(raw).map_err(|e| Error::ToolArguments {
        tool_name: tool_name.to_string(),
        message: e.to_string(),
    })
}

/// Trait for implementing tools that AI agents can call
#[async_trait]
pub trait Tool: Send + Sync {
    /// The name of this tool
    fn name(&self) -> String;

    /// Get the tool definition for the LLM
    async fn definition(&self) -> ToolDefinition;

    /// Execute the tool with the given arguments (JSON string)
    async fn call(&self, arguments: &str) -> anyhow::Result<String>;
}

/// Named collection of tools handed to an agent
#[derive(Clone)]
pub struct ToolSet {
    // BTreeMap keeps definitions in a stable order across requests
    tools: BTreeMap<String, Arc<dyn Tool>>,
    /// Cached definitions to avoid async calls on every request
    cached_definitions: Arc<parking_lot::RwLock<BTreeMap<String, ToolDefinition>>>,
}

impl Default for ToolSet {
    fn default() -> Self {
        Self::new()
    }
}

impl ToolSet {
    /// Create an empty toolset
    pub fn new() -> Self {
        Self {
            tools: BTreeMap::new(),
            cached_definitions: Arc::new(parking_lot::RwLock::new(BTreeMap::new())),
        }
    }

    /// Add a tool to the set
    pub fn add<T: Tool + 'static>(&mut self, tool: T) -> &mut Self {
        self.add_shared(Arc::new(tool))
    }

    /// Add a shared tool to the set
    pub fn add_shared(&mut self, tool: Arc<dyn Tool>) -> &mut Self {
        let name = tool.name();
        self.cached_definitions.write().remove(&name);
        self.tools.insert(name, tool);
        self
    }

    /// Get a tool by name
    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.get(name)
    }

    /// Check if a tool exists
    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Get all tool definitions, sorted by name
    pub async fn definitions(&self) -> Vec<ToolDefinition> {
        let mut defs = Vec::with_capacity(self.tools.len());
        for (name, tool) in &self.tools {
            // Scope the read guard so it is released before awaiting
            let cached = { self.cached_definitions.read().get(name).cloned() };

            if let Some(def) = cached {
                defs.push(def);
            } else {
                let def = tool.definition().await;
                self.cached_definitions
                    .write()
                    .insert(name.clone(), def.clone());
                defs.push(def);
            }
        }
        defs
    }

    /// Call a tool by name
    pub async fn call(&self, name: &str, arguments: &str) -> anyhow::Result<String> {
        let tool = self
            .tools
            .get(name)
            .ok_or_else(|| Error::ToolNotFound(name.to_string()))?;

        tool.call(arguments).await
    }

    /// Get the number of tools
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Iterate over tools
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Arc<dyn Tool>)> {
        self.tools.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EchoTool;

    #[derive(Deserialize, JsonSchema)]
    struct EchoArgs {
        /// Message to echo
        message: String,
    }

    #[async_trait]
    impl Tool for EchoTool {
        fn name(&self) -> String {
            "echo".to_string()
        }

        async fn definition(&self) -> ToolDefinition {
            ToolDefinition::for_args::<EchoArgs>("echo", "Echo back the input")
        }

        async fn call(&self, arguments: &str) -> anyhow::Result<String> {
            let args: EchoArgs = parse_arguments("echo", arguments)?;
            Ok(args.message)
        }
    }

    #[tokio::test]
    async fn test_toolset() {
        let mut toolset = ToolSet::new();
        toolset.add(EchoTool);

        assert!(toolset.contains("echo"));
        assert_eq!(toolset.len(), 1);

        let result = toolset
            .call("echo", r#"{"message": "hello"}"#)
            .await
            .expect("call should succeed");
        assert_eq!(result, "hello");
    }

    #[tokio::test]
    async fn test_unknown_tool() {
        let toolset = ToolSet::new();
        let err = toolset.call("missing", "{}").await.unwrap_err();
        assert!(err.to_string().contains("Tool not found: missing"));
    }

    #[tokio::test]
    async fn test_schema_from_args() {
        let mut toolset = ToolSet::new();
        toolset.add(EchoTool);

        let defs = toolset.definitions().await;
        assert_eq!(defs.len(), 1);
        let params = &defs[0].parameters;
        assert_eq!(params["type"], "object");
        assert_eq!(params["properties"]["message"]["type"], "string");
        assert_eq!(params["required"][0], "message");
        assert!(params.get("$schema").is_none());
    }

    #[test]
    fn test_parse_arguments_errors_name_the_tool() {
        let err = parse_arguments::<EchoArgs>("echo", r#"{"wrong": 1}"#)
            .err()
            .expect("missing field should fail");
        assert!(err.to_string().contains("Invalid tool arguments for echo"));
    }
}
