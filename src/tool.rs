use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;

use crate::error::{BriefError, Result};

/// A named capability an agent may invoke mid-reasoning.
///
/// Tools are stateless between calls and immutable after construction. A tool
/// must not return an empty string on success; "nothing found" is reported as
/// explicit text so downstream reasoning can tell it apart from a transport
/// failure.
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    async fn run(&self, query: &str) -> Result<String>;
}

/// Name and description pair advertised to the language model.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
}

/// The set of tools granted to one agent, resolved by name at call time.
///
/// Registration order is preserved so tool listings in prompts are stable.
#[derive(Default, Clone)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self { tools: Vec::new() }
    }

    pub fn register<T: Tool + 'static>(&mut self, tool: T) {
        self.register_arc(Arc::new(tool));
    }

    pub fn register_arc(&mut self, tool: Arc<dyn Tool>) {
        self.tools.retain(|t| t.name() != tool.name());
        self.tools.push(tool);
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.iter().find(|t| t.name() == name)
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn describe(&self) -> Vec<ToolSpec> {
        self.tools
            .iter()
            .map(|t| ToolSpec {
                name: t.name().to_string(),
                description: t.description().to_string(),
            })
            .collect()
    }

    /// Resolve `name` and run it. A name outside the registry is a
    /// configuration bug surfaced as `UnknownTool`.
    pub async fn run(&self, name: &str, query: &str) -> Result<String> {
        let tool = self
            .get(name)
            .ok_or_else(|| BriefError::UnknownTool(name.to_string()))?;
        tool.run(query).await
    }
}
