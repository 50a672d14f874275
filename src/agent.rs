use std::sync::Arc;

use crate::error::{BriefError, Result};
use crate::llm::{LanguageModelClient, ModelResponse};
use crate::tool::ToolRegistry;

/// A configured identity bound to a model and a set of tools.
///
/// The agent alternates between the model and its tools until the model
/// produces a final answer. Configuration is immutable after construction and
/// every `execute` call is independent.
pub struct Agent {
    role: String,
    goal: String,
    backstory: String,
    tools: ToolRegistry,
    model: Arc<dyn LanguageModelClient>,
    max_rounds: usize,
}

impl Agent {
    pub fn new(model: Arc<dyn LanguageModelClient>) -> Self {
        Self {
            role: "Assistant".to_string(),
            goal: String::new(),
            backstory: String::new(),
            tools: ToolRegistry::new(),
            model,
            max_rounds: 6,
        }
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = role.into();
        self
    }

    pub fn with_goal(mut self, goal: impl Into<String>) -> Self {
        self.goal = goal.into();
        self
    }

    pub fn with_backstory(mut self, backstory: impl Into<String>) -> Self {
        self.backstory = backstory.into();
        self
    }

    pub fn with_tools(mut self, tools: ToolRegistry) -> Self {
        self.tools = tools;
        self
    }

    pub fn with_max_rounds(mut self, max_rounds: usize) -> Self {
        self.max_rounds = max_rounds.max(1);
        self
    }

    pub fn role(&self) -> &str {
        &self.role
    }

    /// Turn a task description plus upstream context into a final text answer.
    ///
    /// Each model turn sees the full transcript so far. A `ToolCall` appends
    /// the tool's result and re-enters the model; a `FinalAnswer` ends the
    /// loop. The loop is bounded by `max_rounds` tool rounds.
    pub async fn execute(
        &self,
        description: &str,
        expected_output: &str,
        context: &str,
    ) -> Result<String> {
        let mut transcript = self.compose_prompt(description, expected_output, context);
        let specs = self.tools.describe();

        for round in 0..self.max_rounds {
            tracing::debug!(role = %self.role, round, "consulting model");
            match self.model.generate(&transcript, &specs).await? {
                ModelResponse::FinalAnswer { text } => {
                    tracing::info!(role = %self.role, rounds = round, "task answered");
                    return Ok(text);
                }
                ModelResponse::ToolCall { name, query } => {
                    tracing::info!(role = %self.role, tool = %name, %query, "tool requested");
                    let output = self.tools.run(&name, &query).await?;
                    transcript.push_str(&format!(
                        "\n\n## Tool result: {name}\nQuery: {query}\n{output}\n\
                         Use this result to continue the task."
                    ));
                }
            }
        }

        Err(BriefError::RoundLimit {
            rounds: self.max_rounds,
        })
    }

    fn compose_prompt(&self, description: &str, expected_output: &str, context: &str) -> String {
        let mut prompt = String::new();
        prompt.push_str(&format!("## Role\n{}\n\n", self.role));
        prompt.push_str(&format!("## Goal\n{}\n\n", self.goal));
        prompt.push_str(&format!("## Backstory\n{}\n\n", self.backstory));
        prompt.push_str(&format!("## Task\n{description}\n\n"));
        prompt.push_str(&format!("## Expected output\n{expected_output}\n"));
        if !context.is_empty() {
            prompt.push_str(&format!("\n## Context from earlier tasks\n{context}"));
        }
        prompt
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    use crate::llm::StubClient;
    use crate::tool::Tool;

    struct CannedTool {
        reply: String,
    }

    #[async_trait]
    impl Tool for CannedTool {
        fn name(&self) -> &str {
            "search"
        }

        fn description(&self) -> &str {
            "Replays a canned result"
        }

        async fn run(&self, _query: &str) -> Result<String> {
            Ok(self.reply.clone())
        }
    }

    struct FailingTool;

    #[async_trait]
    impl Tool for FailingTool {
        fn name(&self) -> &str {
            "search"
        }

        fn description(&self) -> &str {
            "Always fails"
        }

        async fn run(&self, _query: &str) -> Result<String> {
            Err(BriefError::Tool {
                name: "search".into(),
                source: "connection reset".into(),
            })
        }
    }

    #[tokio::test]
    async fn tool_round_trip_returns_final_answer() {
        let model = StubClient::new(vec![
            ModelResponse::ToolCall {
                name: "search".into(),
                query: "X".into(),
            },
            ModelResponse::FinalAnswer {
                text: "RESULT:X".into(),
            },
        ]);
        let mut tools = ToolRegistry::new();
        tools.register(CannedTool {
            reply: "RESULT:X".into(),
        });

        let agent = Agent::new(model).with_role("Researcher").with_tools(tools);
        let answer = agent.execute("find X", "the value of X", "").await.unwrap();

        assert_eq!(answer, "RESULT:X");
    }

    #[tokio::test]
    async fn unknown_tool_fails_the_execution() {
        let model = StubClient::new(vec![ModelResponse::ToolCall {
            name: "telepathy".into(),
            query: "anything".into(),
        }]);

        let agent = Agent::new(model);
        let err = agent.execute("d", "e", "").await.unwrap_err();

        assert!(matches!(err, BriefError::UnknownTool(name) if name == "telepathy"));
    }

    #[tokio::test]
    async fn tool_failure_propagates() {
        let model = StubClient::new(vec![ModelResponse::ToolCall {
            name: "search".into(),
            query: "q".into(),
        }]);
        let mut tools = ToolRegistry::new();
        tools.register(FailingTool);

        let agent = Agent::new(model).with_tools(tools);
        let err = agent.execute("d", "e", "").await.unwrap_err();

        assert!(matches!(err, BriefError::Tool { .. }));
    }

    #[tokio::test]
    async fn round_limit_stops_a_runaway_loop() {
        let calls: Vec<ModelResponse> = (0..10)
            .map(|_| ModelResponse::ToolCall {
                name: "search".into(),
                query: "again".into(),
            })
            .collect();
        let model = StubClient::new(calls);
        let mut tools = ToolRegistry::new();
        tools.register(CannedTool {
            reply: "same".into(),
        });

        let agent = Agent::new(model).with_tools(tools).with_max_rounds(3);
        let err = agent.execute("d", "e", "").await.unwrap_err();

        assert!(matches!(err, BriefError::RoundLimit { rounds: 3 }));
    }

    #[tokio::test]
    async fn prompt_sections_are_ordered() {
        let model = StubClient::new(vec![]);
        let agent = Agent::new(model)
            .with_role("Analyst")
            .with_goal("pick stocks")
            .with_backstory("ten years on a desk");

        let prompt = agent.compose_prompt("select ten", "a list", "upstream notes");
        let positions: Vec<usize> = [
            "## Role",
            "## Goal",
            "## Backstory",
            "## Task",
            "## Expected output",
            "## Context from earlier tasks",
        ]
        .iter()
        .map(|s| prompt.find(s).unwrap())
        .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
        assert!(prompt.contains("upstream notes"));
    }
}
