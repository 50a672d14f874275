use std::collections::{HashMap, HashSet};
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{BriefError, Result};
use crate::task::Task;

/// The artifact of a fully successful run: the final task's output and when
/// it completed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineResult {
    pub text: String,
    pub completed_at: DateTime<Utc>,
}

/// An ordered chain of tasks executed strictly in declaration order.
///
/// This is deliberately a linear chain, not a DAG scheduler: the declared
/// order must already satisfy the dependency order, and violating that is a
/// construction error rather than a scheduling decision.
pub struct Pipeline {
    name: String,
    tasks: Vec<Task>,
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("name", &self.name)
            .field("tasks", &self.tasks.iter().map(|t| &t.name).collect::<Vec<_>>())
            .finish()
    }
}

impl Pipeline {
    /// Validate the chain at configuration time. Every dependency must name a
    /// task declared earlier in the sequence; task names must be unique.
    pub fn new(name: impl Into<String>, tasks: Vec<Task>) -> Result<Self> {
        if tasks.is_empty() {
            return Err(BriefError::Config("pipeline requires at least one task".into()));
        }

        let mut seen: HashSet<&str> = HashSet::new();
        for task in &tasks {
            for dep in &task.depends_on {
                if !seen.contains(dep.as_str()) {
                    return Err(BriefError::DependencyOrder(format!(
                        "task `{}` depends on `{dep}`, which is not declared before it",
                        task.name
                    )));
                }
            }
            if !seen.insert(&task.name) {
                return Err(BriefError::DependencyOrder(format!(
                    "task name `{}` is declared twice",
                    task.name
                )));
            }
        }

        Ok(Self {
            name: name.into(),
            tasks,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Run every task once, in declaration order, feeding each task the
    /// outputs of its dependencies. The first failure aborts the run with the
    /// failing task's name attached; no later task executes and nothing of the
    /// partial run survives.
    pub async fn run(&self) -> Result<PipelineResult> {
        let mut outputs: HashMap<&str, String> = HashMap::new();

        for task in &self.tasks {
            let context = self.build_context(task, &outputs);
            tracing::info!(pipeline = %self.name, task = %task.name, "executing task");

            let output = task
                .agent
                .execute(&task.description, &task.expected_output, &context)
                .await
                .map_err(|source| BriefError::Task {
                    task: task.name.clone(),
                    source: Box::new(source),
                })?;

            // Write-once per run; validation made the name unique.
            outputs.insert(&task.name, output);
        }

        let last = self.tasks.last().expect("validated as non-empty");
        Ok(PipelineResult {
            text: outputs.remove(last.name.as_str()).expect("last task ran"),
            completed_at: Utc::now(),
        })
    }

    /// Concatenate dependency outputs in declared order, each introduced by
    /// its source task's description so the downstream agent knows provenance.
    fn build_context(&self, task: &Task, outputs: &HashMap<&str, String>) -> String {
        let mut context = String::new();
        for dep in &task.depends_on {
            let description = self
                .tasks
                .iter()
                .find(|t| &t.name == dep)
                .map(|t| t.description.as_str())
                .unwrap_or(dep);
            let output = outputs.get(dep.as_str()).expect("dependency ran earlier");
            context.push_str(&format!("### {description}\n{output}\n\n"));
        }
        context
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;

    use super::*;
    use crate::agent::Agent;
    use crate::llm::{LanguageModelClient, ModelResponse, StubClient};
    use crate::tool::ToolSpec;

    /// Records every prompt it sees, then answers with a fixed string.
    struct EchoClient {
        answer: String,
        seen: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl LanguageModelClient for EchoClient {
        async fn generate(&self, prompt: &str, _tools: &[ToolSpec]) -> Result<ModelResponse> {
            self.seen.lock().unwrap().push(prompt.to_string());
            Ok(ModelResponse::FinalAnswer {
                text: self.answer.clone(),
            })
        }
    }

    fn answering_agent(text: &str) -> Arc<Agent> {
        Arc::new(Agent::new(StubClient::new(vec![ModelResponse::FinalAnswer {
            text: text.into(),
        }])))
    }

    #[tokio::test]
    async fn chains_outputs_through_context_in_declared_order() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let t3_agent = Arc::new(Agent::new(Arc::new(EchoClient {
            answer: "final report".into(),
            seen: Arc::clone(&seen),
        })));

        let pipeline = Pipeline::new(
            "chain",
            vec![
                Task::new("t1", "research sectors", "a sector list", answering_agent("alpha")),
                Task::new("t2", "pick stocks", "a stock list", answering_agent("bravo"))
                    .depends_on("t1"),
                Task::new("t3", "write the report", "a report", t3_agent)
                    .depends_on("t1")
                    .depends_on("t2"),
            ],
        )
        .unwrap();

        let result = pipeline.run().await.unwrap();
        assert_eq!(result.text, "final report");

        let prompts = seen.lock().unwrap();
        let prompt = &prompts[0];
        let alpha = prompt.find("alpha").expect("t1 output in t3 context");
        let bravo = prompt.find("bravo").expect("t2 output in t3 context");
        assert!(alpha < bravo, "dependency outputs must keep declared order");
        assert!(prompt.contains("research sectors"));
        assert!(prompt.contains("pick stocks"));
    }

    #[tokio::test]
    async fn failure_aborts_and_names_the_task() {
        let failing = Arc::new(Agent::new(StubClient::new(vec![])));
        let ran_later = Arc::new(Mutex::new(Vec::new()));
        let later_agent = Arc::new(Agent::new(Arc::new(EchoClient {
            answer: "should never run".into(),
            seen: Arc::clone(&ran_later),
        })));

        let pipeline = Pipeline::new(
            "aborts",
            vec![
                Task::new("broken", "will fail", "nothing", failing),
                Task::new("after", "never reached", "nothing", later_agent).depends_on("broken"),
            ],
        )
        .unwrap();

        let err = pipeline.run().await.unwrap_err();
        assert!(matches!(err, BriefError::Task { ref task, .. } if task == "broken"));
        assert!(ran_later.lock().unwrap().is_empty(), "no later task may execute");
    }

    #[test]
    fn forward_dependency_is_rejected_at_construction() {
        let err = Pipeline::new(
            "forward",
            vec![
                Task::new("t1", "d", "e", answering_agent("x")).depends_on("t2"),
                Task::new("t2", "d", "e", answering_agent("y")),
            ],
        )
        .unwrap_err();

        assert!(matches!(err, BriefError::DependencyOrder(_)));
    }

    #[test]
    fn unknown_dependency_is_rejected_at_construction() {
        let err = Pipeline::new(
            "unknown",
            vec![Task::new("t1", "d", "e", answering_agent("x")).depends_on("ghost")],
        )
        .unwrap_err();

        assert!(matches!(err, BriefError::DependencyOrder(_)));
    }

    #[test]
    fn duplicate_task_names_are_rejected() {
        let err = Pipeline::new(
            "dupes",
            vec![
                Task::new("t1", "d", "e", answering_agent("x")),
                Task::new("t1", "d", "e", answering_agent("y")),
            ],
        )
        .unwrap_err();

        assert!(matches!(err, BriefError::DependencyOrder(_)));
    }

    #[test]
    fn empty_pipeline_is_rejected() {
        let err = Pipeline::new("empty", vec![]).unwrap_err();
        assert!(matches!(err, BriefError::Config(_)));
    }
}
