use std::sync::Arc;

use crate::agent::Agent;

/// A unit of pipeline work: what to produce, who produces it, and which
/// earlier tasks feed it.
///
/// Dependencies are referenced by task name and must resolve to tasks declared
/// earlier in the pipeline; `Pipeline::new` enforces this before anything runs.
pub struct Task {
    pub name: String,
    pub description: String,
    pub expected_output: String,
    pub agent: Arc<Agent>,
    pub depends_on: Vec<String>,
}

impl Task {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        expected_output: impl Into<String>,
        agent: Arc<Agent>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            expected_output: expected_output.into(),
            agent,
            depends_on: Vec::new(),
        }
    }

    /// Declare a prerequisite whose output becomes part of this task's context.
    /// Order of declaration is the order of concatenation.
    pub fn depends_on(mut self, task_name: impl Into<String>) -> Self {
        self.depends_on.push(task_name.into());
        self
    }
}
