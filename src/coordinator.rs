//! Sequential execution of agent workflows.
//!
//! The [`Coordinator`] owns a registry of agents and runs an ordered list of
//! agent names as one pipeline, threading each step's output into the next
//! step's input and recording an [`ExecutionRecord`] per step. A failing step
//! degrades the threaded value to [`WorkflowValue::Err`] and execution
//! continues; a single agent failure never aborts the workflow.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::agent::{Agent, AgentName, Payload, WorkflowValue};

/// Outcome of one workflow step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Success,
    Error,
    Skipped,
}

/// Append-only log entry describing one workflow step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionRecord {
    pub agent: AgentName,
    pub status: StepStatus,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// The threaded value as it stood after this step.
    pub output: WorkflowValue,
    /// Present only for skipped steps.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Runs ordered agent pipelines and keeps their execution history.
#[derive(Default)]
pub struct Coordinator {
    agents: HashMap<AgentName, Box<dyn Agent>>,
    history: Vec<ExecutionRecord>,
}

impl Coordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an agent under its own name. Re-registering the same name
    /// silently replaces the prior entry.
    pub fn register(&mut self, agent: Box<dyn Agent>) {
        let name = agent.name().clone();
        if self.agents.insert(name.clone(), agent).is_some() {
            debug!(agent = %name, "replacing registered agent");
        }
    }

    /// Look up a registered agent by name.
    pub fn get(&self, name: &AgentName) -> Option<&dyn Agent> {
        self.agents.get(name).map(|a| a.as_ref())
    }

    /// Execute the named agents in order, starting from `input`.
    ///
    /// - An unregistered name appends a `Skipped` record and leaves the
    ///   threaded value untouched.
    /// - An agent error turns the threaded value into `WorkflowValue::Err`
    ///   and execution continues with the next step.
    ///
    /// Returns the threaded value after the last step (the initial payload
    /// if `workflow` is empty).
    pub async fn run(&mut self, workflow: &[AgentName], input: Payload) -> WorkflowValue {
        let mut value = WorkflowValue::from(input);

        for name in workflow {
            let started_at = Utc::now();

            let Some(agent) = self.agents.get_mut(name) else {
                debug!(agent = %name, "skipping unregistered agent");
                self.history.push(ExecutionRecord {
                    agent: name.clone(),
                    status: StepStatus::Skipped,
                    started_at,
                    finished_at: Utc::now(),
                    output: value.clone(),
                    note: Some("agent not registered".to_string()),
                });
                continue;
            };

            let status = match agent.execute(value.clone()).await {
                Ok(output) => {
                    value = WorkflowValue::from(output);
                    StepStatus::Success
                }
                Err(err) => {
                    warn!(agent = %name, error = %err, "agent execution failed");
                    value = WorkflowValue::Err {
                        agent: name.clone(),
                        error: err.to_string(),
                    };
                    StepStatus::Error
                }
            };

            self.history.push(ExecutionRecord {
                agent: name.clone(),
                status,
                started_at,
                finished_at: Utc::now(),
                output: value.clone(),
                note: None,
            });
        }

        value
    }

    /// The step-by-step log of every workflow run so far, in execution order.
    pub fn execution_history(&self) -> &[ExecutionRecord] {
        &self.history
    }
}
