//! The agent contract and the payload types threaded between workflow steps.
//!
//! An [`Agent`] is a named, stateful, asynchronously executable unit of work.
//! Agents exchange free-form JSON object payloads so heterogeneous agents can
//! be chained without a shared schema; the value that actually flows between
//! steps is the tagged [`WorkflowValue`], which makes "the previous step
//! failed" an explicit case every agent must handle rather than a
//! convention-based status field.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Free-form structured payload exchanged between agents.
pub type Payload = serde_json::Map<String, serde_json::Value>;

/// Registry key for agents. A distinct type rather than a bare `String` so
/// workflow definitions cannot be confused with arbitrary text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AgentName(String);

impl AgentName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AgentName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for AgentName {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

/// The value threaded through a workflow: either the payload produced by the
/// last successful step, or a record of which agent failed and why.
///
/// A failed step does not abort the workflow (see
/// [`Coordinator::run`](crate::coordinator::Coordinator::run)), so every
/// agent downstream of a possible failure receives the `Err` arm as valid
/// input and decides for itself how to react.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum WorkflowValue {
    Ok {
        #[serde(flatten)]
        data: Payload,
    },
    #[serde(rename = "error")]
    Err { agent: AgentName, error: String },
}

impl WorkflowValue {
    /// The payload of a successful value, if any.
    pub fn data(&self) -> Option<&Payload> {
        match self {
            WorkflowValue::Ok { data } => Some(data),
            WorkflowValue::Err { .. } => None,
        }
    }

    pub fn is_err(&self) -> bool {
        matches!(self, WorkflowValue::Err { .. })
    }
}

impl From<Payload> for WorkflowValue {
    fn from(data: Payload) -> Self {
        WorkflowValue::Ok { data }
    }
}

/// A named, stateful unit of work that can be registered with a
/// [`Coordinator`](crate::coordinator::Coordinator).
///
/// `execute` runs cooperatively on the caller's task and may fail with any
/// error; the coordinator converts a failure into a `WorkflowValue::Err` at
/// its boundary. `reset` clears the agent's private state only, never its
/// configuration.
#[async_trait]
pub trait Agent: Send + Sync {
    fn name(&self) -> &AgentName;

    async fn execute(&mut self, input: WorkflowValue) -> anyhow::Result<Payload>;

    fn reset(&mut self);
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn agent_name_display_and_eq() {
        let name = AgentName::new("job_search");
        assert_eq!(name.to_string(), "job_search");
        assert_eq!(name, AgentName::from("job_search"));
        assert_ne!(name, AgentName::from("job_ranker"));
    }

    #[test]
    fn workflow_value_data_access() {
        let mut payload = Payload::new();
        payload.insert("jobs_found".into(), json!(12));
        let value = WorkflowValue::from(payload.clone());
        assert!(!value.is_err());
        assert_eq!(value.data(), Some(&payload));

        let err = WorkflowValue::Err {
            agent: "job_search".into(),
            error: "connection refused".into(),
        };
        assert!(err.is_err());
        assert_eq!(err.data(), None);
    }

    #[test]
    fn error_value_serializes_with_status_tag() {
        let err = WorkflowValue::Err {
            agent: "outreach".into(),
            error: "smtp unavailable".into(),
        };
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["status"], "error");
        assert_eq!(json["agent"], "outreach");
        assert_eq!(json["error"], "smtp unavailable");
    }

    #[test]
    fn ok_value_flattens_payload() {
        let mut payload = Payload::new();
        payload.insert("x".into(), json!(1));
        let value = WorkflowValue::from(payload);
        let json = serde_json::to_value(&value).unwrap();
        assert_eq!(json["status"], "ok");
        assert_eq!(json["x"], 1);
    }
}
