use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::gate::{ApprovalCallback, ApprovalGate};
use super::request::{ActionKind, ApprovalRequest, ApprovalStatus, RequestId};
use crate::agent::Payload;
use crate::error::JobflowError;

/// Declarative policy for one workflow kind: whether its action needs human
/// sign-off, and the exact-equality conditions under which sign-off is
/// granted automatically.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowPolicy {
    pub name: String,
    pub action: ActionKind,
    pub requires_approval: bool,
    /// Every key must be present in the payload with an exactly equal value
    /// for automatic approval. An empty set never auto-approves.
    pub auto_approve: HashMap<String, serde_json::Value>,
}

/// How a gated workflow run resolved.
#[derive(Debug)]
pub enum WorkflowRun {
    /// The callback ran immediately, either because the workflow needs no
    /// approval or because its auto-approve conditions matched.
    Executed { auto_approved: bool },
    /// A pending request was filed with the approval gate; the callback will
    /// run when a human approves it.
    Pending { request_id: RequestId },
}

/// Decides, per registered workflow kind, whether an action executes
/// immediately, is auto-approved by rule, or is filed with the
/// [`ApprovalGate`] for human decision.
pub struct WorkflowPolicyManager {
    gate: Arc<ApprovalGate>,
    policies: HashMap<String, WorkflowPolicy>,
}

impl WorkflowPolicyManager {
    pub fn new(gate: Arc<ApprovalGate>) -> Self {
        Self {
            gate,
            policies: HashMap::new(),
        }
    }

    /// Register a workflow kind. Re-registering an id replaces its policy.
    pub fn register(
        &mut self,
        workflow_id: impl Into<String>,
        name: impl Into<String>,
        action: ActionKind,
        requires_approval: bool,
        auto_approve: HashMap<String, serde_json::Value>,
    ) {
        self.policies.insert(
            workflow_id.into(),
            WorkflowPolicy {
                name: name.into(),
                action,
                requires_approval,
                auto_approve,
            },
        );
    }

    /// The policy registered for `workflow_id`, if any.
    pub fn policy(&self, workflow_id: &str) -> Option<&WorkflowPolicy> {
        self.policies.get(workflow_id)
    }

    /// Run `workflow_id` for `owner_id` over `data`.
    ///
    /// The immediate paths (no approval required, or auto-approved) invoke
    /// `callback` synchronously and never create a gate record; the callback
    /// receives an ephemeral, already-approved request that exists only for
    /// the call. The gated path files a pending request and returns its id.
    pub fn run(
        &self,
        workflow_id: &str,
        owner_id: &str,
        data: Payload,
        callback: Option<ApprovalCallback>,
    ) -> Result<WorkflowRun, JobflowError> {
        let Some(policy) = self.policies.get(workflow_id) else {
            return Err(JobflowError::UnknownWorkflow(workflow_id.to_string()));
        };

        if !policy.requires_approval {
            debug!(workflow = workflow_id, "executing without approval");
            self.execute_now(policy, owner_id, workflow_id, data, callback, None)?;
            return Ok(WorkflowRun::Executed { auto_approved: false });
        }

        if auto_approve_matches(&policy.auto_approve, &data) {
            debug!(workflow = workflow_id, "auto-approve conditions matched");
            self.execute_now(policy, owner_id, workflow_id, data, callback, Some("auto"))?;
            return Ok(WorkflowRun::Executed { auto_approved: true });
        }

        let request = self.gate.create_request(
            owner_id,
            policy.action,
            policy.name.clone(),
            describe(workflow_id, &data),
            data,
            callback,
        );
        Ok(WorkflowRun::Pending {
            request_id: request.id,
        })
    }

    /// Invoke the callback for an ungated run. No gate record is created;
    /// the request handed to the callback is synthesized for the call.
    fn execute_now(
        &self,
        policy: &WorkflowPolicy,
        owner_id: &str,
        workflow_id: &str,
        data: Payload,
        callback: Option<ApprovalCallback>,
        reviewed_by: Option<&str>,
    ) -> Result<(), JobflowError> {
        let Some(callback) = callback else {
            return Ok(());
        };

        let mut request = ApprovalRequest::new(
            owner_id,
            policy.action,
            policy.name.clone(),
            describe(workflow_id, &data),
            data,
        );
        request.status = ApprovalStatus::Approved;
        request.reviewed_by = reviewed_by.map(String::from);

        callback(&request).map_err(JobflowError::Callback)
    }
}

/// Conjunctive strict-equality match of every condition against the payload.
/// No conditions means no automatic approval.
fn auto_approve_matches(
    conditions: &HashMap<String, serde_json::Value>,
    data: &Payload,
) -> bool {
    if conditions.is_empty() {
        return false;
    }
    conditions
        .iter()
        .all(|(key, expected)| data.get(key) == Some(expected))
}

/// Human-readable description for the approval request, derived from the
/// workflow kind and payload.
fn describe(workflow_id: &str, data: &Payload) -> String {
    let field = |key: &str, fallback: &str| -> String {
        match data.get(key).and_then(|v| v.as_str()) {
            Some(s) => s.to_string(),
            None => fallback.to_string(),
        }
    };

    match workflow_id {
        "send_message" => format!(
            "Send message to {}: {}",
            field("to", "recipient"),
            field("subject", "no subject"),
        ),
        "apply_to_job" => format!(
            "Apply to {} at {}",
            field("job_title", "job"),
            field("company", "company"),
        ),
        "send_outreach" => format!(
            "Send outreach message to {}",
            field("contact_name", "contact"),
        ),
        _ => format!("Execute {workflow_id} workflow"),
    }
}

/// Register the stock workflow set: messaging, applications, and outreach
/// are gated; document generation runs without approval.
pub fn register_default_workflows(manager: &mut WorkflowPolicyManager) {
    manager.register(
        "send_message",
        "Send Message",
        ActionKind::SendMessage,
        true,
        HashMap::new(),
    );
    manager.register(
        "apply_to_job",
        "Apply to Job",
        ActionKind::ApplyToJob,
        true,
        HashMap::new(),
    );
    manager.register(
        "send_outreach",
        "Send Networking Message",
        ActionKind::SendOutreach,
        true,
        HashMap::new(),
    );
    manager.register(
        "generate_document",
        "Generate Document",
        ActionKind::GenerateDocument,
        false,
        HashMap::new(),
    );
    manager.register(
        "schedule_interview",
        "Schedule Interview",
        ActionKind::ScheduleInterview,
        true,
        HashMap::new(),
    );
    manager.register(
        "accept_offer",
        "Accept Job Offer",
        ActionKind::AcceptOffer,
        true,
        HashMap::new(),
    );
}
