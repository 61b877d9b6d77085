//! Human-in-the-loop approval: the request model, the gate that stores
//! pending decisions and runs callbacks on approval, and the policy layer
//! that decides which workflow runs need gating at all.

mod gate;
mod policy;
mod request;

pub use gate::{ApprovalCallback, ApprovalGate, OwnerRequests};
pub use policy::{WorkflowPolicy, WorkflowPolicyManager, WorkflowRun, register_default_workflows};
pub use request::{ActionKind, ApprovalRequest, ApprovalStatus, RequestId};
