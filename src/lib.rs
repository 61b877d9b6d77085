//! jobflow — human-in-the-loop agent orchestration core.
//!
//! An in-process coordination library for chaining task-executing agents
//! into ordered pipelines while requiring human sign-off before
//! state-changing actions take effect. It defines no wire protocol and
//! persists nothing; durable storage and front ends attach externally.
//!
//! Module map:
//! - **agent**: the [`Agent`] contract and the payload types threaded
//!   between workflow steps
//! - **coordinator**: sequential pipeline execution with per-step records
//! - **state_machine**: the coarse process lifecycle and its fixed
//!   transition table
//! - **approval**: the human-decision gate and the workflow policy layer
//!   above it
//! - **retry**: transient-error classification and exponential backoff
//! - **rate_limit**: sliding-window throttling for outbound callers
//! - **config**: `jobflow.toml` loading

pub mod agent;
pub mod approval;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod rate_limit;
pub mod retry;
pub mod state_machine;

pub use agent::{Agent, AgentName, Payload, WorkflowValue};
pub use approval::{
    ActionKind, ApprovalCallback, ApprovalGate, ApprovalRequest, ApprovalStatus, OwnerRequests,
    RequestId, WorkflowPolicy, WorkflowPolicyManager, WorkflowRun, register_default_workflows,
};
pub use config::JobflowConfig;
pub use coordinator::{Coordinator, ExecutionRecord, StepStatus};
pub use error::JobflowError;
pub use rate_limit::RateLimiter;
pub use retry::{ErrorInfo, ErrorPolicy, ErrorRecord, RecoveryAgent, RetryConfig, RetryDecision};
pub use state_machine::{ProcessState, StateMachine};
