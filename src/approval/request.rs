use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::agent::Payload;

/// Identifier for an approval request, generated at creation time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(String);

impl RequestId {
    pub(crate) fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The category of action a request asks sign-off for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    SendMessage,
    ApplyToJob,
    SendOutreach,
    GenerateDocument,
    ScheduleInterview,
    AcceptOffer,
    Custom,
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ActionKind::SendMessage => "send_message",
            ActionKind::ApplyToJob => "apply_to_job",
            ActionKind::SendOutreach => "send_outreach",
            ActionKind::GenerateDocument => "generate_document",
            ActionKind::ScheduleInterview => "schedule_interview",
            ActionKind::AcceptOffer => "accept_offer",
            ActionKind::Custom => "custom",
        };
        write!(f, "{name}")
    }
}

/// Lifecycle status of an approval request.
///
/// `Expired` is declared for callers that age out requests themselves;
/// nothing in this crate assigns it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalStatus {
    Pending,
    Approved,
    Rejected,
    Expired,
}

/// A recorded ask for human sign-off before a gated action executes.
///
/// A request is in exactly one status at any time, and the only movement is
/// pending → approved or pending → rejected; a recorded decision is final.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApprovalRequest {
    pub id: RequestId,
    pub owner_id: String,
    pub action: ActionKind,
    pub title: String,
    pub description: String,
    pub data: Payload,
    pub status: ApprovalStatus,
    pub created_at: DateTime<Utc>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub reviewed_by: Option<String>,
    pub reviewer_notes: Option<String>,
}

impl ApprovalRequest {
    pub(crate) fn new(
        owner_id: impl Into<String>,
        action: ActionKind,
        title: impl Into<String>,
        description: impl Into<String>,
        data: Payload,
    ) -> Self {
        Self {
            id: RequestId::generate(),
            owner_id: owner_id.into(),
            action,
            title: title.into(),
            description: description.into(),
            data,
            status: ApprovalStatus::Pending,
            created_at: Utc::now(),
            reviewed_at: None,
            reviewed_by: None,
            reviewer_notes: None,
        }
    }
}
