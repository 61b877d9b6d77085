use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{Duration, Utc};
use tracing::{debug, warn};

use super::request::{ActionKind, ApprovalRequest, ApprovalStatus, RequestId};
use crate::agent::Payload;

/// Callback retained with a request and executed exactly once, when and if
/// the request is approved. A failing callback is logged and discarded; it
/// never reverses the recorded decision.
pub type ApprovalCallback = Box<dyn Fn(&ApprovalRequest) -> anyhow::Result<()> + Send + Sync>;

/// All of one owner's requests, split by status.
#[derive(Debug, Default)]
pub struct OwnerRequests {
    pub pending: Vec<ApprovalRequest>,
    pub approved: Vec<ApprovalRequest>,
    pub rejected: Vec<ApprovalRequest>,
}

struct GateInner {
    requests: HashMap<RequestId, ApprovalRequest>,
    callbacks: HashMap<RequestId, ApprovalCallback>,
}

/// Stores human-decision requests and runs their callbacks on approval.
///
/// There is no process-wide instance; the hosting process constructs a gate
/// and passes it to whoever needs one. Requests live in a single map keyed
/// by id with a status field; the per-status listings are filtered views.
/// Each operation is individually atomic behind one internal lock, but
/// compound sequences across calls are not — a cancel racing an approve is
/// resolved by whichever mutation lands first, and the loser fails its
/// precondition check.
pub struct ApprovalGate {
    inner: Mutex<GateInner>,
}

impl Default for ApprovalGate {
    fn default() -> Self {
        Self::new()
    }
}

impl ApprovalGate {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(GateInner {
                requests: HashMap::new(),
                callbacks: HashMap::new(),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, GateInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// File a new pending request, retaining `callback` for execution on
    /// approval. Returns a snapshot of the stored request.
    pub fn create_request(
        &self,
        owner_id: impl Into<String>,
        action: ActionKind,
        title: impl Into<String>,
        description: impl Into<String>,
        data: Payload,
        callback: Option<ApprovalCallback>,
    ) -> ApprovalRequest {
        let request = ApprovalRequest::new(owner_id, action, title, description, data);
        debug!(id = %request.id, action = %request.action, "approval request created");

        let mut inner = self.lock();
        if let Some(callback) = callback {
            inner.callbacks.insert(request.id.clone(), callback);
        }
        inner.requests.insert(request.id.clone(), request.clone());
        request
    }

    /// Look up a request by id in any status.
    pub fn get(&self, id: &RequestId) -> Option<ApprovalRequest> {
        self.lock().requests.get(id).cloned()
    }

    /// Pending requests, oldest first, optionally filtered to one owner.
    pub fn list_pending(&self, owner_id: Option<&str>) -> Vec<ApprovalRequest> {
        let inner = self.lock();
        let mut pending: Vec<ApprovalRequest> = inner
            .requests
            .values()
            .filter(|r| r.status == ApprovalStatus::Pending)
            .filter(|r| owner_id.is_none_or(|owner| r.owner_id == owner))
            .cloned()
            .collect();
        pending.sort_by_key(|r| r.created_at);
        pending
    }

    /// Approve a pending request, recording reviewer metadata and — when
    /// `run_callback` is set — executing its stored callback once. Returns
    /// `false` if the request is missing or no longer pending.
    pub fn approve(
        &self,
        id: &RequestId,
        reviewed_by: impl Into<String>,
        notes: Option<String>,
        run_callback: bool,
    ) -> bool {
        let (request, callback) = {
            let mut inner = self.lock();
            let Some(request) = inner.requests.get_mut(id) else {
                return false;
            };
            if request.status != ApprovalStatus::Pending {
                return false;
            }

            request.status = ApprovalStatus::Approved;
            request.reviewed_at = Some(Utc::now());
            request.reviewed_by = Some(reviewed_by.into());
            request.reviewer_notes = notes;

            let snapshot = request.clone();
            // The decision is final, so the callback is consumed either way.
            let callback = inner.callbacks.remove(id);
            (snapshot, callback)
        };

        debug!(id = %id, "approval request approved");
        if run_callback
            && let Some(callback) = callback
            && let Err(err) = callback(&request)
        {
            warn!(id = %id, error = %err, "approval callback failed");
        }
        true
    }

    /// Reject a pending request; its callback is discarded and never runs.
    /// Returns `false` if the request is missing or no longer pending.
    pub fn reject(
        &self,
        id: &RequestId,
        reviewed_by: impl Into<String>,
        notes: Option<String>,
    ) -> bool {
        let mut inner = self.lock();
        let Some(request) = inner.requests.get_mut(id) else {
            return false;
        };
        if request.status != ApprovalStatus::Pending {
            return false;
        }

        request.status = ApprovalStatus::Rejected;
        request.reviewed_at = Some(Utc::now());
        request.reviewed_by = Some(reviewed_by.into());
        request.reviewer_notes = notes;
        inner.callbacks.remove(id);

        debug!(id = %id, "approval request rejected");
        true
    }

    /// Remove a still-pending request entirely, discarding its callback.
    /// Returns `false` for any id that is not currently pending.
    pub fn cancel(&self, id: &RequestId) -> bool {
        let mut inner = self.lock();
        let pending = matches!(
            inner.requests.get(id),
            Some(request) if request.status == ApprovalStatus::Pending
        );
        if !pending {
            return false;
        }
        inner.requests.remove(id);
        inner.callbacks.remove(id);
        debug!(id = %id, "approval request cancelled");
        true
    }

    /// All of `owner_id`'s requests, split by status.
    pub fn list_for_owner(&self, owner_id: &str) -> OwnerRequests {
        let inner = self.lock();
        let mut result = OwnerRequests::default();
        for request in inner.requests.values() {
            if request.owner_id != owner_id {
                continue;
            }
            match request.status {
                ApprovalStatus::Pending => result.pending.push(request.clone()),
                ApprovalStatus::Approved => result.approved.push(request.clone()),
                ApprovalStatus::Rejected => result.rejected.push(request.clone()),
                ApprovalStatus::Expired => {}
            }
        }
        result
    }

    /// Drop approved/rejected requests reviewed more than `days` ago.
    /// Pending requests are never touched; there is no automatic expiry.
    /// Returns the number of requests removed.
    pub fn purge_older_than(&self, days: i64) -> usize {
        let cutoff = Utc::now() - Duration::days(days);
        let mut inner = self.lock();
        let before = inner.requests.len();
        inner.requests.retain(|_, request| {
            let decided = matches!(
                request.status,
                ApprovalStatus::Approved | ApprovalStatus::Rejected
            );
            match (decided, request.reviewed_at) {
                (true, Some(reviewed_at)) => reviewed_at >= cutoff,
                _ => true,
            }
        });
        before - inner.requests.len()
    }
}
