use std::fmt;

use serde::{Deserialize, Serialize};

/// The coarse lifecycle stages of the overall job-search process, tracked
/// independently of which agents ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessState {
    Init,
    ProfileParsing,
    JobSearch,
    JobRanking,
    DocumentPrep,
    ContactDiscovery,
    Outreach,
    Application,
    Interview,
    Offer,
    Complete,
    Error,
}

impl ProcessState {
    /// The fixed set of states directly reachable from this one.
    ///
    /// The pipeline runs discovery → ranking → outreach → application →
    /// interview → offer → complete; any working stage can drop into
    /// `Error`, and both terminal states loop back to `Init` to model an
    /// explicit restart of the whole process.
    pub fn allowed_transitions(self) -> &'static [ProcessState] {
        use ProcessState::*;
        match self {
            Init => &[ProfileParsing, Error],
            ProfileParsing => &[JobSearch, Error],
            JobSearch => &[JobRanking, Error],
            JobRanking => &[DocumentPrep, ContactDiscovery, Error],
            DocumentPrep => &[ContactDiscovery, Application, Error],
            ContactDiscovery => &[Outreach, Error],
            Outreach => &[Application, Error],
            Application => &[Interview, Complete, Error],
            Interview => &[Offer, Error],
            Offer => &[Complete, Error],
            Complete => &[Init],
            Error => &[Init],
        }
    }
}

impl fmt::Display for ProcessState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ProcessState::Init => "init",
            ProcessState::ProfileParsing => "profile_parsing",
            ProcessState::JobSearch => "job_search",
            ProcessState::JobRanking => "job_ranking",
            ProcessState::DocumentPrep => "document_prep",
            ProcessState::ContactDiscovery => "contact_discovery",
            ProcessState::Outreach => "outreach",
            ProcessState::Application => "application",
            ProcessState::Interview => "interview",
            ProcessState::Offer => "offer",
            ProcessState::Complete => "complete",
            ProcessState::Error => "error",
        };
        write!(f, "{name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_states_loop_back_to_init() {
        assert_eq!(ProcessState::Complete.allowed_transitions(), &[ProcessState::Init]);
        assert_eq!(ProcessState::Error.allowed_transitions(), &[ProcessState::Init]);
    }

    #[test]
    fn every_working_state_can_fail() {
        use ProcessState::*;
        for state in [
            Init,
            ProfileParsing,
            JobSearch,
            JobRanking,
            DocumentPrep,
            ContactDiscovery,
            Outreach,
            Application,
            Interview,
            Offer,
        ] {
            assert!(
                state.allowed_transitions().contains(&Error),
                "{state} should be able to transition to error"
            );
        }
    }

    #[test]
    fn state_display_is_snake_case() {
        assert_eq!(ProcessState::Init.to_string(), "init");
        assert_eq!(ProcessState::ProfileParsing.to_string(), "profile_parsing");
        assert_eq!(ProcessState::ContactDiscovery.to_string(), "contact_discovery");
        assert_eq!(ProcessState::Complete.to_string(), "complete");
    }

    #[test]
    fn state_serialization_matches_display() {
        let json = serde_json::to_string(&ProcessState::JobRanking).unwrap();
        assert_eq!(json, "\"job_ranking\"");
        let back: ProcessState = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ProcessState::JobRanking);
    }
}
