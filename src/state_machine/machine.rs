use serde::{Deserialize, Serialize};
use tracing::debug;

use super::state::ProcessState;
use crate::agent::Payload;

/// Tracks the current process stage, the ordered history of visited stages,
/// and a context map merged additively on each successful transition.
///
/// Transitions only happen when explicitly invoked; nothing advances the
/// machine automatically. Concurrent callers sharing one instance need
/// external synchronization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateMachine {
    current: ProcessState,
    history: Vec<ProcessState>,
    context: Payload,
}

impl Default for StateMachine {
    fn default() -> Self {
        Self::new(ProcessState::Init)
    }
}

impl StateMachine {
    pub fn new(initial: ProcessState) -> Self {
        Self {
            current: initial,
            history: vec![initial],
            context: Payload::new(),
        }
    }

    pub fn current(&self) -> ProcessState {
        self.current
    }

    /// Every state visited so far, starting with the initial one.
    pub fn history(&self) -> &[ProcessState] {
        &self.history
    }

    pub fn context(&self) -> &Payload {
        &self.context
    }

    /// Whether `target` is directly reachable from the current state.
    pub fn can_transition_to(&self, target: ProcessState) -> bool {
        self.current.allowed_transitions().contains(&target)
    }

    /// Move to `target` if the transition table allows it, appending to the
    /// history and shallow-merging `context` (new keys overwrite same keys).
    /// Returns `false` and mutates nothing when the transition is not
    /// allowed.
    pub fn transition(&mut self, target: ProcessState, context: Option<Payload>) -> bool {
        if !self.can_transition_to(target) {
            debug!(from = %self.current, to = %target, "transition rejected");
            return false;
        }

        debug!(from = %self.current, to = %target, "transition");
        self.current = target;
        self.history.push(target);
        if let Some(extra) = context {
            for (key, value) in extra {
                self.context.insert(key, value);
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn context(entries: &[(&str, serde_json::Value)]) -> Payload {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn starts_at_initial_state_with_history() {
        let machine = StateMachine::default();
        assert_eq!(machine.current(), ProcessState::Init);
        assert_eq!(machine.history(), &[ProcessState::Init]);
        assert!(machine.context().is_empty());
    }

    #[test]
    fn allowed_transition_updates_state_and_history() {
        let mut machine = StateMachine::default();

        assert!(machine.transition(ProcessState::ProfileParsing, None));
        assert_eq!(machine.current(), ProcessState::ProfileParsing);
        assert_eq!(
            machine.history(),
            &[ProcessState::Init, ProcessState::ProfileParsing]
        );
    }

    #[test]
    fn rejected_transition_mutates_nothing() {
        let mut machine = StateMachine::default();

        let ok = machine.transition(
            ProcessState::Offer,
            Some(context(&[("should_not_land", json!(true))])),
        );

        assert!(!ok);
        assert_eq!(machine.current(), ProcessState::Init);
        assert_eq!(machine.history(), &[ProcessState::Init]);
        assert!(machine.context().is_empty());
    }

    #[test]
    fn every_allowed_target_succeeds_and_every_other_fails() {
        for initial in [
            ProcessState::Init,
            ProcessState::JobSearch,
            ProcessState::Application,
            ProcessState::Complete,
        ] {
            let allowed = initial.allowed_transitions();
            for target in [
                ProcessState::Init,
                ProcessState::ProfileParsing,
                ProcessState::JobSearch,
                ProcessState::JobRanking,
                ProcessState::DocumentPrep,
                ProcessState::ContactDiscovery,
                ProcessState::Outreach,
                ProcessState::Application,
                ProcessState::Interview,
                ProcessState::Offer,
                ProcessState::Complete,
                ProcessState::Error,
            ] {
                let mut machine = StateMachine::new(initial);
                assert_eq!(machine.can_transition_to(target), allowed.contains(&target));
                assert_eq!(machine.transition(target, None), allowed.contains(&target));
            }
        }
    }

    #[test]
    fn context_merges_additively_and_overwrites_same_keys() {
        let mut machine = StateMachine::default();

        machine.transition(
            ProcessState::ProfileParsing,
            Some(context(&[("resume", json!("parsed")), ("attempt", json!(1))])),
        );
        machine.transition(
            ProcessState::JobSearch,
            Some(context(&[("attempt", json!(2)), ("boards", json!(["a", "b"]))])),
        );

        assert_eq!(
            machine.context(),
            &context(&[
                ("resume", json!("parsed")),
                ("attempt", json!(2)),
                ("boards", json!(["a", "b"])),
            ])
        );
    }

    #[test]
    fn error_state_restarts_to_init() {
        let mut machine = StateMachine::default();
        assert!(machine.transition(ProcessState::Error, None));
        assert!(machine.transition(ProcessState::Init, None));
        assert_eq!(machine.current(), ProcessState::Init);
        assert_eq!(
            machine.history(),
            &[ProcessState::Init, ProcessState::Error, ProcessState::Init]
        );
    }

    #[test]
    fn full_pipeline_walk() {
        let mut machine = StateMachine::default();
        for target in [
            ProcessState::ProfileParsing,
            ProcessState::JobSearch,
            ProcessState::JobRanking,
            ProcessState::DocumentPrep,
            ProcessState::ContactDiscovery,
            ProcessState::Outreach,
            ProcessState::Application,
            ProcessState::Interview,
            ProcessState::Offer,
            ProcessState::Complete,
        ] {
            assert!(machine.transition(target, None), "expected edge to {target}");
        }
        assert_eq!(machine.current(), ProcessState::Complete);
        assert_eq!(machine.history().len(), 11);
    }
}
