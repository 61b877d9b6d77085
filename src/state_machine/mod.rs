mod machine;
mod state;

pub use machine::StateMachine;
pub use state::ProcessState;
