use thiserror::Error;

/// Errors surfaced by the orchestration core.
///
/// Most orchestration outcomes are ordinary return values (a rejected state
/// transition is `false`, a missing approval request is `None`); this enum
/// covers the cases the caller genuinely cannot proceed from.
#[derive(Debug, Error)]
pub enum JobflowError {
    #[error("Unknown workflow: {0}")]
    UnknownWorkflow(String),

    #[error("Workflow callback failed: {0}")]
    Callback(#[source] anyhow::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}
