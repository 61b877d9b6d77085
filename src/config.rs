//! Orchestrator configuration loaded from `jobflow.toml`.
//!
//! [`JobflowConfig`] holds the tunable parameters: retry/backoff settings,
//! the outbound-call rate limit, and the workflow policies to seed a
//! [`WorkflowPolicyManager`] with. Missing fields fall back to the same
//! defaults the types use; a missing file yields the full default config.

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::approval::{ActionKind, WorkflowPolicyManager};
use crate::error::JobflowError;
use crate::rate_limit::RateLimiter;
use crate::retry::RetryConfig;

/// Top-level configuration loaded from `jobflow.toml`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JobflowConfig {
    #[serde(default)]
    pub retry: RetrySettings,

    #[serde(default)]
    pub rate_limit: RateLimitSettings,

    /// Workflow policies to register on startup.
    #[serde(default)]
    pub workflows: Vec<WorkflowSettings>,
}

/// Retry/backoff settings.
#[derive(Debug, Clone, Deserialize)]
pub struct RetrySettings {
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    #[serde(default = "default_backoff_factor")]
    pub backoff_factor: f64,
}

/// Sliding-window rate limit settings.
#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitSettings {
    #[serde(default = "default_max_calls")]
    pub max_calls: usize,

    #[serde(default = "default_window_ms")]
    pub window_ms: u64,
}

/// One workflow policy entry.
#[derive(Debug, Clone, Deserialize)]
pub struct WorkflowSettings {
    pub id: String,
    pub name: String,
    pub action: ActionKind,

    #[serde(default = "default_requires_approval")]
    pub requires_approval: bool,

    #[serde(default)]
    pub auto_approve: HashMap<String, serde_json::Value>,
}

fn default_max_retries() -> u32 {
    3
}

fn default_base_delay_ms() -> u64 {
    1000
}

fn default_backoff_factor() -> f64 {
    2.0
}

fn default_max_calls() -> usize {
    10
}

fn default_window_ms() -> u64 {
    60_000
}

fn default_requires_approval() -> bool {
    true
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            base_delay_ms: default_base_delay_ms(),
            backoff_factor: default_backoff_factor(),
        }
    }
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            max_calls: default_max_calls(),
            window_ms: default_window_ms(),
        }
    }
}

impl JobflowConfig {
    /// Load configuration from `jobflow.toml` in the current directory,
    /// falling back to defaults if the file does not exist.
    pub fn load() -> Result<Self, JobflowError> {
        Self::load_from(Path::new("jobflow.toml"))
    }

    /// Load configuration from `path`, falling back to defaults if the file
    /// does not exist.
    pub fn load_from(path: &Path) -> Result<Self, JobflowError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    }

    pub fn retry_config(&self) -> RetryConfig {
        RetryConfig {
            max_retries: self.retry.max_retries,
            base_delay_ms: self.retry.base_delay_ms,
            backoff_factor: self.retry.backoff_factor,
        }
    }

    pub fn rate_limiter(&self) -> RateLimiter {
        RateLimiter::new(
            self.rate_limit.max_calls,
            Duration::from_millis(self.rate_limit.window_ms),
        )
    }

    /// Register every configured workflow policy on `manager`.
    pub fn register_workflows(&self, manager: &mut WorkflowPolicyManager) {
        for workflow in &self.workflows {
            manager.register(
                workflow.id.clone(),
                workflow.name.clone(),
                workflow.action,
                workflow.requires_approval,
                workflow.auto_approve.clone(),
            );
        }
    }
}
