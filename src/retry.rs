//! Transient-error classification and exponential-backoff retry decisions.
//!
//! [`ErrorPolicy`] classifies an error as transient or fatal and computes a
//! retry decision; [`RecoveryAgent`] wraps the policy as an [`Agent`] so a
//! workflow can route a failed upstream step through it.

use std::collections::VecDeque;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::agent::{Agent, AgentName, Payload, WorkflowValue};

/// Substrings of an error message that mark it as transient.
const TRANSIENT_MESSAGE_MARKERS: &[&str] =
    &["timeout", "temporar", "rate limit", "connection", "quota"];

/// Error codes that mark an error as transient regardless of message.
const TRANSIENT_CODES: &[&str] = &["timeout", "retry", "throttled", "rate_limit"];

/// How many error records each policy instance keeps.
const ERROR_HISTORY_LIMIT: usize = 20;

/// Configuration for retry behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of retries before an error is final.
    pub max_retries: u32,
    /// Base delay in milliseconds for exponential backoff.
    pub base_delay_ms: u64,
    /// Multiplier applied per retry attempt.
    pub backoff_factor: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 1000,
            backoff_factor: 2.0,
        }
    }
}

impl RetryConfig {
    /// Delay before the retry following `retry_count` failed attempts:
    /// `base_delay * backoff_factor^retry_count`.
    pub fn delay_for_attempt(&self, retry_count: u32) -> Duration {
        let millis = self.base_delay_ms as f64 * self.backoff_factor.powi(retry_count as i32);
        Duration::from_millis(millis as u64)
    }
}

/// An error handed to the policy for classification.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub message: String,
    pub code: Option<String>,
}

impl ErrorInfo {
    pub fn from_message(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: None,
        }
    }

    /// Transient errors are worth retrying: timeouts, rate limits, and
    /// connectivity failures, matched case-insensitively on the message or
    /// exactly on the code.
    pub fn is_transient(&self) -> bool {
        let lowered = self.message.to_lowercase();
        if TRANSIENT_MESSAGE_MARKERS.iter().any(|m| lowered.contains(m)) {
            return true;
        }
        match &self.code {
            Some(code) => TRANSIENT_CODES.contains(&code.to_lowercase().as_str()),
            None => false,
        }
    }
}

/// One classified error, kept in the policy's bounded history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorRecord {
    pub message: String,
    pub code: Option<String>,
    pub retry_count: u32,
    pub transient: bool,
}

/// The policy's verdict for one error at one retry count.
#[derive(Debug, Clone, PartialEq)]
pub enum RetryDecision {
    /// Transient and under the retry budget: wait `delay`, then retry.
    Retry { next_retry_count: u32, delay: Duration },
    /// Fatal, or the retry budget is exhausted.
    Failed { transient: bool },
    /// No error was supplied; nothing to do.
    Noop,
}

/// Classifies errors and computes retry/backoff decisions, keeping the most
/// recent classifications per instance.
#[derive(Debug, Default)]
pub struct ErrorPolicy {
    config: RetryConfig,
    history: VecDeque<ErrorRecord>,
    last_error: Option<ErrorRecord>,
}

impl ErrorPolicy {
    pub fn new(config: RetryConfig) -> Self {
        Self {
            config,
            history: VecDeque::new(),
            last_error: None,
        }
    }

    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    /// The most recent classifications, oldest first, capped at 20.
    pub fn history(&self) -> impl Iterator<Item = &ErrorRecord> {
        self.history.iter()
    }

    pub fn last_error(&self) -> Option<&ErrorRecord> {
        self.last_error.as_ref()
    }

    /// Forget all recorded errors. Configuration is untouched.
    pub fn clear(&mut self) {
        self.history.clear();
        self.last_error = None;
    }

    /// Classify `error` at the given retry count and decide what to do next.
    /// Each supplied error is appended to the bounded history.
    pub fn evaluate(&mut self, error: Option<ErrorInfo>, retry_count: u32) -> RetryDecision {
        let Some(error) = error else {
            return RetryDecision::Noop;
        };

        let transient = error.is_transient();
        let record = ErrorRecord {
            message: error.message,
            code: error.code,
            retry_count,
            transient,
        };
        if self.history.len() == ERROR_HISTORY_LIMIT {
            self.history.pop_front();
        }
        self.history.push_back(record.clone());
        self.last_error = Some(record);

        if transient && retry_count < self.config.max_retries {
            RetryDecision::Retry {
                next_retry_count: retry_count + 1,
                delay: self.config.delay_for_attempt(retry_count),
            }
        } else {
            RetryDecision::Failed { transient }
        }
    }
}

/// An [`Agent`] that applies an [`ErrorPolicy`] to whatever failure it finds
/// in its input — either a failed upstream step or explicit `error` /
/// `message` / `code` fields in the payload — and emits a recovery payload.
pub struct RecoveryAgent {
    name: AgentName,
    policy: ErrorPolicy,
}

impl RecoveryAgent {
    pub fn new(config: RetryConfig) -> Self {
        Self {
            name: AgentName::new("recovery"),
            policy: ErrorPolicy::new(config),
        }
    }

    pub fn policy(&self) -> &ErrorPolicy {
        &self.policy
    }

    fn extract_error(input: &WorkflowValue) -> Option<ErrorInfo> {
        match input {
            WorkflowValue::Err { error, .. } => Some(ErrorInfo::from_message(error.clone())),
            WorkflowValue::Ok { data } => {
                let message = data
                    .get("error")
                    .or_else(|| data.get("message"))
                    .and_then(|v| v.as_str())?;
                let code = data
                    .get("code")
                    .and_then(|v| v.as_str())
                    .map(str::to_string);
                Some(ErrorInfo {
                    message: message.to_string(),
                    code,
                })
            }
        }
    }

    fn retry_count(input: &WorkflowValue) -> u32 {
        input
            .data()
            .and_then(|data| data.get("retry_count"))
            .and_then(|v| v.as_u64())
            .unwrap_or(0) as u32
    }
}

impl Default for RecoveryAgent {
    fn default() -> Self {
        Self::new(RetryConfig::default())
    }
}

#[async_trait]
impl Agent for RecoveryAgent {
    fn name(&self) -> &AgentName {
        &self.name
    }

    async fn execute(&mut self, input: WorkflowValue) -> anyhow::Result<Payload> {
        let retry_count = Self::retry_count(&input);
        let decision = self.policy.evaluate(Self::extract_error(&input), retry_count);

        let mut output = Payload::new();
        match decision {
            RetryDecision::Retry {
                next_retry_count,
                delay,
            } => {
                output.insert("status".into(), json!("retry"));
                output.insert(
                    "recovery".into(),
                    json!({
                        "action": "retry",
                        "retry_count": next_retry_count,
                        "delay_ms": delay.as_millis() as u64,
                        "transient": true,
                    }),
                );
            }
            RetryDecision::Failed { transient } => {
                output.insert("status".into(), json!("failed"));
                output.insert(
                    "recovery".into(),
                    json!({
                        "action": "halt",
                        "retry_count": retry_count,
                        "transient": transient,
                    }),
                );
            }
            RetryDecision::Noop => {
                output.insert("status".into(), json!("success"));
                output.insert(
                    "recovery".into(),
                    json!({
                        "action": "noop",
                        "retry_count": retry_count,
                        "transient": false,
                    }),
                );
            }
        }
        Ok(output)
    }

    fn reset(&mut self) {
        self.policy.clear();
    }
}
