//! Bounded-retry client for the external text moderation API.
//!
//! Unlike the store-backed checks, this path fails closed: when no
//! classification can be obtained the caller gets a [`ModerationFailure`],
//! which the gate turns into a `service_unavailable` denial.

pub mod openai;

use crate::error::{ModerationError, ModerationFailure};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, warn};

pub use openai::{OpenAiTransport, DEFAULT_ENDPOINT, DEFAULT_MODEL};

/// Status code and body of one moderation response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

/// Sends a single moderation request, without retries
#[async_trait]
pub trait ModerationTransport: Send + Sync {
    async fn send(&self, input: &str) -> Result<RawResponse, ModerationError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub flagged: bool,
}

/// What one attempt tells the retry loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    Classified(Classification),
    Retryable,
    Fatal { status: u16 },
}

/// Classify one HTTP response
///
/// Only `results[0].flagged` decides the outcome. When that field cannot be
/// read the input counts as not flagged, since the call itself succeeded.
/// 429 is retryable; every other status is fatal.
pub fn classify_response(response: &RawResponse) -> AttemptOutcome {
    match response.status {
        200..=299 => {
            let body: Value = serde_json::from_str(&response.body).unwrap_or_else(|e| {
                warn!(error = %e, "Unreadable moderation response body, treating as not flagged");
                Value::Null
            });

            let flagged = match body.pointer("/results/0/flagged").and_then(Value::as_bool) {
                Some(flagged) => flagged,
                None => {
                    warn!("Moderation response has no readable flagged field, treating as not flagged");
                    false
                }
            };
            if flagged {
                debug!(categories = ?tripped_categories(&body), "Moderation flagged input");
            }
            AttemptOutcome::Classified(Classification { flagged })
        }
        429 => AttemptOutcome::Retryable,
        status => AttemptOutcome::Fatal { status },
    }
}

/// Category names set to `true` on the first result; logging only
fn tripped_categories(body: &Value) -> Vec<&str> {
    body.pointer("/results/0/categories")
        .and_then(Value::as_object)
        .map(|categories| {
            categories
                .iter()
                .filter(|(_, hit)| hit.as_bool() == Some(true))
                .map(|(name, _)| name.as_str())
                .collect()
        })
        .unwrap_or_default()
}

/// Attempt count and the delays between attempts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    /// Delay after attempt `n` is `delays[n - 1]`; the last entry repeats if short
    pub delays: Vec<Duration>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delays: vec![Duration::from_millis(300), Duration::from_millis(800)],
        }
    }
}

impl RetryPolicy {
    /// Delay before the next attempt, or `None` once `attempt` was the last one
    pub fn delay_after(&self, attempt: u32) -> Option<Duration> {
        if attempt >= self.max_attempts {
            return None;
        }
        let index = attempt.saturating_sub(1) as usize;
        Some(
            self.delays
                .get(index)
                .or(self.delays.last())
                .copied()
                .unwrap_or_default(),
        )
    }
}

#[derive(Clone)]
pub struct ModerationClient {
    transport: Arc<dyn ModerationTransport>,
    policy: RetryPolicy,
}

impl ModerationClient {
    pub fn new(transport: Arc<dyn ModerationTransport>, policy: RetryPolicy) -> Self {
        Self { transport, policy }
    }

    /// Classify `text`, retrying rate-limited and unreachable attempts
    pub async fn classify(&self, text: &str) -> Result<Classification, ModerationFailure> {
        let mut attempt = 0;
        loop {
            attempt += 1;

            let outcome = match self.transport.send(text).await {
                Ok(response) => {
                    if !(200..=299).contains(&response.status) {
                        error!(
                            status = response.status,
                            body = %response.body,
                            "Moderation request failed"
                        );
                    }
                    classify_response(&response)
                }
                Err(e) => {
                    warn!(error = %e, attempt, "Moderation request did not complete");
                    AttemptOutcome::Retryable
                }
            };
            record_attempt(&outcome);

            match outcome {
                AttemptOutcome::Classified(classification) => return Ok(classification),
                AttemptOutcome::Fatal { status } => {
                    return Err(ModerationFailure::Fatal { status });
                }
                AttemptOutcome::Retryable => match self.policy.delay_after(attempt) {
                    Some(delay) => tokio::time::sleep(delay).await,
                    None => return Err(ModerationFailure::Exhausted { attempts: attempt }),
                },
            }
        }
    }
}

fn record_attempt(outcome: &AttemptOutcome) {
    let result = match outcome {
        AttemptOutcome::Classified(Classification { flagged: true }) => "flagged",
        AttemptOutcome::Classified(Classification { flagged: false }) => "clean",
        AttemptOutcome::Retryable => "retryable",
        AttemptOutcome::Fatal { .. } => "fatal",
    };
    metrics::counter!("moderation_attempts_total", "result" => result).increment(1);
}
