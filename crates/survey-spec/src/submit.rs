use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::answers::AnswerSet;
use crate::engine::{FormState, SubmitOutcome, SubmitRefusal, begin_submit, finish_submit};
use crate::spec::survey::SurveySpec;

/// Envelope handed to a [`SubmissionSink`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    pub survey_id: String,
    pub submitted_at: DateTime<Utc>,
    pub answers: AnswerSet,
}

impl Submission {
    pub fn new(survey: &SurveySpec, answers: AnswerSet) -> Self {
        Self {
            survey_id: survey.id_or_default().to_string(),
            submitted_at: Utc::now(),
            answers,
        }
    }
}

/// Acknowledgement returned by a sink once it accepted a submission.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Receipt {
    /// Sink specific handle, e.g. a file path or a server id.
    pub reference: Option<String>,
}

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("rejected by receiver with status {status}: {body}")]
    Rejected { status: u16, body: String },
    #[error("encode error: {0}")]
    Encode(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("timed out after {0:?}")]
    Timeout(Duration),
}

/// External collaborator responsible for transport and persistence.
#[async_trait]
pub trait SubmissionSink: Send + Sync {
    async fn submit(&self, submission: &Submission) -> Result<Receipt, SinkError>;
}

/// Retry schedule applied to failing sinks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    pub timeout: Option<Duration>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(5),
            timeout: Some(Duration::from_secs(30)),
        }
    }
}

impl RetryPolicy {
    /// A single attempt with no waiting.
    pub fn once() -> Self {
        Self {
            max_attempts: 1,
            initial_backoff: Duration::ZERO,
            max_backoff: Duration::ZERO,
            timeout: None,
        }
    }

    /// Delay before attempt `attempt + 1`, doubling from the initial backoff.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.initial_backoff
            .saturating_mul(factor)
            .min(self.max_backoff)
    }
}

/// Drives a submit attempt from the gate through the sink and back.
pub struct Submitter<S> {
    sink: S,
    policy: RetryPolicy,
}

impl<S: SubmissionSink> Submitter<S> {
    pub fn new(sink: S) -> Self {
        Self {
            sink,
            policy: RetryPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Validates, submits and records the outcome on `state`.
    ///
    /// Refusals leave the phase untouched. Sink failures are retried per the
    /// policy; when all attempts fail the session returns to editing.
    pub async fn submit(
        &self,
        survey: &SurveySpec,
        state: &mut FormState,
    ) -> Result<SubmitOutcome, SubmitRefusal> {
        let submission = begin_submit(survey, state)?;
        let outcome = self.deliver(&submission).await;
        finish_submit(state, outcome.clone());
        Ok(outcome)
    }

    async fn deliver(&self, submission: &Submission) -> SubmitOutcome {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.attempt(submission).await {
                Ok(receipt) => {
                    info!(attempt, survey_id = %submission.survey_id, "submission delivered");
                    return SubmitOutcome::Delivered(receipt);
                }
                Err(err) if attempt < max_attempts => {
                    let wait = self.policy.backoff(attempt);
                    warn!(attempt, error = %err, ?wait, "submission attempt failed, retrying");
                    tokio::time::sleep(wait).await;
                }
                Err(err) => {
                    warn!(attempt, error = %err, "submission failed");
                    return SubmitOutcome::Failed {
                        attempts: attempt,
                        reason: err.to_string(),
                    };
                }
            }
        }
    }

    async fn attempt(&self, submission: &Submission) -> Result<Receipt, SinkError> {
        match self.policy.timeout {
            Some(limit) => tokio::time::timeout(limit, self.sink.submit(submission))
                .await
                .map_err(|_| SinkError::Timeout(limit))?,
            None => self.sink.submit(submission).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles_and_caps() {
        let policy = RetryPolicy {
            max_attempts: 5,
            initial_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_millis(350),
            timeout: None,
        };
        assert_eq!(policy.backoff(1), Duration::from_millis(100));
        assert_eq!(policy.backoff(2), Duration::from_millis(200));
        assert_eq!(policy.backoff(3), Duration::from_millis(350));
        assert_eq!(policy.backoff(40), Duration::from_millis(350));
    }
}
