//! Job queue port - abstraction over the background job backend.
//!
//! Jobs are fire-and-forget from the request path and handled at-least-once
//! by the worker, so every handler must be idempotent.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;

/// Typed payloads for every background job this system enqueues.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum JobPayload {
    /// Send the account-verification email to a registered address.
    VerificationEmail { email: String },
    /// Send the password-reset (magic login) email.
    PasswordResetEmail { email: String },
    /// Reassign a user's content to the sentinel account and delete the row.
    AccountDeletion { user_id: i32, remove_content: bool },
}

impl JobPayload {
    pub fn job_type(&self) -> &'static str {
        match self {
            Self::VerificationEmail { .. } => "verification_email",
            Self::PasswordResetEmail { .. } => "password_reset_email",
            Self::AccountDeletion { .. } => "account_deletion",
        }
    }
}

/// A job envelope as carried by the queue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    /// Unique job identifier.
    pub id: String,
    /// Job type/name for routing to handlers.
    pub job_type: String,
    /// Serialized payload.
    pub payload: serde_json::Value,
    /// Number of delivery attempts so far.
    pub attempts: u32,
    /// Maximum delivery attempts.
    pub max_attempts: u32,
    /// When the job was created.
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl Job {
    pub fn new(payload: &JobPayload) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            job_type: payload.job_type().to_string(),
            payload: serde_json::to_value(payload)
                .unwrap_or(serde_json::Value::Null),
            attempts: 0,
            max_attempts: 3,
            created_at: chrono::Utc::now(),
        }
    }

    pub fn with_max_attempts(mut self, max: u32) -> Self {
        self.max_attempts = max;
        self
    }

    /// Decode the typed payload back out of the envelope.
    pub fn decode(&self) -> Result<JobPayload, serde_json::Error> {
        serde_json::from_value(self.payload.clone())
    }
}

/// Result of job processing.
#[derive(Debug)]
pub enum JobResult {
    /// Job completed successfully.
    Success,
    /// Job failed, should be retried.
    Retry(String),
    /// Job failed permanently, should not be retried.
    Failed(String),
}

/// Job handler function type.
pub type JobHandler =
    Box<dyn Fn(Job) -> Pin<Box<dyn Future<Output = JobResult> + Send>> + Send + Sync>;

/// Job queue trait - abstraction over job queue backends.
#[async_trait]
pub trait JobQueue: Send + Sync {
    /// Enqueue a job for processing.
    async fn enqueue(&self, job: Job) -> Result<(), JobQueueError>;

    /// Start processing jobs with the given handler.
    async fn start_worker(&self, handler: JobHandler) -> Result<(), JobQueueError>;
}

/// Job queue errors.
#[derive(Debug, thiserror::Error)]
pub enum JobQueueError {
    #[error("Failed to enqueue job: {0}")]
    EnqueueError(String),

    #[error("Queue is full")]
    QueueFull,

    #[error("Backend error: {0}")]
    Backend(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_round_trips_through_envelope() {
        let payload = JobPayload::AccountDeletion {
            user_id: 7,
            remove_content: true,
        };
        let job = Job::new(&payload);

        assert_eq!(job.job_type, "account_deletion");
        assert_eq!(job.decode().unwrap(), payload);
    }
}
