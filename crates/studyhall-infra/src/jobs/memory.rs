//! In-memory job queue implementation.
//!
//! Jobs are stored in memory and processed by local workers; they are lost
//! on server restart. Delivery is at-least-once: handlers asking for a
//! retry are re-enqueued until their attempt budget runs out, so handlers
//! must be idempotent. With the default single worker, jobs are processed
//! strictly in enqueue order.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::{Mutex, mpsc};

use studyhall_core::ports::{Job, JobHandler, JobQueue, JobQueueError, JobResult};

/// In-memory job queue configuration.
#[derive(Debug, Clone)]
pub struct InMemoryJobQueueConfig {
    /// Maximum queue size (0 = unlimited).
    pub max_size: usize,
    /// Number of worker tasks. More than one gives up ordering.
    pub workers: usize,
}

impl Default for InMemoryJobQueueConfig {
    fn default() -> Self {
        Self {
            max_size: 10000,
            workers: 1,
        }
    }
}

/// In-memory job queue.
pub struct InMemoryJobQueue {
    pending: Arc<AtomicUsize>,
    config: InMemoryJobQueueConfig,
    job_sender: mpsc::Sender<Job>,
    job_receiver: Arc<Mutex<mpsc::Receiver<Job>>>,
}

impl InMemoryJobQueue {
    pub fn new(config: InMemoryJobQueueConfig) -> Self {
        let (tx, rx) = mpsc::channel(config.max_size.max(100));

        Self {
            pending: Arc::new(AtomicUsize::new(0)),
            config,
            job_sender: tx,
            job_receiver: Arc::new(Mutex::new(rx)),
        }
    }

    pub fn from_env() -> Self {
        let config = InMemoryJobQueueConfig {
            max_size: std::env::var("JOB_QUEUE_MAX_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(10000),
            workers: std::env::var("JOB_QUEUE_WORKERS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(1),
        };
        Self::new(config)
    }
}

#[async_trait]
impl JobQueue for InMemoryJobQueue {
    async fn enqueue(&self, job: Job) -> Result<(), JobQueueError> {
        if self.config.max_size > 0 && self.pending.load(Ordering::Relaxed) >= self.config.max_size
        {
            return Err(JobQueueError::QueueFull);
        }

        self.pending.fetch_add(1, Ordering::Relaxed);

        self.job_sender
            .send(job)
            .await
            .map_err(|e| JobQueueError::EnqueueError(e.to_string()))?;

        tracing::debug!(
            "Job enqueued. Queue size: {}",
            self.pending.load(Ordering::Relaxed)
        );

        Ok(())
    }

    async fn start_worker(&self, handler: JobHandler) -> Result<(), JobQueueError> {
        let handler: Arc<JobHandler> = Arc::new(handler);

        for worker_id in 0..self.config.workers {
            let handler = handler.clone();
            let receiver = self.job_receiver.clone();
            let pending = self.pending.clone();
            let sender = self.job_sender.clone();

            tokio::spawn(async move {
                tracing::info!("Job worker {} started", worker_id);

                loop {
                    let job = {
                        let mut rx = receiver.lock().await;
                        rx.recv().await
                    };

                    let Some(mut job) = job else {
                        tracing::info!("Job worker {} shutting down", worker_id);
                        break;
                    };

                    pending.fetch_sub(1, Ordering::Relaxed);

                    tracing::debug!(
                        worker = worker_id,
                        job_id = %job.id,
                        job_type = %job.job_type,
                        "Processing job"
                    );

                    job.attempts += 1;
                    match handler(job.clone()).await {
                        JobResult::Success => {
                            tracing::debug!(job_id = %job.id, "Job completed successfully");
                        }
                        JobResult::Retry(reason) => {
                            if job.attempts < job.max_attempts {
                                tracing::warn!(
                                    job_id = %job.id,
                                    attempt = job.attempts,
                                    max_attempts = job.max_attempts,
                                    reason = %reason,
                                    "Job failed, will retry"
                                );
                                pending.fetch_add(1, Ordering::Relaxed);
                                // back off briefly before the redelivery
                                let sender = sender.clone();
                                tokio::spawn(async move {
                                    tokio::time::sleep(tokio::time::Duration::from_millis(
                                        100 * u64::from(job.attempts),
                                    ))
                                    .await;
                                    if let Err(e) = sender.send(job).await {
                                        tracing::error!(
                                            "Failed to re-enqueue job for retry: {}",
                                            e
                                        );
                                    }
                                });
                            } else {
                                tracing::error!(
                                    job_id = %job.id,
                                    reason = %reason,
                                    "Job failed after max retries"
                                );
                            }
                        }
                        JobResult::Failed(reason) => {
                            tracing::error!(job_id = %job.id, reason = %reason, "Job failed permanently");
                        }
                    }
                }
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicU32;

    use studyhall_core::ports::JobPayload;

    use super::*;

    #[tokio::test]
    async fn jobs_reach_the_handler_in_enqueue_order() {
        let queue = InMemoryJobQueue::new(InMemoryJobQueueConfig {
            max_size: 100,
            workers: 1,
        });

        let (done_tx, mut done_rx) = mpsc::channel::<String>(10);
        queue
            .start_worker(Box::new(move |job| {
                let done_tx = done_tx.clone();
                Box::pin(async move {
                    let _ = done_tx.send(job.job_type).await;
                    JobResult::Success
                })
            }))
            .await
            .unwrap();

        queue
            .enqueue(Job::new(&JobPayload::VerificationEmail {
                email: "a@uni.edu".into(),
            }))
            .await
            .unwrap();
        queue
            .enqueue(Job::new(&JobPayload::AccountDeletion {
                user_id: 1,
                remove_content: false,
            }))
            .await
            .unwrap();

        assert_eq!(done_rx.recv().await.unwrap(), "verification_email");
        assert_eq!(done_rx.recv().await.unwrap(), "account_deletion");
    }

    #[tokio::test]
    async fn failed_jobs_are_retried_up_to_the_attempt_budget() {
        let queue = InMemoryJobQueue::new(InMemoryJobQueueConfig {
            max_size: 100,
            workers: 1,
        });

        let attempts = Arc::new(AtomicU32::new(0));
        let (done_tx, mut done_rx) = mpsc::channel::<u32>(10);
        let counter = attempts.clone();
        queue
            .start_worker(Box::new(move |_job| {
                let counter = counter.clone();
                let done_tx = done_tx.clone();
                Box::pin(async move {
                    let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
                    let _ = done_tx.send(n).await;
                    JobResult::Retry("transient".to_string())
                })
            }))
            .await
            .unwrap();

        queue
            .enqueue(
                Job::new(&JobPayload::PasswordResetEmail {
                    email: "a@uni.edu".into(),
                })
                .with_max_attempts(3),
            )
            .await
            .unwrap();

        // three deliveries, then the job is dropped
        assert_eq!(done_rx.recv().await.unwrap(), 1);
        assert_eq!(done_rx.recv().await.unwrap(), 2);
        assert_eq!(done_rx.recv().await.unwrap(), 3);
        tokio::time::sleep(tokio::time::Duration::from_millis(500)).await;
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }
}
