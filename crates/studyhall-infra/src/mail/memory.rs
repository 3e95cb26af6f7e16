//! In-memory mailer.
//!
//! Fallback when SMTP is not configured (messages are logged, not sent)
//! and the recording transport used by tests.

use async_trait::async_trait;
use tokio::sync::Mutex;

use studyhall_core::ports::{MailError, Mailer, OutgoingEmail};

/// Mailer that records every message instead of sending it.
#[derive(Default)]
pub struct InMemoryMailer {
    outbox: Mutex<Vec<OutgoingEmail>>,
}

impl InMemoryMailer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything "sent" so far.
    pub async fn outbox(&self) -> Vec<OutgoingEmail> {
        self.outbox.lock().await.clone()
    }
}

#[async_trait]
impl Mailer for InMemoryMailer {
    async fn send(&self, email: OutgoingEmail) -> Result<(), MailError> {
        tracing::info!(
            to = %email.to,
            subject = %email.subject,
            "SMTP not configured; recording email instead of sending"
        );
        self.outbox.lock().await.push(email);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn records_sent_mail() {
        let mailer = InMemoryMailer::new();
        mailer
            .send(OutgoingEmail {
                to: "a@uni.edu".to_string(),
                subject: "Hello".to_string(),
                body: "World".to_string(),
            })
            .await
            .unwrap();

        let outbox = mailer.outbox().await;
        assert_eq!(outbox.len(), 1);
        assert_eq!(outbox[0].to, "a@uni.edu");
    }
}
