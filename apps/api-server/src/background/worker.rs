//! Background job handlers: lifecycle emails and account deletion.
//!
//! The queue delivers at-least-once, so every handler here is idempotent:
//! re-running a deletion against an already-removed user is a clean no-op
//! and sends no second email.

use studyhall_core::domain::User;
use studyhall_core::ports::{
    DeletionOutcome, Job, JobPayload, JobQueueError, JobResult, OutgoingEmail,
};

use crate::state::AppState;

/// Start the worker pool against the state's job queue.
pub async fn start(state: AppState) -> Result<(), JobQueueError> {
    let queue = state.jobs.clone();
    queue
        .start_worker(Box::new(move |job| {
            let state = state.clone();
            Box::pin(async move { handle_job(&state, job).await })
        }))
        .await
}

pub(crate) async fn handle_job(state: &AppState, job: Job) -> JobResult {
    let payload = match job.decode() {
        Ok(payload) => payload,
        Err(e) => return JobResult::Failed(format!("undecodable payload: {e}")),
    };

    match payload {
        JobPayload::VerificationEmail { email } => send_verification_email(state, &email).await,
        JobPayload::PasswordResetEmail { email } => send_password_reset_email(state, &email).await,
        JobPayload::AccountDeletion {
            user_id,
            remove_content,
        } => delete_account(state, user_id, remove_content).await,
    }
}

async fn load_user(state: &AppState, email: &str) -> Result<Option<User>, JobResult> {
    match state.users.find_by_email(email).await {
        Ok(user) => Ok(user),
        Err(e) => Err(JobResult::Retry(e.to_string())),
    }
}

async fn send(state: &AppState, email: OutgoingEmail) -> JobResult {
    match state.mailer.send(email).await {
        Ok(()) => JobResult::Success,
        Err(e) => JobResult::Retry(e.to_string()),
    }
}

async fn send_verification_email(state: &AppState, email: &str) -> JobResult {
    let user = match load_user(state, email).await {
        Ok(Some(user)) => user,
        // the account may have been deleted before the worker got here
        Ok(None) => return JobResult::Failed(format!("no user for verification email: {email}")),
        Err(result) => return result,
    };

    let token = match state.tokens.issue_verification(user.id) {
        Ok(token) => token,
        Err(e) => return JobResult::Failed(e.to_string()),
    };

    let verify_url = format!("{}/user/verify/{}", state.settings.base_url, token);
    send(
        state,
        OutgoingEmail {
            to: user.email,
            subject: format!("Verify Your {} Account", state.settings.site_name),
            body: format!(
                "Please verify your account. You will not be able to log in until you do. {verify_url}"
            ),
        },
    )
    .await
}

async fn send_password_reset_email(state: &AppState, email: &str) -> JobResult {
    let user = match load_user(state, email).await {
        Ok(Some(user)) => user,
        Ok(None) => return JobResult::Failed(format!("no user for password reset email: {email}")),
        Err(result) => return result,
    };

    // a magic-login token: the same shape as a session token
    let token = match state.tokens.issue(user.id, &user.email) {
        Ok(token) => token,
        Err(e) => return JobResult::Failed(e.to_string()),
    };

    let reset_url = format!("{}/user/reset/{}", state.settings.base_url, token);
    send(
        state,
        OutgoingEmail {
            to: user.email,
            subject: format!("Reset Your {} Password", state.settings.site_name),
            body: format!(
                "A password reset was requested for your account. Follow the link to sign in \
                 and choose a new password. {reset_url}"
            ),
        },
    )
    .await
}

async fn delete_account(state: &AppState, user_id: i32, remove_content: bool) -> JobResult {
    let user = match state.users.find_by_id(user_id).await {
        Ok(Some(user)) => user,
        // a retry after a completed run: nothing left to do
        Ok(None) => {
            tracing::info!(user_id, "Deletion job re-run for an already-removed user");
            return JobResult::Success;
        }
        Err(e) => return JobResult::Retry(e.to_string()),
    };

    let sentinel = match load_user(state, &state.settings.sentinel_email).await {
        Ok(Some(sentinel)) => sentinel,
        Ok(None) => return JobResult::Failed("sentinel deleted account is missing".to_string()),
        Err(result) => return result,
    };

    match state
        .users
        .reassign_content_and_delete(user.id, sentinel.id, remove_content)
        .await
    {
        Ok(DeletionOutcome::Deleted) => {}
        Ok(DeletionOutcome::AlreadyDeleted) => return JobResult::Success,
        Err(e) => return JobResult::Retry(e.to_string()),
    }

    let farewell = OutgoingEmail {
        to: user.email,
        subject: format!("Your {} Account Has Been Deleted", state.settings.site_name),
        body: "Your account and its data have been removed. This address is no longer \
               associated with an account."
            .to_string(),
    };
    // the user row is already gone; a retry here could never resend, so a
    // mail failure is logged rather than retried
    if let Err(e) = state.mailer.send(farewell).await {
        tracing::error!(user_id, "Failed to send deletion confirmation: {e}");
    }

    JobResult::Success
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use sea_orm::{DatabaseBackend, DbConn, MockDatabase, MockExecResult};

    use studyhall_infra::auth::{Argon2PasswordService, JwtConfig, JwtTokenService};
    use studyhall_infra::database::{
        PostgresCategoryRepository, PostgresCourseRepository, PostgresPostRepository,
        PostgresSemesterRepository, PostgresUserRepository,
    };
    use studyhall_infra::jobs::InMemoryJobQueue;
    use studyhall_infra::mail::InMemoryMailer;

    use crate::config::AppSettings;

    use super::*;

    fn test_state(db: DbConn, mailer: Arc<InMemoryMailer>) -> AppState {
        AppState {
            users: Arc::new(PostgresUserRepository::new(db.clone())),
            posts: Arc::new(PostgresPostRepository::new(db.clone())),
            courses: Arc::new(PostgresCourseRepository::new(db.clone())),
            categories: Arc::new(PostgresCategoryRepository::new(db.clone())),
            semesters: Arc::new(PostgresSemesterRepository::new(db)),
            tokens: Arc::new(JwtTokenService::new(JwtConfig {
                secret: "test-secret".to_string(),
                ..JwtConfig::default()
            })),
            passwords: Arc::new(Argon2PasswordService::new()),
            jobs: Arc::new(InMemoryJobQueue::from_env()),
            mailer,
            settings: Arc::new(AppSettings {
                email_domain: "uni.edu".to_string(),
                sentinel_email: "deletedaccount".to_string(),
                site_name: "Studyhall".to_string(),
                base_url: "http://localhost:3000".to_string(),
            }),
        }
    }

    fn user_row(id: i32, email: &str) -> studyhall_infra::database::entity::user::Model {
        studyhall_infra::database::entity::user::Model {
            id,
            email: email.to_string(),
            password_hash: "hash".to_string(),
            is_verified: true,
        }
    }

    #[tokio::test]
    async fn deletion_job_is_a_noop_for_a_missing_user() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<studyhall_infra::database::entity::user::Model>::new()])
            .into_connection();
        let mailer = Arc::new(InMemoryMailer::new());
        let state = test_state(db, mailer.clone());

        let result = handle_job(
            &state,
            Job::new(&JobPayload::AccountDeletion {
                user_id: 9,
                remove_content: true,
            }),
        )
        .await;

        assert!(matches!(result, JobResult::Success));
        // no duplicate confirmation email
        assert!(mailer.outbox().await.is_empty());
    }

    #[tokio::test]
    async fn deletion_job_reassigns_and_confirms_by_email() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            // worker: load the user, then the sentinel
            .append_query_results([vec![user_row(9, "leaving@uni.edu")]])
            .append_query_results([vec![user_row(1, "deletedaccount")]])
            // repo transaction: re-check the user still exists
            .append_query_results([vec![user_row(9, "leaving@uni.edu")]])
            .append_exec_results([
                MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 4,
                },
                MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 2,
                },
                MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                },
            ])
            .into_connection();
        let mailer = Arc::new(InMemoryMailer::new());
        let state = test_state(db, mailer.clone());

        let result = handle_job(
            &state,
            Job::new(&JobPayload::AccountDeletion {
                user_id: 9,
                remove_content: true,
            }),
        )
        .await;

        assert!(matches!(result, JobResult::Success));

        let outbox = mailer.outbox().await;
        assert_eq!(outbox.len(), 1);
        assert_eq!(outbox[0].to, "leaving@uni.edu");
        assert!(outbox[0].subject.contains("Deleted"));
    }

    #[tokio::test]
    async fn verification_email_links_a_verification_token() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![user_row(5, "new@uni.edu")]])
            .into_connection();
        let mailer = Arc::new(InMemoryMailer::new());
        let state = test_state(db, mailer.clone());

        let result = handle_job(
            &state,
            Job::new(&JobPayload::VerificationEmail {
                email: "new@uni.edu".to_string(),
            }),
        )
        .await;

        assert!(matches!(result, JobResult::Success));

        let outbox = mailer.outbox().await;
        assert_eq!(outbox.len(), 1);
        assert_eq!(outbox[0].subject, "Verify Your Studyhall Account");

        // the linked token must decode as a verification token for the user
        let token = outbox[0]
            .body
            .rsplit("/user/verify/")
            .next()
            .unwrap()
            .to_string();
        assert_eq!(state.tokens.verify_verification(&token).unwrap(), 5);
    }
}
