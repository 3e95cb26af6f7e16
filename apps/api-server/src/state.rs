//! Application state - shared across all handlers.
//!
//! Every collaborator is constructed once at startup and injected here;
//! there are no ambient singletons.

use std::sync::Arc;

use sea_orm::DbConn;

use studyhall_core::ports::{
    CategoryRepository, CourseRepository, JobQueue, Mailer, PasswordService, PostRepository,
    SemesterRepository, TokenService, UserRepository,
};
use studyhall_infra::auth::{Argon2PasswordService, JwtTokenService};
use studyhall_infra::database::{
    PostgresCategoryRepository, PostgresCourseRepository, PostgresPostRepository,
    PostgresSemesterRepository, PostgresUserRepository,
};
use studyhall_infra::jobs::InMemoryJobQueue;
use studyhall_infra::mail::{InMemoryMailer, SmtpMailer};

use crate::config::{AppConfig, AppSettings};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserRepository>,
    pub posts: Arc<dyn PostRepository>,
    pub courses: Arc<dyn CourseRepository>,
    pub categories: Arc<dyn CategoryRepository>,
    pub semesters: Arc<dyn SemesterRepository>,
    pub tokens: Arc<dyn TokenService>,
    pub passwords: Arc<dyn PasswordService>,
    pub jobs: Arc<dyn JobQueue>,
    pub mailer: Arc<dyn Mailer>,
    pub settings: Arc<AppSettings>,
}

impl AppState {
    /// Build the application state around an established database connection.
    pub fn new(db: DbConn, config: &AppConfig) -> Self {
        let mailer: Arc<dyn Mailer> = match config.smtp.clone().map(SmtpMailer::new) {
            Some(Ok(smtp)) => Arc::new(smtp),
            Some(Err(e)) => {
                tracing::error!("Failed to build SMTP transport: {e}. Falling back to log-only mailer.");
                Arc::new(InMemoryMailer::new())
            }
            None => {
                tracing::warn!("SMTP_HOST not set. Outgoing email will only be logged.");
                Arc::new(InMemoryMailer::new())
            }
        };

        tracing::info!("Application state initialized");

        Self {
            users: Arc::new(PostgresUserRepository::new(db.clone())),
            posts: Arc::new(PostgresPostRepository::new(db.clone())),
            courses: Arc::new(PostgresCourseRepository::new(db.clone())),
            categories: Arc::new(PostgresCategoryRepository::new(db.clone())),
            semesters: Arc::new(PostgresSemesterRepository::new(db)),
            tokens: Arc::new(JwtTokenService::from_env()),
            passwords: Arc::new(Argon2PasswordService::new()),
            jobs: Arc::new(InMemoryJobQueue::from_env()),
            mailer,
            settings: Arc::new(config.settings.clone()),
        }
    }
}
