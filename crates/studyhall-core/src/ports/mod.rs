//! Ports - trait definitions for external dependencies.
//! These are the "interfaces" that infrastructure must implement.

mod auth;
mod job_queue;
mod mailer;
mod repository;

pub use auth::{AuthError, PasswordService, SessionClaims, TokenService};
pub use job_queue::{Job, JobHandler, JobPayload, JobQueue, JobQueueError, JobResult};
pub use mailer::{MailError, Mailer, OutgoingEmail};
pub use repository::{
    BaseRepository, CategoryRepository, CourseRepository, DeletionOutcome, PostRepository,
    SemesterRepository, UserRepository,
};
