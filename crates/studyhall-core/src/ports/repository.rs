use async_trait::async_trait;

use crate::domain::{
    Category, Comment, Course, NewComment, NewPost, NewUser, Post, PostOverview, PostThread,
    Semester, User,
};
use crate::error::RepoError;
use crate::query::{Page, PostFilter};

/// Generic repository trait for the shared read path.
///
/// Callers get fully materialized values back; there is no lazy traversal.
#[async_trait]
pub trait BaseRepository<T, ID>: Send + Sync {
    /// Find an entity by its unique ID.
    async fn find_by_id(&self, id: ID) -> Result<Option<T>, RepoError>;
}

/// Course repository - read-only reference data.
#[async_trait]
pub trait CourseRepository: BaseRepository<Course, i32> {
    /// List courses, optionally filtered by a name substring.
    async fn list(&self, query: Option<&str>, limit: u64) -> Result<Vec<Course>, RepoError>;
}

/// Category repository - read-only reference data.
#[async_trait]
pub trait CategoryRepository: BaseRepository<Category, i32> {
    async fn list(&self) -> Result<Vec<Category>, RepoError>;
}

/// Semester repository - read-only reference data.
#[async_trait]
pub trait SemesterRepository: BaseRepository<Semester, i32> {
    /// All semesters, newest (highest id) first.
    async fn list_desc(&self) -> Result<Vec<Semester>, RepoError>;

    /// The current semester: the row with the highest id, if any exist.
    async fn current(&self) -> Result<Option<Semester>, RepoError>;
}

/// Outcome of the account deletion job's storage step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeletionOutcome {
    /// The user row was removed and content reassigned in this call.
    Deleted,
    /// The user row was already gone; nothing to do.
    AlreadyDeleted,
}

/// User repository with account lifecycle and enrollment methods.
#[async_trait]
pub trait UserRepository: BaseRepository<User, i32> {
    /// Find a user by their email address.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError>;

    /// Insert a new, unverified user.
    async fn create(&self, user: NewUser) -> Result<User, RepoError>;

    /// Flip the verified flag on.
    async fn set_verified(&self, user_id: i32) -> Result<(), RepoError>;

    /// Replace the stored password hash.
    async fn set_password_hash(&self, user_id: i32, password_hash: &str) -> Result<(), RepoError>;

    /// The user's enrolled courses, ordered by course name.
    async fn courses(&self, user_id: i32) -> Result<Vec<Course>, RepoError>;

    /// Enroll the user in a course; a no-op when already enrolled.
    async fn enroll(&self, user_id: i32, course_id: i32) -> Result<(), RepoError>;

    /// Withdraw the user from a course; a no-op when not enrolled.
    async fn withdraw(&self, user_id: i32, course_id: i32) -> Result<(), RepoError>;

    /// Atomically reassign every post and comment authored by `user_id` to
    /// the sentinel (redacting their content when `remove_content`), then
    /// delete the user row. Safe to re-run: a missing user row reports
    /// [`DeletionOutcome::AlreadyDeleted`].
    async fn reassign_content_and_delete(
        &self,
        user_id: i32,
        sentinel_id: i32,
        remove_content: bool,
    ) -> Result<DeletionOutcome, RepoError>;
}

/// Post repository - the query engine plus engagement writes.
#[async_trait]
pub trait PostRepository: BaseRepository<Post, i32> {
    /// Run the filter/sort/paginate query and materialize one result page.
    async fn search(&self, filter: &PostFilter) -> Result<Page<PostOverview>, RepoError>;

    /// Insert a new post and return its materialized thread.
    async fn create(&self, post: NewPost) -> Result<PostThread, RepoError>;

    /// Load a single post with its full comment thread.
    async fn thread(&self, post_id: i32) -> Result<Option<PostThread>, RepoError>;

    /// Find a comment row.
    async fn find_comment(&self, comment_id: i32) -> Result<Option<Comment>, RepoError>;

    /// Append a comment to a post.
    async fn add_comment(&self, comment: NewComment) -> Result<Comment, RepoError>;

    /// Rewrite a post's content to the redaction marker and reassign its
    /// author to the sentinel. Idempotent.
    async fn redact_post(&self, post_id: i32, sentinel_id: i32) -> Result<(), RepoError>;

    /// Same redaction for a single comment.
    async fn redact_comment(&self, comment_id: i32, sentinel_id: i32) -> Result<(), RepoError>;

    /// Set-insert a cheer; a no-op when the user already cheered the post.
    async fn cheer(&self, post_id: i32, user_id: i32) -> Result<(), RepoError>;
}
