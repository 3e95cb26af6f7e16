use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::{Category, CommentView, Course, Semester};

/// Placeholder written over redacted post and comment content.
pub const REDACTION_MARKER: &str = "[deleted]";

/// Post entity - a question or announcement on a course page.
///
/// Rows are never physically deleted: owner deletion rewrites the content
/// to [`REDACTION_MARKER`] and hands authorship to the sentinel account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: i32,
    pub title: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    pub is_archived: bool,
    pub due_date: Option<NaiveDate>,
    pub author_id: i32,
    pub course_id: i32,
    pub category_id: i32,
    pub semester_id: i32,
}

/// Payload for inserting a new post row.
#[derive(Debug, Clone)]
pub struct NewPost {
    pub title: String,
    pub content: String,
    pub due_date: Option<NaiveDate>,
    pub author_id: i32,
    pub course_id: i32,
    pub category_id: i32,
    pub semester_id: i32,
}

/// A post as it appears in a result page, with its references materialized.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostOverview {
    pub id: i32,
    pub title: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    pub is_archived: bool,
    pub due_date: Option<NaiveDate>,
    pub author_email: String,
    pub course: Course,
    pub category: Category,
    pub comment_count: u64,
    pub cheer_count: u64,
}

/// A single post with its full comment thread.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostThread {
    pub id: i32,
    pub title: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    pub is_archived: bool,
    pub due_date: Option<NaiveDate>,
    pub author_email: String,
    pub course: Course,
    pub category: Category,
    pub semester: Semester,
    pub comments: Vec<CommentView>,
    pub cheer_count: u64,
}
