use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Comment entity - a reply on a post, append-ordered by creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: i32,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    pub post_id: i32,
    pub author_id: i32,
}

/// Payload for inserting a new comment row.
#[derive(Debug, Clone)]
pub struct NewComment {
    pub content: String,
    pub post_id: i32,
    pub author_id: i32,
}

/// A comment with its author materialized, as served in a thread.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentView {
    pub id: i32,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    pub author_email: String,
}
