//! Data Transfer Objects - request/response types for the API.
//!
//! Read payloads (courses, posts, threads) serialize the materialized
//! domain types from `studyhall-core` directly; the structs here cover the
//! write and auth surfaces.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Request to register a new account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
}

/// Request to login with email and password.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Request carrying only an email address (resend verification, forgot
/// password).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailRequest {
    pub email: String,
}

/// Request carrying a signed token (account verification, magic login).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenRequest {
    pub jwt: String,
}

/// Authenticated password change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangePasswordRequest {
    pub old_password: String,
    pub new_password: String,
}

/// Authenticated account removal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoveAccountRequest {
    pub password: String,
    pub remove_content: bool,
}

/// Session issued after login, verification, magic login, or refresh.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionResponse {
    pub email: String,
    pub jwt: String,
}

/// Plain acknowledgement with a human-readable message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Request to create a post.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPostRequest {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    pub category_id: i32,
    pub course_id: i32,
}

/// Request to append a comment to a post.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCommentRequest {
    pub content: String,
}
