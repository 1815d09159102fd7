use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Blog {
    pub id: Uuid,
    pub manager_id: Uuid,
    pub title: String,
    pub content: String,
    pub status: BlogStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BlogStatus {
    Active,
    Inactive,
}

impl fmt::Display for BlogStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlogStatus::Active => write!(f, "active"),
            BlogStatus::Inactive => write!(f, "inactive"),
        }
    }
}

/// One level of threading: a comment either sits on the blog directly or
/// replies to a top-level comment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: Uuid,
    pub blog_id: Uuid,
    pub customer_id: Uuid,
    pub parent_comment_id: Option<Uuid>,
    pub content: String,
    pub status: CommentStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CommentStatus {
    Active,
    Removed,
}

impl fmt::Display for CommentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommentStatus::Active => write!(f, "active"),
            CommentStatus::Removed => write!(f, "removed"),
        }
    }
}

// ==============================================================================
// REQUEST MODELS
// ==============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct CreateBlogRequest {
    pub manager_id: Uuid,
    pub title: String,
    pub content: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateBlogRequest {
    pub title: String,
    pub content: String,
    pub status: BlogStatus,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchBlogsQuery {
    pub keyword: String,
    #[serde(default)]
    pub page: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateCommentRequest {
    pub customer_id: Uuid,
    pub parent_comment_id: Option<Uuid>,
    pub content: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateCommentRequest {
    pub content: String,
}

// ==============================================================================
// ERRORS
// ==============================================================================

#[derive(Error, Debug)]
pub enum BlogError {
    #[error("Blog not found")]
    BlogNotFound,

    #[error("Comment not found")]
    CommentNotFound,

    #[error("Author not found")]
    AuthorNotFound,

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}
