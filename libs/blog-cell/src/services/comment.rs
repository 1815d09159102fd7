use std::sync::Arc;

use chrono::Utc;
use reqwest::Method;
use serde_json::json;
use tracing::{debug, info};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;
use shared_models::pagination::{PageQuery, Paged};

use crate::models::{
    Blog, BlogError, BlogStatus, Comment, CommentStatus, CreateCommentRequest,
    UpdateCommentRequest,
};

const TOP_COMMENT_PAGE_SIZE: i64 = 20;
const SUB_COMMENT_PAGE_SIZE: i64 = 15;

pub struct CommentService {
    supabase: Arc<SupabaseClient>,
}

impl CommentService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: Arc::new(SupabaseClient::new(config)),
        }
    }

    /// Top-level comments of a blog, newest-first by default.
    pub async fn top_comments(
        &self,
        blog_id: Uuid,
        query: &PageQuery,
        auth_token: &str,
    ) -> Result<Paged<Comment>, BlogError> {
        let (range, order) = query.to_query_parts(TOP_COMMENT_PAGE_SIZE, "created_at");
        let filter = format!(
            "blog_id=eq.{}&parent_comment_id=is.null&status=eq.{}",
            blog_id,
            CommentStatus::Active
        );
        let path = format!("/rest/v1/comments?{}&{}&{}", filter, order, range);

        let rows: Vec<Comment> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| BlogError::DatabaseError(e.to_string()))?;

        if rows.is_empty() {
            return Err(BlogError::CommentNotFound);
        }

        let total = self
            .supabase
            .count("comments", &filter, Some(auth_token))
            .await
            .map_err(|e| BlogError::DatabaseError(e.to_string()))?;

        Ok(Paged::new(rows, total, TOP_COMMENT_PAGE_SIZE, query.page))
    }

    /// Replies below one top-level comment.
    pub async fn sub_comments(
        &self,
        comment_id: Uuid,
        query: &PageQuery,
        auth_token: &str,
    ) -> Result<Paged<Comment>, BlogError> {
        let (range, order) = query.to_query_parts(SUB_COMMENT_PAGE_SIZE, "created_at");
        let filter = format!(
            "parent_comment_id=eq.{}&status=eq.{}",
            comment_id,
            CommentStatus::Active
        );
        let path = format!("/rest/v1/comments?{}&{}&{}", filter, order, range);

        let rows: Vec<Comment> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| BlogError::DatabaseError(e.to_string()))?;

        if rows.is_empty() {
            return Err(BlogError::CommentNotFound);
        }

        let total = self
            .supabase
            .count("comments", &filter, Some(auth_token))
            .await
            .map_err(|e| BlogError::DatabaseError(e.to_string()))?;

        Ok(Paged::new(rows, total, SUB_COMMENT_PAGE_SIZE, query.page))
    }

    /// Post a comment on an ACTIVE blog. Replies may only target top-level
    /// comments, keeping the thread one level deep.
    pub async fn create_comment(
        &self,
        blog_id: Uuid,
        request: CreateCommentRequest,
        auth_token: &str,
    ) -> Result<Comment, BlogError> {
        if request.content.trim().is_empty() {
            return Err(BlogError::ValidationError(
                "Comment content must not be empty".to_string(),
            ));
        }

        self.verify_blog_active(blog_id, auth_token).await?;

        if let Some(parent_id) = request.parent_comment_id {
            let parent = self.get_comment(parent_id, auth_token).await?;
            if parent.blog_id != blog_id {
                return Err(BlogError::ValidationError(
                    "Parent comment belongs to a different blog".to_string(),
                ));
            }
            if parent.parent_comment_id.is_some() {
                return Err(BlogError::ValidationError(
                    "Replies to replies are not supported".to_string(),
                ));
            }
        }

        let row = json!({
            "blog_id": blog_id,
            "customer_id": request.customer_id,
            "parent_comment_id": request.parent_comment_id,
            "content": request.content,
            "status": CommentStatus::Active,
            "created_at": Utc::now(),
        });

        let comment: Comment = self
            .supabase
            .insert("comments", Some(auth_token), row)
            .await
            .map_err(|e| BlogError::DatabaseError(e.to_string()))?;

        info!("Comment {} created on blog {}", comment.id, blog_id);
        Ok(comment)
    }

    pub async fn update_comment(
        &self,
        comment_id: Uuid,
        request: UpdateCommentRequest,
        auth_token: &str,
    ) -> Result<Comment, BlogError> {
        if request.content.trim().is_empty() {
            return Err(BlogError::ValidationError(
                "Comment content must not be empty".to_string(),
            ));
        }

        let updated: Vec<Comment> = self
            .supabase
            .update(
                "comments",
                &format!("id=eq.{}&status=eq.{}", comment_id, CommentStatus::Active),
                Some(auth_token),
                json!({ "content": request.content }),
            )
            .await
            .map_err(|e| BlogError::DatabaseError(e.to_string()))?;

        updated.into_iter().next().ok_or(BlogError::CommentNotFound)
    }

    /// Soft removal, keeping the row for thread integrity.
    pub async fn remove_comment(
        &self,
        comment_id: Uuid,
        auth_token: &str,
    ) -> Result<(), BlogError> {
        let updated: Vec<Comment> = self
            .supabase
            .update(
                "comments",
                &format!("id=eq.{}", comment_id),
                Some(auth_token),
                json!({ "status": CommentStatus::Removed }),
            )
            .await
            .map_err(|e| BlogError::DatabaseError(e.to_string()))?;

        if updated.is_empty() {
            return Err(BlogError::CommentNotFound);
        }

        debug!("Comment {} removed", comment_id);
        Ok(())
    }

    async fn get_comment(&self, comment_id: Uuid, auth_token: &str) -> Result<Comment, BlogError> {
        let path = format!("/rest/v1/comments?id=eq.{}", comment_id);
        let rows: Vec<Comment> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| BlogError::DatabaseError(e.to_string()))?;

        rows.into_iter().next().ok_or(BlogError::CommentNotFound)
    }

    async fn verify_blog_active(&self, blog_id: Uuid, auth_token: &str) -> Result<(), BlogError> {
        let path = format!("/rest/v1/blogs?id=eq.{}", blog_id);
        let rows: Vec<Blog> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| BlogError::DatabaseError(e.to_string()))?;

        let blog = rows.into_iter().next().ok_or(BlogError::BlogNotFound)?;
        if blog.status != BlogStatus::Active {
            return Err(BlogError::ValidationError(
                "Cannot comment on an inactive blog".to_string(),
            ));
        }
        Ok(())
    }
}
