use std::sync::Arc;

use chrono::Utc;
use reqwest::Method;
use serde_json::json;
use tracing::{debug, info};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;
use shared_models::auth::AccountRole;
use shared_models::pagination::{PageQuery, Paged};

use crate::models::{Blog, BlogError, BlogStatus, CreateBlogRequest, UpdateBlogRequest};

const PAGE_SIZE: i64 = 10;

pub struct BlogService {
    supabase: Arc<SupabaseClient>,
}

impl BlogService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: Arc::new(SupabaseClient::new(config)),
        }
    }

    pub async fn list_blogs(
        &self,
        query: &PageQuery,
        active_only: bool,
        auth_token: &str,
    ) -> Result<Paged<Blog>, BlogError> {
        let (range, order) = query.to_query_parts(PAGE_SIZE, "created_at");

        let status_filter = if active_only {
            format!("&status=eq.{}", BlogStatus::Active)
        } else {
            String::new()
        };
        let path = format!("/rest/v1/blogs?select=*{}&{}&{}", status_filter, order, range);

        let rows: Vec<Blog> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| BlogError::DatabaseError(e.to_string()))?;

        if rows.is_empty() {
            return Err(BlogError::BlogNotFound);
        }

        let count_filter = if active_only {
            format!("status=eq.{}", BlogStatus::Active)
        } else {
            String::new()
        };
        let total = self
            .supabase
            .count("blogs", &count_filter, Some(auth_token))
            .await
            .map_err(|e| BlogError::DatabaseError(e.to_string()))?;

        Ok(Paged::new(rows, total, PAGE_SIZE, query.page))
    }

    pub async fn search_blogs(
        &self,
        keyword: &str,
        page: i64,
        auth_token: &str,
    ) -> Result<Paged<Blog>, BlogError> {
        debug!("Searching active blogs for '{}'", keyword);

        let pattern = format!("*{}*", keyword);
        let filter = format!(
            "title=ilike.{}&status=eq.{}",
            urlencoding::encode(&pattern),
            BlogStatus::Active
        );
        let offset = page.max(0) * PAGE_SIZE;
        let path = format!(
            "/rest/v1/blogs?{}&order=created_at.desc&offset={}&limit={}",
            filter, offset, PAGE_SIZE
        );

        let rows: Vec<Blog> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| BlogError::DatabaseError(e.to_string()))?;

        if rows.is_empty() {
            return Err(BlogError::BlogNotFound);
        }

        let total = self
            .supabase
            .count("blogs", &filter, Some(auth_token))
            .await
            .map_err(|e| BlogError::DatabaseError(e.to_string()))?;

        Ok(Paged::new(rows, total, PAGE_SIZE, page))
    }

    pub async fn get_blog(
        &self,
        blog_id: Uuid,
        active_only: bool,
        auth_token: &str,
    ) -> Result<Blog, BlogError> {
        let status_filter = if active_only {
            format!("&status=eq.{}", BlogStatus::Active)
        } else {
            String::new()
        };
        let path = format!("/rest/v1/blogs?id=eq.{}{}", blog_id, status_filter);

        let rows: Vec<Blog> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| BlogError::DatabaseError(e.to_string()))?;

        rows.into_iter().next().ok_or(BlogError::BlogNotFound)
    }

    pub async fn create_blog(
        &self,
        request: CreateBlogRequest,
        auth_token: &str,
    ) -> Result<Blog, BlogError> {
        if request.title.trim().is_empty() || request.content.trim().is_empty() {
            return Err(BlogError::ValidationError(
                "Blog title and content must not be empty".to_string(),
            ));
        }

        self.verify_manager_exists(request.manager_id, auth_token)
            .await?;

        let row = json!({
            "manager_id": request.manager_id,
            "title": request.title,
            "content": request.content,
            "status": BlogStatus::Active,
            "created_at": Utc::now(),
        });

        let blog: Blog = self
            .supabase
            .insert("blogs", Some(auth_token), row)
            .await
            .map_err(|e| BlogError::DatabaseError(e.to_string()))?;

        info!("Blog {} created by manager {}", blog.id, blog.manager_id);
        Ok(blog)
    }

    pub async fn update_blog(
        &self,
        blog_id: Uuid,
        request: UpdateBlogRequest,
        auth_token: &str,
    ) -> Result<Blog, BlogError> {
        if request.title.trim().is_empty() || request.content.trim().is_empty() {
            return Err(BlogError::ValidationError(
                "Blog title and content must not be empty".to_string(),
            ));
        }

        let changes = json!({
            "title": request.title,
            "content": request.content,
            "status": request.status,
        });

        let updated: Vec<Blog> = self
            .supabase
            .update(
                "blogs",
                &format!("id=eq.{}", blog_id),
                Some(auth_token),
                changes,
            )
            .await
            .map_err(|e| BlogError::DatabaseError(e.to_string()))?;

        updated.into_iter().next().ok_or(BlogError::BlogNotFound)
    }

    /// Soft delete: blogs are retired by status, never removed.
    pub async fn deactivate_blog(&self, blog_id: Uuid, auth_token: &str) -> Result<(), BlogError> {
        let updated: Vec<Blog> = self
            .supabase
            .update(
                "blogs",
                &format!("id=eq.{}", blog_id),
                Some(auth_token),
                json!({ "status": BlogStatus::Inactive }),
            )
            .await
            .map_err(|e| BlogError::DatabaseError(e.to_string()))?;

        if updated.is_empty() {
            return Err(BlogError::BlogNotFound);
        }

        info!("Blog {} deactivated", blog_id);
        Ok(())
    }

    async fn verify_manager_exists(
        &self,
        manager_id: Uuid,
        auth_token: &str,
    ) -> Result<(), BlogError> {
        let filter = format!("id=eq.{}&role=eq.{}", manager_id, AccountRole::Manager);
        let count = self
            .supabase
            .count("accounts", &filter, Some(auth_token))
            .await
            .map_err(|e| BlogError::DatabaseError(e.to_string()))?;

        if count == 0 {
            return Err(BlogError::AuthorNotFound);
        }
        Ok(())
    }
}
