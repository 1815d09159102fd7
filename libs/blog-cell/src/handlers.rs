use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, State},
    Json,
};
use axum_extra::TypedHeader;
use headers::{authorization::Bearer, Authorization};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::{AccountRole, User};
use shared_models::error::AppError;
use shared_models::pagination::PageQuery;
use shared_utils::extractor::require_role;

use crate::models::{
    BlogError, CreateBlogRequest, CreateCommentRequest, SearchBlogsQuery, UpdateBlogRequest,
    UpdateCommentRequest,
};
use crate::services::blog::BlogService;
use crate::services::comment::CommentService;

fn map_error(e: BlogError) -> AppError {
    match e {
        BlogError::BlogNotFound => AppError::NotFound("Blog not found".to_string()),
        BlogError::CommentNotFound => AppError::NotFound("Comment not found".to_string()),
        BlogError::AuthorNotFound => AppError::NotFound("Manager not found".to_string()),
        BlogError::ValidationError(msg) => AppError::ValidationError(msg),
        BlogError::DatabaseError(msg) => AppError::Database(msg),
    }
}

fn is_back_office(user: &User) -> bool {
    matches!(
        user.role,
        Some(AccountRole::Admin) | Some(AccountRole::Manager)
    )
}

#[axum::debug_handler]
pub async fn list_blogs(
    State(state): State<Arc<AppConfig>>,
    Query(query): Query<PageQuery>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let service = BlogService::new(&state);

    // Customers only see ACTIVE blogs; back office sees everything.
    let active_only = !is_back_office(&user);
    let page = service
        .list_blogs(&query, active_only, auth.token())
        .await
        .map_err(|e| match e {
            BlogError::BlogNotFound => AppError::NotFound("No blogs found".to_string()),
            other => map_error(other),
        })?;

    Ok(Json(json!(page)))
}

#[axum::debug_handler]
pub async fn search_blogs(
    State(state): State<Arc<AppConfig>>,
    Query(query): Query<SearchBlogsQuery>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<Value>, AppError> {
    let service = BlogService::new(&state);
    let page = service
        .search_blogs(&query.keyword, query.page, auth.token())
        .await
        .map_err(|e| match e {
            BlogError::BlogNotFound => AppError::NotFound("No blogs found".to_string()),
            other => map_error(other),
        })?;

    Ok(Json(json!(page)))
}

#[axum::debug_handler]
pub async fn get_blog(
    State(state): State<Arc<AppConfig>>,
    Path(blog_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let service = BlogService::new(&state);
    let active_only = !is_back_office(&user);
    let blog = service
        .get_blog(blog_id, active_only, auth.token())
        .await
        .map_err(map_error)?;

    Ok(Json(json!(blog)))
}

#[axum::debug_handler]
pub async fn create_blog(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<CreateBlogRequest>,
) -> Result<Json<Value>, AppError> {
    require_role(&user, &[AccountRole::Admin, AccountRole::Manager])?;

    let service = BlogService::new(&state);
    let blog = service
        .create_blog(request, auth.token())
        .await
        .map_err(map_error)?;

    Ok(Json(json!({
        "success": true,
        "blog": blog,
        "message": "Blog created successfully"
    })))
}

#[axum::debug_handler]
pub async fn update_blog(
    State(state): State<Arc<AppConfig>>,
    Path(blog_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<UpdateBlogRequest>,
) -> Result<Json<Value>, AppError> {
    require_role(&user, &[AccountRole::Admin, AccountRole::Manager])?;

    let service = BlogService::new(&state);
    let blog = service
        .update_blog(blog_id, request, auth.token())
        .await
        .map_err(map_error)?;

    Ok(Json(json!({
        "success": true,
        "blog": blog,
        "message": "Blog updated successfully"
    })))
}

#[axum::debug_handler]
pub async fn deactivate_blog(
    State(state): State<Arc<AppConfig>>,
    Path(blog_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    require_role(&user, &[AccountRole::Admin, AccountRole::Manager])?;

    let service = BlogService::new(&state);
    service
        .deactivate_blog(blog_id, auth.token())
        .await
        .map_err(map_error)?;

    Ok(Json(json!({
        "success": true,
        "message": "Blog deactivated"
    })))
}

// ==============================================================================
// COMMENT HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn list_top_comments(
    State(state): State<Arc<AppConfig>>,
    Path(blog_id): Path<Uuid>,
    Query(query): Query<PageQuery>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<Value>, AppError> {
    let service = CommentService::new(&state);
    let page = service
        .top_comments(blog_id, &query, auth.token())
        .await
        .map_err(|e| match e {
            BlogError::CommentNotFound => {
                AppError::NotFound(format!("No comments found for blog {}", blog_id))
            }
            other => map_error(other),
        })?;

    Ok(Json(json!(page)))
}

#[axum::debug_handler]
pub async fn list_sub_comments(
    State(state): State<Arc<AppConfig>>,
    Path(comment_id): Path<Uuid>,
    Query(query): Query<PageQuery>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<Value>, AppError> {
    let service = CommentService::new(&state);
    let page = service
        .sub_comments(comment_id, &query, auth.token())
        .await
        .map_err(|e| match e {
            BlogError::CommentNotFound => {
                AppError::NotFound(format!("No replies found for comment {}", comment_id))
            }
            other => map_error(other),
        })?;

    Ok(Json(json!(page)))
}

#[axum::debug_handler]
pub async fn create_comment(
    State(state): State<Arc<AppConfig>>,
    Path(blog_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<CreateCommentRequest>,
) -> Result<Json<Value>, AppError> {
    // Customers comment as themselves.
    if !user.is_self(request.customer_id) && !is_back_office(&user) {
        return Err(AppError::Auth(
            "Not authorized to comment for this customer".to_string(),
        ));
    }

    let service = CommentService::new(&state);
    let comment = service
        .create_comment(blog_id, request, auth.token())
        .await
        .map_err(map_error)?;

    Ok(Json(json!({
        "success": true,
        "comment": comment,
        "message": "Comment posted"
    })))
}

#[axum::debug_handler]
pub async fn update_comment(
    State(state): State<Arc<AppConfig>>,
    Path(comment_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Json(request): Json<UpdateCommentRequest>,
) -> Result<Json<Value>, AppError> {
    let service = CommentService::new(&state);
    let comment = service
        .update_comment(comment_id, request, auth.token())
        .await
        .map_err(map_error)?;

    Ok(Json(json!({
        "success": true,
        "comment": comment,
        "message": "Comment updated"
    })))
}

#[axum::debug_handler]
pub async fn remove_comment(
    State(state): State<Arc<AppConfig>>,
    Path(comment_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<Value>, AppError> {
    let service = CommentService::new(&state);
    service
        .remove_comment(comment_id, auth.token())
        .await
        .map_err(map_error)?;

    Ok(Json(json!({
        "success": true,
        "message": "Comment removed"
    })))
}
