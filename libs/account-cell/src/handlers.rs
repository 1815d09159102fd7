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
    AccountError, LoginRequest, RegisterAccountRequest, UpdateProfileRequest, UpdateStatusRequest,
};
use crate::services::account::AccountService;

fn map_error(e: AccountError) -> AppError {
    match e {
        AccountError::NotFound => AppError::NotFound("Account not found".to_string()),
        AccountError::InvalidCredentials => {
            AppError::Auth("Invalid username or password".to_string())
        }
        AccountError::UsernameTaken => AppError::Conflict("Username is already taken".to_string()),
        AccountError::ValidationError(msg) => AppError::ValidationError(msg),
        AccountError::DatabaseError(msg) => AppError::Database(msg),
    }
}

fn parse_role(role: &str) -> Result<AccountRole, AppError> {
    serde_json::from_value(json!(role))
        .map_err(|_| AppError::BadRequest(format!("Unknown account role: {}", role)))
}

#[axum::debug_handler]
pub async fn login(
    State(state): State<Arc<AppConfig>>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<Value>, AppError> {
    let service = AccountService::new(&state);
    let response = service.login(request).await.map_err(map_error)?;
    Ok(Json(json!(response)))
}

#[axum::debug_handler]
pub async fn register_customer(
    State(state): State<Arc<AppConfig>>,
    Json(request): Json<RegisterAccountRequest>,
) -> Result<Json<Value>, AppError> {
    // Self-service registration covers customers only; everything else goes
    // through the admin endpoint.
    if !matches!(request, RegisterAccountRequest::Customer(_)) {
        return Err(AppError::Auth(
            "Only customer accounts can self-register".to_string(),
        ));
    }

    let service = AccountService::new(&state);
    let profile = service
        .register(request, &state.supabase_anon_key)
        .await
        .map_err(map_error)?;

    Ok(Json(json!({
        "success": true,
        "account": profile,
        "message": "Account registered successfully"
    })))
}

#[axum::debug_handler]
pub async fn register_account(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<RegisterAccountRequest>,
) -> Result<Json<Value>, AppError> {
    require_role(&user, &[AccountRole::Admin, AccountRole::Manager])?;

    let service = AccountService::new(&state);
    let profile = service
        .register(request, auth.token())
        .await
        .map_err(map_error)?;

    Ok(Json(json!({
        "success": true,
        "account": profile,
        "message": "Account registered successfully"
    })))
}

#[axum::debug_handler]
pub async fn list_accounts(
    State(state): State<Arc<AppConfig>>,
    Path(role): Path<String>,
    Query(query): Query<PageQuery>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    require_role(&user, &[AccountRole::Admin, AccountRole::Manager])?;

    let role = parse_role(&role)?;
    let service = AccountService::new(&state);
    let page = service
        .list_by_role(role, &query, auth.token())
        .await
        .map_err(|e| match e {
            AccountError::NotFound => AppError::NotFound("No accounts found".to_string()),
            other => map_error(other),
        })?;

    Ok(Json(json!(page)))
}

#[axum::debug_handler]
pub async fn get_account(
    State(state): State<Arc<AppConfig>>,
    Path((role, account_id)): Path<(String, Uuid)>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let role = parse_role(&role)?;

    // A caller may always read their own profile; anything else requires a
    // back-office role.
    if !user.is_self(account_id) {
        require_role(&user, &[AccountRole::Admin, AccountRole::Manager])?;
    }

    let service = AccountService::new(&state);
    let profile = service
        .get_profile(role, account_id, auth.token())
        .await
        .map_err(map_error)?;

    Ok(Json(json!(profile)))
}

#[axum::debug_handler]
pub async fn update_account(
    State(state): State<Arc<AppConfig>>,
    Path((role, account_id)): Path<(String, Uuid)>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<UpdateProfileRequest>,
) -> Result<Json<Value>, AppError> {
    let role = parse_role(&role)?;

    if !user.is_self(account_id) {
        require_role(&user, &[AccountRole::Admin, AccountRole::Manager])?;
    }

    let service = AccountService::new(&state);
    let profile = service
        .update_profile(role, account_id, request, auth.token())
        .await
        .map_err(map_error)?;

    Ok(Json(json!({
        "success": true,
        "account": profile,
        "message": "Account updated successfully"
    })))
}

#[axum::debug_handler]
pub async fn update_account_status(
    State(state): State<Arc<AppConfig>>,
    Path((role, account_id)): Path<(String, Uuid)>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<UpdateStatusRequest>,
) -> Result<Json<Value>, AppError> {
    require_role(&user, &[AccountRole::Admin, AccountRole::Manager])?;

    let role = parse_role(&role)?;
    let service = AccountService::new(&state);
    service
        .update_status(role, account_id, request.status, auth.token())
        .await
        .map_err(map_error)?;

    Ok(Json(json!({
        "success": true,
        "message": "Account status updated"
    })))
}

#[axum::debug_handler]
pub async fn list_active_consultants(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<Value>, AppError> {
    let service = AccountService::new(&state);
    let consultants = service
        .list_active_consultants(auth.token())
        .await
        .map_err(|e| match e {
            AccountError::NotFound => AppError::NotFound("No consultants found".to_string()),
            other => map_error(other),
        })?;

    Ok(Json(json!({ "consultants": consultants })))
}

#[axum::debug_handler]
pub async fn get_consultant_certificates(
    State(state): State<Arc<AppConfig>>,
    Path(consultant_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<Value>, AppError> {
    let service = AccountService::new(&state);
    let certificates = service
        .certificates_of(consultant_id, auth.token())
        .await
        .map_err(map_error)?;

    Ok(Json(json!({ "certificates": certificates })))
}
