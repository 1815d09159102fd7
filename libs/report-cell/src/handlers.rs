use std::sync::Arc;

use axum::{
    extract::{Extension, Query, State},
    Json,
};
use axum_extra::TypedHeader;
use headers::{authorization::Bearer, Authorization};
use serde_json::{json, Value};

use shared_config::AppConfig;
use shared_models::auth::{AccountRole, User};
use shared_models::error::AppError;
use shared_utils::extractor::require_role;

use crate::models::{PeriodQuery, ReportError};
use crate::services::stats::ReportService;

fn map_error(e: ReportError) -> AppError {
    match e {
        ReportError::ValidationError(msg) => AppError::ValidationError(msg),
        ReportError::DatabaseError(msg) => AppError::Database(msg),
    }
}

#[axum::debug_handler]
pub async fn consultation_statistics(
    State(state): State<Arc<AppConfig>>,
    Query(query): Query<PeriodQuery>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    require_role(&user, &[AccountRole::Admin, AccountRole::Manager])?;

    let service = ReportService::new(&state);
    let statistics = service
        .consultation_statistics(query.period_days, auth.token())
        .await
        .map_err(map_error)?;

    Ok(Json(json!({ "statistics": statistics })))
}

#[axum::debug_handler]
pub async fn testing_booking_statistics(
    State(state): State<Arc<AppConfig>>,
    Query(query): Query<PeriodQuery>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    require_role(&user, &[AccountRole::Admin, AccountRole::Manager])?;

    let service = ReportService::new(&state);
    let statistics = service
        .testing_booking_statistics(query.period_days, auth.token())
        .await
        .map_err(map_error)?;

    Ok(Json(json!({ "statistics": statistics })))
}

#[axum::debug_handler]
pub async fn total_account_count(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    require_role(&user, &[AccountRole::Admin, AccountRole::Manager])?;

    let service = ReportService::new(&state);
    let total = service
        .total_account_count(auth.token())
        .await
        .map_err(map_error)?;

    Ok(Json(json!({ "total_accounts": total })))
}
