use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, State},
    Json,
};
use axum_extra::TypedHeader;
use chrono::NaiveDate;
use headers::{authorization::Bearer, Authorization};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::{AccountRole, User};
use shared_models::domain::Gender;
use shared_models::error::AppError;
use shared_models::pagination::PageQuery;
use shared_utils::extractor::require_role;

use crate::models::{
    CompleteConsultationRequest, ConsultationError, CreateConsultationTypeRequest,
    EvaluateConsultationRequest, RegisterConsultationRequest, RescheduleConsultationRequest,
};
use crate::services::consultation::ConsultationService;
use crate::services::types::ConsultationTypeService;

fn map_error(e: ConsultationError) -> AppError {
    match e {
        ConsultationError::NotFound => AppError::NotFound("Consultation not found".to_string()),
        ConsultationError::TypeNotFound => {
            AppError::NotFound("Consultation type not found".to_string())
        }
        ConsultationError::CustomerNotFound => AppError::NotFound("Customer not found".to_string()),
        ConsultationError::ConsultantNotFound => {
            AppError::NotFound("Consultant not found".to_string())
        }
        ConsultationError::SlotConflict => {
            AppError::Conflict("Consultation has already been booked".to_string())
        }
        ConsultationError::InvalidTransition(err) => AppError::BadRequest(err.to_string()),
        ConsultationError::ValidationError(msg) => AppError::ValidationError(msg),
        ConsultationError::DatabaseError(msg) => AppError::Database(msg),
    }
}

#[derive(Debug, Deserialize)]
pub struct TypesQuery {
    pub gender: Option<Gender>,
}

#[derive(Debug, Deserialize)]
pub struct DayScheduleQuery {
    pub date: NaiveDate,
}

#[axum::debug_handler]
pub async fn list_consultation_types(
    State(state): State<Arc<AppConfig>>,
    Query(query): Query<TypesQuery>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<Value>, AppError> {
    let service = ConsultationTypeService::new(&state);

    let types = match query.gender {
        Some(gender) => service.list_for_gender(gender, auth.token()).await,
        None => service.list_all(auth.token()).await,
    }
    .map_err(|e| match e {
        ConsultationError::TypeNotFound => {
            AppError::NotFound("No consultation types found".to_string())
        }
        other => map_error(other),
    })?;

    Ok(Json(json!({ "consultation_types": types })))
}

#[axum::debug_handler]
pub async fn create_consultation_type(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<CreateConsultationTypeRequest>,
) -> Result<Json<Value>, AppError> {
    require_role(&user, &[AccountRole::Admin, AccountRole::Manager])?;

    let service = ConsultationTypeService::new(&state);
    let created = service
        .create(request, auth.token())
        .await
        .map_err(map_error)?;

    Ok(Json(json!({
        "success": true,
        "consultation_type": created,
        "message": "Consultation type created"
    })))
}

#[axum::debug_handler]
pub async fn retire_consultation_type(
    State(state): State<Arc<AppConfig>>,
    Path(type_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    require_role(&user, &[AccountRole::Admin, AccountRole::Manager])?;

    let service = ConsultationTypeService::new(&state);
    service
        .retire(type_id, auth.token())
        .await
        .map_err(map_error)?;

    Ok(Json(json!({
        "success": true,
        "message": "Consultation type retired"
    })))
}

#[axum::debug_handler]
pub async fn register_consultation(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<RegisterConsultationRequest>,
) -> Result<Json<Value>, AppError> {
    // Customers book for themselves; back office may book on their behalf.
    if !user.is_self(request.customer_id) {
        require_role(&user, &[AccountRole::Admin, AccountRole::Manager, AccountRole::Staff])?;
    }

    let service = ConsultationService::new(&state);
    let consultation = service
        .register_consultation(request, auth.token())
        .await
        .map_err(map_error)?;

    Ok(Json(json!({
        "success": true,
        "consultation": consultation,
        "message": "Consultation booked successfully"
    })))
}

#[axum::debug_handler]
pub async fn get_consultation(
    State(state): State<Arc<AppConfig>>,
    Path(consultation_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let service = ConsultationService::new(&state);
    let consultation = service
        .get_consultation(consultation_id, auth.token())
        .await
        .map_err(map_error)?;

    let is_participant =
        user.is_self(consultation.customer_id) || user.is_self(consultation.consultant_id);
    if !is_participant {
        require_role(&user, &[AccountRole::Admin, AccountRole::Manager, AccountRole::Staff])?;
    }

    Ok(Json(json!(consultation)))
}

#[axum::debug_handler]
pub async fn get_consultation_payment(
    State(state): State<Arc<AppConfig>>,
    Path(consultation_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<Value>, AppError> {
    let service = ConsultationService::new(&state);
    let payment = service
        .get_payment(consultation_id, auth.token())
        .await
        .map_err(|e| match e {
            ConsultationError::NotFound => {
                AppError::NotFound("Consultation payment not found".to_string())
            }
            other => map_error(other),
        })?;

    Ok(Json(json!(payment)))
}

#[axum::debug_handler]
pub async fn reschedule_consultation(
    State(state): State<Arc<AppConfig>>,
    Path(consultation_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Json(request): Json<RescheduleConsultationRequest>,
) -> Result<Json<Value>, AppError> {
    let service = ConsultationService::new(&state);
    let consultation = service
        .reschedule_consultation(consultation_id, request, auth.token())
        .await
        .map_err(map_error)?;

    Ok(Json(json!({
        "success": true,
        "consultation": consultation,
        "message": "Consultation rescheduled"
    })))
}

#[axum::debug_handler]
pub async fn complete_consultation(
    State(state): State<Arc<AppConfig>>,
    Path(consultation_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<CompleteConsultationRequest>,
) -> Result<Json<Value>, AppError> {
    require_role(
        &user,
        &[AccountRole::Admin, AccountRole::Manager, AccountRole::Consultant],
    )?;

    let service = ConsultationService::new(&state);
    let consultation = service
        .complete_consultation(consultation_id, request, auth.token())
        .await
        .map_err(map_error)?;

    Ok(Json(json!({
        "success": true,
        "consultation": consultation,
        "message": "Consultation completed"
    })))
}

#[axum::debug_handler]
pub async fn cancel_consultation(
    State(state): State<Arc<AppConfig>>,
    Path(consultation_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<Value>, AppError> {
    let service = ConsultationService::new(&state);
    let consultation = service
        .cancel_consultation(consultation_id, auth.token())
        .await
        .map_err(map_error)?;

    Ok(Json(json!({
        "success": true,
        "consultation": consultation,
        "message": "Consultation cancelled"
    })))
}

#[axum::debug_handler]
pub async fn evaluate_consultation(
    State(state): State<Arc<AppConfig>>,
    Path(consultation_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<EvaluateConsultationRequest>,
) -> Result<Json<Value>, AppError> {
    let service = ConsultationService::new(&state);

    let consultation = service
        .get_consultation(consultation_id, auth.token())
        .await
        .map_err(map_error)?;
    if !user.is_self(consultation.customer_id) {
        return Err(AppError::Auth(
            "Only the booking customer can rate a consultation".to_string(),
        ));
    }

    let updated = service
        .evaluate_consultation(consultation_id, request, auth.token())
        .await
        .map_err(map_error)?;

    Ok(Json(json!({
        "success": true,
        "consultation": updated,
        "message": "Thank you for your feedback"
    })))
}

#[axum::debug_handler]
pub async fn get_consultant_day_schedule(
    State(state): State<Arc<AppConfig>>,
    Path(consultant_id): Path<Uuid>,
    Query(query): Query<DayScheduleQuery>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<Value>, AppError> {
    let service = ConsultationService::new(&state);
    let schedule = service
        .schedule()
        .day_schedule(consultant_id, query.date, auth.token())
        .await
        .map_err(map_error)?;

    Ok(Json(json!(schedule)))
}

#[axum::debug_handler]
pub async fn list_customer_consultations(
    State(state): State<Arc<AppConfig>>,
    Path(customer_id): Path<Uuid>,
    Query(query): Query<PageQuery>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    if !user.is_self(customer_id) {
        require_role(&user, &[AccountRole::Admin, AccountRole::Manager, AccountRole::Staff])?;
    }

    let service = ConsultationService::new(&state);
    let page = service
        .list_by_customer(customer_id, &query, auth.token())
        .await
        .map_err(|e| match e {
            ConsultationError::NotFound => AppError::NotFound("No consultations found".to_string()),
            other => map_error(other),
        })?;

    Ok(Json(json!(page)))
}

#[axum::debug_handler]
pub async fn list_consultant_consultations(
    State(state): State<Arc<AppConfig>>,
    Path(consultant_id): Path<Uuid>,
    Query(query): Query<PageQuery>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    if !user.is_self(consultant_id) {
        require_role(&user, &[AccountRole::Admin, AccountRole::Manager])?;
    }

    let service = ConsultationService::new(&state);
    let page = service
        .list_by_consultant(consultant_id, &query, auth.token())
        .await
        .map_err(|e| match e {
            ConsultationError::NotFound => AppError::NotFound("No consultations found".to_string()),
            other => map_error(other),
        })?;

    Ok(Json(json!(page)))
}
