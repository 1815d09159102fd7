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
    BookingError, CompleteBookingRequest, CreateServiceRequest, CreateServiceTypeRequest,
    EvaluateBookingRequest, OverallResultQueryRequest, RegisterBookingRequest,
    StartBookingRequest, UpdateServiceStatusRequest,
};
use crate::services::booking::BookingService;
use crate::services::catalog::TestingCatalogService;

fn map_error(e: BookingError) -> AppError {
    match e {
        BookingError::NotFound => {
            AppError::NotFound("Testing service booking not found".to_string())
        }
        BookingError::ServiceNotFound => {
            AppError::NotFound("Testing service not found".to_string())
        }
        BookingError::ServiceTypeNotFound => {
            AppError::NotFound("Testing service type not found".to_string())
        }
        BookingError::CustomerNotFound => AppError::NotFound("Customer not found".to_string()),
        BookingError::SlotConflict => {
            AppError::Conflict("Testing service has already been booked".to_string())
        }
        BookingError::NoStaffAvailable => {
            AppError::Unavailable("No staff available to assign, please try again later".to_string())
        }
        BookingError::InvalidTransition(err) => AppError::BadRequest(err.to_string()),
        BookingError::ValidationError(msg) => AppError::ValidationError(msg),
        BookingError::DatabaseError(msg) => AppError::Database(msg),
    }
}

fn back_office(user: &User) -> Result<(), AppError> {
    require_role(
        user,
        &[AccountRole::Admin, AccountRole::Manager, AccountRole::Staff],
    )
}

#[derive(Debug, Deserialize)]
pub struct ServicesQuery {
    pub gender: Option<Gender>,
}

#[derive(Debug, Deserialize)]
pub struct TemplatesQuery {
    pub gender: Option<Gender>,
}

#[derive(Debug, Deserialize)]
pub struct DayScheduleQuery {
    pub service_id: Uuid,
    pub customer_id: Uuid,
    pub date: NaiveDate,
}

// ==============================================================================
// CATALOG HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn list_service_types(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<Value>, AppError> {
    let service = TestingCatalogService::new(&state);
    let types = service.list_types(auth.token()).await.map_err(map_error)?;

    Ok(Json(json!({ "testing_service_types": types })))
}

#[axum::debug_handler]
pub async fn create_service_type(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<CreateServiceTypeRequest>,
) -> Result<Json<Value>, AppError> {
    require_role(&user, &[AccountRole::Admin, AccountRole::Manager])?;

    let service = TestingCatalogService::new(&state);
    let created = service
        .create_type(request, auth.token())
        .await
        .map_err(map_error)?;

    Ok(Json(json!({
        "success": true,
        "testing_service_type": created,
        "message": "Testing service type created"
    })))
}

#[axum::debug_handler]
pub async fn list_services(
    State(state): State<Arc<AppConfig>>,
    Query(query): Query<ServicesQuery>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let catalog = TestingCatalogService::new(&state);

    let services = match query.gender {
        Some(gender) => catalog.list_services_for_gender(gender, auth.token()).await,
        None => {
            // Unfiltered catalog view for the back office.
            back_office(&user)?;
            catalog.list_all_services(auth.token()).await
        }
    }
    .map_err(|e| match e {
        BookingError::ServiceNotFound => {
            AppError::NotFound("No testing services found".to_string())
        }
        other => map_error(other),
    })?;

    Ok(Json(json!({ "testing_services": services })))
}

#[axum::debug_handler]
pub async fn get_service(
    State(state): State<Arc<AppConfig>>,
    Path(service_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<Value>, AppError> {
    let catalog = TestingCatalogService::new(&state);
    let service = catalog
        .get_service(service_id, auth.token())
        .await
        .map_err(map_error)?;

    Ok(Json(json!(service)))
}

#[axum::debug_handler]
pub async fn create_service(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<CreateServiceRequest>,
) -> Result<Json<Value>, AppError> {
    require_role(&user, &[AccountRole::Admin, AccountRole::Manager])?;

    let catalog = TestingCatalogService::new(&state);
    let created = catalog
        .create_service(request, auth.token())
        .await
        .map_err(map_error)?;

    Ok(Json(json!({
        "success": true,
        "testing_service": created,
        "message": "Testing service created"
    })))
}

#[axum::debug_handler]
pub async fn update_service_status(
    State(state): State<Arc<AppConfig>>,
    Path(service_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<UpdateServiceStatusRequest>,
) -> Result<Json<Value>, AppError> {
    require_role(&user, &[AccountRole::Admin, AccountRole::Manager])?;

    let catalog = TestingCatalogService::new(&state);
    let updated = catalog
        .update_service_status(service_id, request, auth.token())
        .await
        .map_err(map_error)?;

    Ok(Json(json!({
        "success": true,
        "testing_service": updated,
        "message": "Testing service status updated"
    })))
}

#[axum::debug_handler]
pub async fn list_service_templates(
    State(state): State<Arc<AppConfig>>,
    Path(service_id): Path<Uuid>,
    Query(query): Query<TemplatesQuery>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<Value>, AppError> {
    let catalog = TestingCatalogService::new(&state);
    let templates = catalog
        .service_templates(service_id, query.gender, auth.token())
        .await
        .map_err(map_error)?;

    Ok(Json(json!({ "result_templates": templates })))
}

// ==============================================================================
// BOOKING HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn register_booking(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<RegisterBookingRequest>,
) -> Result<Json<Value>, AppError> {
    if !user.is_self(request.customer_id) {
        back_office(&user)?;
    }

    let service = BookingService::new(&state);
    let booking = service
        .register_booking(request, auth.token())
        .await
        .map_err(map_error)?;

    Ok(Json(json!({
        "success": true,
        "booking": booking,
        "message": "Testing service booked successfully"
    })))
}

#[axum::debug_handler]
pub async fn get_booking(
    State(state): State<Arc<AppConfig>>,
    Path(booking_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let service = BookingService::new(&state);
    let (booking, details) = service
        .get_booking_details(booking_id, auth.token())
        .await
        .map_err(map_error)?;

    let is_participant = user.is_self(booking.customer_id) || user.is_self(booking.staff_id);
    if !is_participant {
        back_office(&user)?;
    }

    Ok(Json(json!({
        "booking": booking,
        "results": details,
    })))
}

#[axum::debug_handler]
pub async fn get_booking_payment(
    State(state): State<Arc<AppConfig>>,
    Path(booking_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<Value>, AppError> {
    let service = BookingService::new(&state);
    let payment = service
        .get_payment(booking_id, auth.token())
        .await
        .map_err(|e| match e {
            BookingError::NotFound => AppError::NotFound("Booking payment not found".to_string()),
            other => map_error(other),
        })?;

    Ok(Json(json!(payment)))
}

#[axum::debug_handler]
pub async fn start_booking(
    State(state): State<Arc<AppConfig>>,
    Path(booking_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<StartBookingRequest>,
) -> Result<Json<Value>, AppError> {
    back_office(&user)?;

    let service = BookingService::new(&state);
    let booking = service
        .start_booking(booking_id, request, auth.token())
        .await
        .map_err(map_error)?;

    Ok(Json(json!({
        "success": true,
        "booking": booking,
        "message": "Booking started"
    })))
}

#[axum::debug_handler]
pub async fn complete_booking(
    State(state): State<Arc<AppConfig>>,
    Path(booking_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<CompleteBookingRequest>,
) -> Result<Json<Value>, AppError> {
    back_office(&user)?;

    let service = BookingService::new(&state);
    let booking = service
        .complete_booking(booking_id, request, auth.token())
        .await
        .map_err(map_error)?;

    Ok(Json(json!({
        "success": true,
        "booking": booking,
        "message": "Booking completed"
    })))
}

#[axum::debug_handler]
pub async fn cancel_booking(
    State(state): State<Arc<AppConfig>>,
    Path(booking_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<Value>, AppError> {
    let service = BookingService::new(&state);
    let booking = service
        .cancel_booking(booking_id, auth.token())
        .await
        .map_err(map_error)?;

    Ok(Json(json!({
        "success": true,
        "booking": booking,
        "message": "Booking cancelled"
    })))
}

#[axum::debug_handler]
pub async fn evaluate_booking(
    State(state): State<Arc<AppConfig>>,
    Path(booking_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<EvaluateBookingRequest>,
) -> Result<Json<Value>, AppError> {
    let service = BookingService::new(&state);

    let booking = service
        .get_booking(booking_id, auth.token())
        .await
        .map_err(map_error)?;
    if !user.is_self(booking.customer_id) {
        return Err(AppError::Auth(
            "Only the booking customer can rate a booking".to_string(),
        ));
    }

    let updated = service
        .evaluate_booking(booking_id, request, auth.token())
        .await
        .map_err(map_error)?;

    Ok(Json(json!({
        "success": true,
        "booking": updated,
        "message": "Thank you for your feedback"
    })))
}

#[axum::debug_handler]
pub async fn overall_result(
    State(state): State<Arc<AppConfig>>,
    Path(booking_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Json(request): Json<OverallResultQueryRequest>,
) -> Result<Json<Value>, AppError> {
    let service = BookingService::new(&state);
    let outcome = service
        .overall_result_for(booking_id, &request.results, auth.token())
        .await
        .map_err(map_error)?;

    Ok(Json(json!({ "overall_result": outcome })))
}

#[axum::debug_handler]
pub async fn unavailable_slots(
    State(state): State<Arc<AppConfig>>,
    Query(query): Query<DayScheduleQuery>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<Value>, AppError> {
    let service = BookingService::new(&state);
    let slots = service
        .unavailable_slots(
            query.service_id,
            query.customer_id,
            query.date,
            auth.token(),
        )
        .await
        .map_err(|e| match e {
            BookingError::NotFound => {
                AppError::NotFound(format!("No booked schedule found for date {}", query.date))
            }
            other => map_error(other),
        })?;

    Ok(Json(json!({ "unavailable_slots": slots })))
}

#[axum::debug_handler]
pub async fn list_customer_bookings(
    State(state): State<Arc<AppConfig>>,
    Path(customer_id): Path<Uuid>,
    Query(query): Query<PageQuery>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    if !user.is_self(customer_id) {
        back_office(&user)?;
    }

    let service = BookingService::new(&state);
    let page = service
        .list_by_customer(customer_id, &query, auth.token())
        .await
        .map_err(|e| match e {
            BookingError::NotFound => {
                AppError::NotFound("No testing service bookings found".to_string())
            }
            other => map_error(other),
        })?;

    Ok(Json(json!(page)))
}

#[axum::debug_handler]
pub async fn list_staff_bookings(
    State(state): State<Arc<AppConfig>>,
    Path(staff_id): Path<Uuid>,
    Query(query): Query<PageQuery>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    if !user.is_self(staff_id) {
        require_role(&user, &[AccountRole::Admin, AccountRole::Manager])?;
    }

    let service = BookingService::new(&state);
    let page = service
        .list_by_staff(staff_id, &query, auth.token())
        .await
        .map_err(|e| match e {
            BookingError::NotFound => {
                AppError::NotFound("No testing service bookings found".to_string())
            }
            other => map_error(other),
        })?;

    Ok(Json(json!(page)))
}
