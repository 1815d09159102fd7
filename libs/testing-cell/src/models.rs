use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

use shared_models::domain::{PaymentMethod, PaymentPayload, PaymentStatus, Rating, TargetGender};
use shared_models::lifecycle::{BookingState, TransitionError};

// ==============================================================================
// CATALOG MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestingServiceType {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub target_gender: TargetGender,
    pub status: TestingServiceTypeStatus,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TestingServiceTypeStatus {
    Active,
    Inactive,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestingService {
    pub id: Uuid,
    pub type_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub price: f64,
    pub status: TestingServiceStatus,
    /// Free-text rule collapsing per-template results into one outcome;
    /// anything other than ALL_POSITIVE/ANY_POSITIVE reads as indeterminate.
    pub overall_flag_logic: String,
    #[serde(default)]
    pub testing_service_type: Option<TestingServiceType>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TestingServiceStatus {
    Available,
    Unavailable,
    Removed,
}

impl fmt::Display for TestingServiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TestingServiceStatus::Available => write!(f, "available"),
            TestingServiceStatus::Unavailable => write!(f, "unavailable"),
            TestingServiceStatus::Removed => write!(f, "removed"),
        }
    }
}

/// Catalog definition of one measurable field a testing service produces.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultTemplate {
    pub id: Uuid,
    pub service_id: Uuid,
    pub title: String,
    pub result_type: ResultType,
    pub measure_unit: Option<MeasureUnit>,
    pub min_value: Option<f64>,
    pub max_value: Option<f64>,
    pub target_gender: TargetGender,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ResultType {
    Numeric,
    Text,
    PositiveNegative,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MeasureUnit {
    MillimolPerLiter,
    MicromolPerLiter,
    GramPerLiter,
    PerMicroliter,
    MillimeterOfMercury,
    InternationalUnitsPerLiter,
    None,
}

impl MeasureUnit {
    pub fn symbol(&self) -> &'static str {
        match self {
            MeasureUnit::MillimolPerLiter => "mmol/L",
            MeasureUnit::MicromolPerLiter => "μmol/L",
            MeasureUnit::GramPerLiter => "g/L",
            MeasureUnit::PerMicroliter => "/μL",
            MeasureUnit::MillimeterOfMercury => "mmHg",
            MeasureUnit::InternationalUnitsPerLiter => "IU/L",
            MeasureUnit::None => "None",
        }
    }
}

// ==============================================================================
// BOOKING MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestingServiceBooking {
    pub id: Uuid,
    pub testing_service_id: Uuid,
    pub customer_id: Uuid,
    pub staff_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub expected_start_time: DateTime<Utc>,
    pub expected_end_time: DateTime<Utc>,
    pub real_start_time: Option<DateTime<Utc>>,
    pub real_end_time: Option<DateTime<Utc>>,
    pub status: BookingStatus,
    /// Serialized [`TestingResultDetails`], opaque to the database.
    pub result: Option<String>,
    pub rating: Rating,
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Confirmed,
    InProgress,
    Completed,
    Cancelled,
}

impl BookingStatus {
    pub fn lifecycle_state(&self) -> BookingState {
        match self {
            BookingStatus::Confirmed => BookingState::Confirmed,
            BookingStatus::InProgress => BookingState::InProgress,
            BookingStatus::Completed => BookingState::Completed,
            BookingStatus::Cancelled => BookingState::Cancelled,
        }
    }

    pub fn from_lifecycle_state(state: BookingState) -> Option<Self> {
        match state {
            BookingState::Confirmed => Some(BookingStatus::Confirmed),
            BookingState::InProgress => Some(BookingStatus::InProgress),
            BookingState::Completed => Some(BookingStatus::Completed),
            BookingState::Cancelled => Some(BookingStatus::Cancelled),
            // Bookings are never rescheduled; the slot is fixed at registration.
            BookingState::Rescheduled => None,
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BookingStatus::Confirmed => write!(f, "confirmed"),
            BookingStatus::InProgress => write!(f, "in_progress"),
            BookingStatus::Completed => write!(f, "completed"),
            BookingStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestingServicePayment {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub transaction_id: String,
    pub amount: f64,
    pub method: PaymentMethod,
    pub status: PaymentStatus,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// One recorded result against a template, as captured at completion time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordedResult {
    pub title: String,
    pub result: String,
    pub measure_unit: Option<MeasureUnit>,
    pub min_value: Option<f64>,
    pub max_value: Option<f64>,
}

/// The payload persisted into the booking's `result` column.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestingResultDetails {
    pub results: Vec<RecordedResult>,
    pub overall_result: OverallResult,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OverallResult {
    Positive,
    Negative,
    Indeterminate,
}

impl fmt::Display for OverallResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OverallResult::Positive => write!(f, "POSITIVE"),
            OverallResult::Negative => write!(f, "NEGATIVE"),
            OverallResult::Indeterminate => write!(f, "INDETERMINATE"),
        }
    }
}

// ==============================================================================
// REQUEST MODELS
// ==============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterBookingRequest {
    pub testing_service_id: Uuid,
    pub customer_id: Uuid,
    pub expected_start_time: DateTime<Utc>,
    pub payment: PaymentPayload,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StartBookingRequest {
    pub real_start_time: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CompleteBookingRequest {
    pub real_start_time: DateTime<Utc>,
    pub real_end_time: DateTime<Utc>,
    pub results: Vec<RecordedResult>,
    pub overall_result: OverallResult,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EvaluateBookingRequest {
    pub rating: Rating,
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OverallResultQueryRequest {
    pub results: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateServiceTypeRequest {
    pub name: String,
    pub description: Option<String>,
    pub target_gender: TargetGender,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateServiceRequest {
    pub type_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub price: f64,
    pub overall_flag_logic: String,
    pub result_templates: Vec<ResultTemplatePayload>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateServiceStatusRequest {
    pub status: TestingServiceStatus,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResultTemplatePayload {
    pub title: String,
    pub result_type: ResultType,
    pub measure_unit: Option<MeasureUnit>,
    pub min_value: Option<f64>,
    pub max_value: Option<f64>,
    pub target_gender: TargetGender,
}

// ==============================================================================
// ERRORS
// ==============================================================================

#[derive(Error, Debug)]
pub enum BookingError {
    #[error("Testing service booking not found")]
    NotFound,

    #[error("Testing service not found")]
    ServiceNotFound,

    #[error("Testing service type not found")]
    ServiceTypeNotFound,

    #[error("Customer not found")]
    CustomerNotFound,

    #[error("Testing service has already been booked for this slot")]
    SlotConflict,

    #[error("No staff available to assign, please try again later")]
    NoStaffAvailable,

    #[error("{0}")]
    InvalidTransition(#[from] TransitionError),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}
