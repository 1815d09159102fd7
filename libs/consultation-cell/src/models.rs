use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

use shared_models::domain::{PaymentMethod, PaymentPayload, PaymentStatus, Rating, TargetGender};
use shared_models::lifecycle::{BookingState, TransitionError};

// ==============================================================================
// CORE CONSULTATION MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Consultation {
    pub id: Uuid,
    pub consultant_id: Uuid,
    pub customer_id: Uuid,
    pub consultation_type_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub expected_start_time: DateTime<Utc>,
    pub expected_end_time: DateTime<Utc>,
    pub real_start_time: Option<DateTime<Utc>>,
    pub real_end_time: Option<DateTime<Utc>>,
    pub status: ConsultationStatus,
    pub rating: Rating,
    pub comment: Option<String>,
    pub summary: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ConsultationStatus {
    Confirmed,
    Rescheduled,
    Completed,
    Cancelled,
}

impl ConsultationStatus {
    /// Projection into the shared scheduling lifecycle.
    pub fn lifecycle_state(&self) -> BookingState {
        match self {
            ConsultationStatus::Confirmed => BookingState::Confirmed,
            ConsultationStatus::Rescheduled => BookingState::Rescheduled,
            ConsultationStatus::Completed => BookingState::Completed,
            ConsultationStatus::Cancelled => BookingState::Cancelled,
        }
    }

    pub fn from_lifecycle_state(state: BookingState) -> Option<Self> {
        match state {
            BookingState::Confirmed => Some(ConsultationStatus::Confirmed),
            BookingState::Rescheduled => Some(ConsultationStatus::Rescheduled),
            BookingState::Completed => Some(ConsultationStatus::Completed),
            BookingState::Cancelled => Some(ConsultationStatus::Cancelled),
            // Consultations have no in-progress phase.
            BookingState::InProgress => None,
        }
    }
}

impl fmt::Display for ConsultationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConsultationStatus::Confirmed => write!(f, "confirmed"),
            ConsultationStatus::Rescheduled => write!(f, "rescheduled"),
            ConsultationStatus::Completed => write!(f, "completed"),
            ConsultationStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsultationPayment {
    pub id: Uuid,
    pub consultation_id: Uuid,
    pub transaction_id: String,
    pub amount: f64,
    pub method: PaymentMethod,
    pub status: PaymentStatus,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsultationType {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub target_gender: TargetGender,
    pub price: f64,
    pub active: bool,
}

/// Booked expected-start times of one consultant on one date.
#[derive(Debug, Serialize)]
pub struct ConsultantDaySchedule {
    pub consultant_id: Uuid,
    pub booked_slots: Vec<DateTime<Utc>>,
}

// ==============================================================================
// REQUEST MODELS
// ==============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterConsultationRequest {
    pub consultant_id: Uuid,
    pub customer_id: Uuid,
    pub consultation_type_id: Uuid,
    pub expected_start_time: DateTime<Utc>,
    pub payment: PaymentPayload,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RescheduleConsultationRequest {
    pub expected_start_time: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CompleteConsultationRequest {
    pub real_start_time: DateTime<Utc>,
    pub real_end_time: DateTime<Utc>,
    pub summary: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EvaluateConsultationRequest {
    pub rating: Rating,
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateConsultationTypeRequest {
    pub name: String,
    pub description: Option<String>,
    pub target_gender: TargetGender,
    pub price: f64,
}

// ==============================================================================
// ERRORS
// ==============================================================================

#[derive(Error, Debug)]
pub enum ConsultationError {
    #[error("Consultation not found")]
    NotFound,

    #[error("Consultation type not found")]
    TypeNotFound,

    #[error("Customer not found")]
    CustomerNotFound,

    #[error("Consultant not found")]
    ConsultantNotFound,

    #[error("Consultation slot is already booked")]
    SlotConflict,

    #[error("{0}")]
    InvalidTransition(#[from] TransitionError),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}
