use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

use shared_models::auth::AccountRole;
use shared_models::domain::Gender;

// ==============================================================================
// CORE ACCOUNT MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: Uuid,
    pub role: AccountRole,
    pub username: String,
    pub password_hash: String,
    pub status: AccountStatus,
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub avatar_url: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<Gender>,
    pub created_at: DateTime<Utc>,
}

/// Account row without credentials, as returned to callers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountProfile {
    pub id: Uuid,
    pub role: AccountRole,
    pub username: String,
    pub status: AccountStatus,
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub avatar_url: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<Gender>,
    pub created_at: DateTime<Utc>,
}

/// Columns of [`AccountProfile`], for PostgREST select clauses.
pub const PROFILE_COLUMNS: &str =
    "id,role,username,status,full_name,email,phone,address,avatar_url,date_of_birth,gender,created_at";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AccountStatus {
    Active,
    Inactive,
    Suspended,
}

impl fmt::Display for AccountStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccountStatus::Active => write!(f, "active"),
            AccountStatus::Inactive => write!(f, "inactive"),
            AccountStatus::Suspended => write!(f, "suspended"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Certificate {
    pub id: Uuid,
    pub consultant_id: Uuid,
    pub certificate_name: String,
    pub issued_by: String,
    pub issue_date: NaiveDate,
    pub expiry_date: Option<NaiveDate>,
    pub image_url: Option<String>,
    pub description: Option<String>,
}

// ==============================================================================
// REQUEST/RESPONSE MODELS
// ==============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub account_id: Uuid,
    pub role: AccountRole,
    pub full_name: String,
    pub email: String,
    pub gender: Option<Gender>,
}

/// Registration payload, discriminated by role at the serde layer so the
/// service never inspects payload types at runtime.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum RegisterAccountRequest {
    Customer(CustomerRegisterPayload),
    Consultant(ConsultantRegisterPayload),
    Staff(StaffRegisterPayload),
    Manager(ManagerRegisterPayload),
}

impl RegisterAccountRequest {
    pub fn role(&self) -> AccountRole {
        match self {
            RegisterAccountRequest::Customer(_) => AccountRole::Customer,
            RegisterAccountRequest::Consultant(_) => AccountRole::Consultant,
            RegisterAccountRequest::Staff(_) => AccountRole::Staff,
            RegisterAccountRequest::Manager(_) => AccountRole::Manager,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CustomerRegisterPayload {
    pub username: String,
    pub password: String,
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub date_of_birth: NaiveDate,
    pub gender: Gender,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConsultantRegisterPayload {
    pub username: String,
    pub password: String,
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub avatar_url: Option<String>,
    pub certificates: Vec<CertificatePayload>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StaffRegisterPayload {
    pub username: String,
    pub password: String,
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ManagerRegisterPayload {
    pub username: String,
    pub password: String,
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CertificatePayload {
    pub certificate_name: String,
    pub issued_by: String,
    pub issue_date: NaiveDate,
    pub expiry_date: Option<NaiveDate>,
    pub image_url: Option<String>,
    pub description: Option<String>,
}

/// Profile updates. Gender/date-of-birth only apply to customers, avatar only
/// to consultants; the service ignores fields foreign to the target role.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateProfileRequest {
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub avatar_url: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<Gender>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: AccountStatus,
}

// ==============================================================================
// ERRORS
// ==============================================================================

#[derive(Error, Debug)]
pub enum AccountError {
    #[error("Account not found")]
    NotFound,

    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Username is already taken")]
    UsernameTaken,

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}
