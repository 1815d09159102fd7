use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize)]
pub struct JwtHeader {
    pub alg: String,
    pub typ: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct JwtClaims {
    pub sub: String,
    pub role: Option<String>,
    pub username: Option<String>,
    pub exp: Option<u64>,
    pub iat: Option<u64>,
}

/// Authenticated caller, injected into request extensions by the auth middleware.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub username: Option<String>,
    pub role: Option<AccountRole>,
    pub created_at: Option<DateTime<Utc>>,
}

impl User {
    pub fn has_role(&self, role: AccountRole) -> bool {
        self.role == Some(role)
    }

    pub fn is_self(&self, account_id: Uuid) -> bool {
        self.id == account_id.to_string()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AccountRole {
    Admin,
    Manager,
    Staff,
    Consultant,
    Customer,
}

impl fmt::Display for AccountRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccountRole::Admin => write!(f, "admin"),
            AccountRole::Manager => write!(f, "manager"),
            AccountRole::Staff => write!(f, "staff"),
            AccountRole::Consultant => write!(f, "consultant"),
            AccountRole::Customer => write!(f, "customer"),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub valid: bool,
    pub user_id: String,
    pub username: Option<String>,
    pub role: Option<AccountRole>,
}
