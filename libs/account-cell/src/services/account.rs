use std::sync::Arc;

use chrono::Utc;
use regex::Regex;
use reqwest::Method;
use serde_json::{json, Value};
use tracing::{debug, info, warn};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;
use shared_models::auth::AccountRole;
use shared_models::pagination::{PageQuery, Paged};
use shared_utils::jwt::issue_token;
use shared_utils::password::{hash_password, verify_password};
use shared_utils::validation::validate_certificate_dates;

use crate::models::{
    Account, AccountError, AccountProfile, AccountStatus, Certificate, CertificatePayload,
    LoginRequest, LoginResponse, RegisterAccountRequest, UpdateProfileRequest, PROFILE_COLUMNS,
};

const PAGE_SIZE: i64 = 10;

pub struct AccountService {
    supabase: Arc<SupabaseClient>,
    jwt_secret: String,
    token_ttl_hours: i64,
    anon_key: String,
}

impl AccountService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: Arc::new(SupabaseClient::new(config)),
            jwt_secret: config.auth_jwt_secret.clone(),
            token_ttl_hours: config.token_ttl_hours,
            anon_key: config.supabase_anon_key.clone(),
        }
    }

    /// Authenticate against ACTIVE accounts and mint a bearer token.
    pub async fn login(&self, request: LoginRequest) -> Result<LoginResponse, AccountError> {
        debug!("Login attempt for username {}", request.username);

        let path = format!(
            "/rest/v1/accounts?username=eq.{}&status=eq.{}",
            urlencoding::encode(&request.username),
            AccountStatus::Active,
        );
        let rows: Vec<Account> = self
            .supabase
            .request(Method::GET, &path, Some(&self.anon_key), None)
            .await
            .map_err(|e| AccountError::DatabaseError(e.to_string()))?;

        let account = rows
            .into_iter()
            .next()
            .ok_or(AccountError::InvalidCredentials)?;

        let verified = verify_password(&request.password, &account.password_hash)
            .map_err(|e| AccountError::DatabaseError(e.to_string()))?;
        if !verified {
            warn!("Password mismatch for username {}", request.username);
            return Err(AccountError::InvalidCredentials);
        }

        let token = issue_token(
            &account.id.to_string(),
            &account.username,
            account.role,
            &self.jwt_secret,
            self.token_ttl_hours,
        )
        .map_err(AccountError::ValidationError)?;

        info!("Account {} logged in as {}", account.id, account.role);

        Ok(LoginResponse {
            token,
            account_id: account.id,
            role: account.role,
            full_name: account.full_name,
            email: account.email,
            gender: account.gender,
        })
    }

    /// Create an account for any of the four registerable roles. Consultant
    /// registration validates and stores its certificates as well.
    pub async fn register(
        &self,
        request: RegisterAccountRequest,
        auth_token: &str,
    ) -> Result<AccountProfile, AccountError> {
        let role = request.role();
        info!("Registering new {} account", role);

        let (row, certificates) = self.build_account_row(request)?;

        let username = row["username"].as_str().unwrap_or_default().to_string();
        if self.username_exists(&username, auth_token).await? {
            return Err(AccountError::UsernameTaken);
        }

        let created: Account = self
            .supabase
            .insert("accounts", Some(auth_token), row)
            .await
            .map_err(|e| AccountError::DatabaseError(e.to_string()))?;

        for certificate in &certificates {
            self.store_certificate(created.id, certificate, auth_token)
                .await?;
        }

        info!("Account {} registered with role {}", created.id, role);
        Ok(profile_of(created))
    }

    pub async fn get_profile(
        &self,
        role: AccountRole,
        account_id: Uuid,
        auth_token: &str,
    ) -> Result<AccountProfile, AccountError> {
        let path = format!(
            "/rest/v1/accounts?id=eq.{}&role=eq.{}&select={}",
            account_id, role, PROFILE_COLUMNS
        );
        let rows: Vec<AccountProfile> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| AccountError::DatabaseError(e.to_string()))?;

        rows.into_iter().next().ok_or(AccountError::NotFound)
    }

    pub async fn list_by_role(
        &self,
        role: AccountRole,
        query: &PageQuery,
        auth_token: &str,
    ) -> Result<Paged<AccountProfile>, AccountError> {
        let (range, order) = query.to_query_parts(PAGE_SIZE, "created_at");
        let path = format!(
            "/rest/v1/accounts?role=eq.{}&select={}&{}&{}",
            role, PROFILE_COLUMNS, order, range
        );

        let rows: Vec<AccountProfile> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| AccountError::DatabaseError(e.to_string()))?;

        if rows.is_empty() {
            return Err(AccountError::NotFound);
        }

        let total = self
            .supabase
            .count("accounts", &format!("role=eq.{}", role), Some(auth_token))
            .await
            .map_err(|e| AccountError::DatabaseError(e.to_string()))?;

        Ok(Paged::new(rows, total, PAGE_SIZE, query.page))
    }

    /// Public consultant directory: ACTIVE consultants only.
    pub async fn list_active_consultants(
        &self,
        auth_token: &str,
    ) -> Result<Vec<AccountProfile>, AccountError> {
        let path = format!(
            "/rest/v1/accounts?role=eq.{}&status=eq.{}&select={}&order=full_name.asc",
            AccountRole::Consultant,
            AccountStatus::Active,
            PROFILE_COLUMNS
        );
        let rows: Vec<AccountProfile> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| AccountError::DatabaseError(e.to_string()))?;

        if rows.is_empty() {
            return Err(AccountError::NotFound);
        }

        Ok(rows)
    }

    pub async fn update_profile(
        &self,
        role: AccountRole,
        account_id: Uuid,
        request: UpdateProfileRequest,
        auth_token: &str,
    ) -> Result<AccountProfile, AccountError> {
        validate_contact(&request.email, &request.phone)?;

        let mut changes = json!({
            "full_name": request.full_name,
            "email": request.email,
            "phone": request.phone,
            "address": request.address,
        });

        match role {
            AccountRole::Customer => {
                changes["date_of_birth"] = json!(request.date_of_birth);
                changes["gender"] = json!(request.gender);
            }
            AccountRole::Consultant => {
                changes["avatar_url"] = json!(request.avatar_url);
            }
            _ => {}
        }

        let filter = format!("id=eq.{}&role=eq.{}", account_id, role);
        let updated: Vec<Account> = self
            .supabase
            .update("accounts", &filter, Some(auth_token), changes)
            .await
            .map_err(|e| AccountError::DatabaseError(e.to_string()))?;

        updated
            .into_iter()
            .next()
            .map(profile_of)
            .ok_or(AccountError::NotFound)
    }

    /// Mutate account status; skips the write when the stored status already
    /// matches.
    pub async fn update_status(
        &self,
        role: AccountRole,
        account_id: Uuid,
        status: AccountStatus,
        auth_token: &str,
    ) -> Result<(), AccountError> {
        let current = self.get_profile(role, account_id, auth_token).await?;

        if current.status == status {
            debug!("Account {} already has status {}", account_id, status);
            return Ok(());
        }

        let filter = format!("id=eq.{}", account_id);
        let _: Vec<Account> = self
            .supabase
            .update(
                "accounts",
                &filter,
                Some(auth_token),
                json!({ "status": status }),
            )
            .await
            .map_err(|e| AccountError::DatabaseError(e.to_string()))?;

        info!("Account {} status changed to {}", account_id, status);
        Ok(())
    }

    pub async fn certificates_of(
        &self,
        consultant_id: Uuid,
        auth_token: &str,
    ) -> Result<Vec<Certificate>, AccountError> {
        let path = format!(
            "/rest/v1/certificates?consultant_id=eq.{}&order=issue_date.desc",
            consultant_id
        );
        self.supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| AccountError::DatabaseError(e.to_string()))
    }

    // ==============================================================================
    // PRIVATE HELPER METHODS
    // ==============================================================================

    fn build_account_row(
        &self,
        request: RegisterAccountRequest,
    ) -> Result<(Value, Vec<CertificatePayload>), AccountError> {
        let now = Utc::now();
        let today = now.date_naive();

        let (row, certificates) = match request {
            RegisterAccountRequest::Customer(payload) => {
                validate_contact(&payload.email, &payload.phone)?;
                let row = json!({
                    "role": AccountRole::Customer,
                    "username": payload.username,
                    "password_hash": self.hash(&payload.password)?,
                    "status": AccountStatus::Active,
                    "full_name": payload.full_name,
                    "email": payload.email,
                    "phone": payload.phone,
                    "address": payload.address,
                    "date_of_birth": payload.date_of_birth,
                    "gender": payload.gender,
                    "created_at": now,
                });
                (row, vec![])
            }
            RegisterAccountRequest::Consultant(payload) => {
                validate_contact(&payload.email, &payload.phone)?;
                for certificate in &payload.certificates {
                    validate_certificate_dates(
                        certificate.issue_date,
                        certificate.expiry_date,
                        today,
                    )
                    .map_err(|e| AccountError::ValidationError(e.to_string()))?;
                }
                let row = json!({
                    "role": AccountRole::Consultant,
                    "username": payload.username,
                    "password_hash": self.hash(&payload.password)?,
                    "status": AccountStatus::Active,
                    "full_name": payload.full_name,
                    "email": payload.email,
                    "phone": payload.phone,
                    "address": payload.address,
                    "avatar_url": payload.avatar_url,
                    "created_at": now,
                });
                (row, payload.certificates)
            }
            RegisterAccountRequest::Staff(payload) => {
                validate_contact(&payload.email, &payload.phone)?;
                let row = json!({
                    "role": AccountRole::Staff,
                    "username": payload.username,
                    "password_hash": self.hash(&payload.password)?,
                    "status": AccountStatus::Active,
                    "full_name": payload.full_name,
                    "email": payload.email,
                    "phone": payload.phone,
                    "address": payload.address,
                    "created_at": now,
                });
                (row, vec![])
            }
            RegisterAccountRequest::Manager(payload) => {
                validate_contact(&payload.email, &payload.phone)?;
                let row = json!({
                    "role": AccountRole::Manager,
                    "username": payload.username,
                    "password_hash": self.hash(&payload.password)?,
                    "status": AccountStatus::Active,
                    "full_name": payload.full_name,
                    "email": payload.email,
                    "phone": payload.phone,
                    "address": payload.address,
                    "created_at": now,
                });
                (row, vec![])
            }
        };

        Ok((row, certificates))
    }

    fn hash(&self, password: &str) -> Result<String, AccountError> {
        if password.len() < 8 {
            return Err(AccountError::ValidationError(
                "Password must be at least 8 characters long".to_string(),
            ));
        }
        hash_password(password).map_err(|e| AccountError::DatabaseError(e.to_string()))
    }

    async fn username_exists(
        &self,
        username: &str,
        auth_token: &str,
    ) -> Result<bool, AccountError> {
        let filter = format!("username=eq.{}", urlencoding::encode(username));
        let count = self
            .supabase
            .count("accounts", &filter, Some(auth_token))
            .await
            .map_err(|e| AccountError::DatabaseError(e.to_string()))?;
        Ok(count > 0)
    }

    async fn store_certificate(
        &self,
        consultant_id: Uuid,
        payload: &CertificatePayload,
        auth_token: &str,
    ) -> Result<(), AccountError> {
        let row = json!({
            "consultant_id": consultant_id,
            "certificate_name": payload.certificate_name,
            "issued_by": payload.issued_by,
            "issue_date": payload.issue_date,
            "expiry_date": payload.expiry_date,
            "image_url": payload.image_url,
            "description": payload.description,
        });

        let _: Certificate = self
            .supabase
            .insert("certificates", Some(auth_token), row)
            .await
            .map_err(|e| AccountError::DatabaseError(e.to_string()))?;

        Ok(())
    }
}

fn profile_of(account: Account) -> AccountProfile {
    AccountProfile {
        id: account.id,
        role: account.role,
        username: account.username,
        status: account.status,
        full_name: account.full_name,
        email: account.email,
        phone: account.phone,
        address: account.address,
        avatar_url: account.avatar_url,
        date_of_birth: account.date_of_birth,
        gender: account.gender,
        created_at: account.created_at,
    }
}

fn validate_contact(email: &str, phone: &str) -> Result<(), AccountError> {
    let email_regex = Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").unwrap();
    if !email_regex.is_match(email) || email.len() > 254 {
        return Err(AccountError::ValidationError(format!(
            "Invalid email address: {}",
            email
        )));
    }

    let phone_regex = Regex::new(r"^\+?[0-9]{8,15}$").unwrap();
    if !phone_regex.is_match(phone) {
        return Err(AccountError::ValidationError(format!(
            "Invalid phone number: {}",
            phone
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contact_validation_accepts_reasonable_values() {
        assert!(validate_contact("user@example.com", "0901234567").is_ok());
        assert!(validate_contact("user@example.com", "+84901234567").is_ok());
    }

    #[test]
    fn contact_validation_rejects_bad_values() {
        assert!(validate_contact("not-an-email", "0901234567").is_err());
        assert!(validate_contact("user@example.com", "12ab34").is_err());
        assert!(validate_contact("user@example.com", "123").is_err());
    }

    #[test]
    fn register_request_role_tagging() {
        let body = serde_json::json!({
            "role": "staff",
            "username": "staff1",
            "password": "a-long-password",
            "full_name": "Staff One",
            "email": "staff@example.com",
            "phone": "0900000001",
            "address": "2 Clinic Street",
        });
        let request: RegisterAccountRequest = serde_json::from_value(body).unwrap();
        assert_eq!(request.role(), AccountRole::Staff);
    }
}
