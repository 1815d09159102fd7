use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::{AccountRole, User};

use crate::jwt::issue_token;

pub struct TestConfig {
    pub jwt_secret: String,
    pub supabase_url: String,
    pub supabase_anon_key: String,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "test-secret-key-for-jwt-validation-must-be-long-enough".to_string(),
            supabase_url: "http://localhost:54321".to_string(),
            supabase_anon_key: "test-anon-key".to_string(),
        }
    }
}

impl TestConfig {
    pub fn with_supabase_url(url: &str) -> Self {
        Self {
            supabase_url: url.to_string(),
            ..Self::default()
        }
    }

    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            supabase_url: self.supabase_url.clone(),
            supabase_anon_key: self.supabase_anon_key.clone(),
            auth_jwt_secret: self.jwt_secret.clone(),
            token_ttl_hours: 12,
        }
    }

    pub fn to_arc(&self) -> Arc<AppConfig> {
        Arc::new(self.to_app_config())
    }
}

pub struct TestUser {
    pub id: String,
    pub username: String,
    pub role: AccountRole,
}

impl TestUser {
    pub fn new(username: &str, role: AccountRole) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            username: username.to_string(),
            role,
        }
    }

    pub fn admin(username: &str) -> Self {
        Self::new(username, AccountRole::Admin)
    }

    pub fn manager(username: &str) -> Self {
        Self::new(username, AccountRole::Manager)
    }

    pub fn staff(username: &str) -> Self {
        Self::new(username, AccountRole::Staff)
    }

    pub fn consultant(username: &str) -> Self {
        Self::new(username, AccountRole::Consultant)
    }

    pub fn customer(username: &str) -> Self {
        Self::new(username, AccountRole::Customer)
    }

    pub fn to_user(&self) -> User {
        User {
            id: self.id.clone(),
            username: Some(self.username.clone()),
            role: Some(self.role),
            created_at: Some(Utc::now()),
        }
    }

    pub fn bearer_token(&self, secret: &str) -> String {
        issue_token(&self.id, &self.username, self.role, secret, 1)
            .expect("test token must be issuable")
    }
}

/// Canned PostgREST row bodies for wiremock-backed tests.
pub struct MockSupabaseResponses;

impl MockSupabaseResponses {
    pub fn account_row(id: &str, role: &str, status: &str) -> serde_json::Value {
        json!({
            "id": id,
            "role": role,
            "username": format!("user-{}", &id[..8]),
            "password_hash": "$argon2id$v=19$m=19456,t=2,p=1$c29tZXNhbHQ$hash",
            "status": status,
            "full_name": "Test Account",
            "email": "account@example.com",
            "phone": "0900000000",
            "address": "1 Clinic Street",
            "avatar_url": null,
            "date_of_birth": "1995-04-02",
            "gender": "female",
            "created_at": "2025-01-01T00:00:00Z"
        })
    }

    pub fn customer_row(id: &str, gender: &str) -> serde_json::Value {
        let mut row = Self::account_row(id, "customer", "active");
        row["gender"] = json!(gender);
        row
    }

    pub fn staff_row(id: &str) -> serde_json::Value {
        Self::account_row(id, "staff", "active")
    }

    pub fn consultation_row(
        id: &str,
        consultant_id: &str,
        customer_id: &str,
        status: &str,
    ) -> serde_json::Value {
        json!({
            "id": id,
            "consultant_id": consultant_id,
            "customer_id": customer_id,
            "consultation_type_id": Uuid::new_v4(),
            "created_at": "2025-06-01T08:00:00Z",
            "expected_start_time": "2025-06-11T08:00:00Z",
            "expected_end_time": "2025-06-11T09:00:00Z",
            "real_start_time": null,
            "real_end_time": null,
            "status": status,
            "rating": "average",
            "comment": null,
            "summary": null
        })
    }

    pub fn booking_row(
        id: &str,
        service_id: &str,
        customer_id: &str,
        staff_id: &str,
        status: &str,
    ) -> serde_json::Value {
        json!({
            "id": id,
            "testing_service_id": service_id,
            "customer_id": customer_id,
            "staff_id": staff_id,
            "created_at": "2025-06-01T08:00:00Z",
            "expected_start_time": "2025-06-11T08:00:00Z",
            "expected_end_time": "2025-06-11T09:00:00Z",
            "real_start_time": null,
            "real_end_time": null,
            "status": status,
            "result": null,
            "rating": "average",
            "comment": null
        })
    }

    pub fn testing_service_row(id: &str, target_gender: &str, flag_logic: &str) -> serde_json::Value {
        json!({
            "id": id,
            "type_id": Uuid::new_v4(),
            "name": "STD Panel",
            "description": "Standard screening panel",
            "price": 49.0,
            "status": "available",
            "overall_flag_logic": flag_logic,
            "testing_service_type": {
                "id": Uuid::new_v4(),
                "name": "Screening",
                "description": "Screening services",
                "target_gender": target_gender,
                "status": "active"
            }
        })
    }

    pub fn blog_row(id: &str, manager_id: &str, status: &str) -> serde_json::Value {
        json!({
            "id": id,
            "manager_id": manager_id,
            "title": "Understanding lab results",
            "content": "Long-form content body",
            "status": status,
            "created_at": "2025-05-20T10:00:00Z"
        })
    }
}
