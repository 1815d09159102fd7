use std::sync::Arc;

use reqwest::Method;
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;
use shared_models::domain::Gender;

use crate::models::{ConsultationError, ConsultationType, CreateConsultationTypeRequest};

pub struct ConsultationTypeService {
    supabase: Arc<SupabaseClient>,
}

impl ConsultationTypeService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: Arc::new(SupabaseClient::new(config)),
        }
    }

    /// Catalog as a customer sees it: active types matching their gender or
    /// open to any.
    pub async fn list_for_gender(
        &self,
        gender: Gender,
        auth_token: &str,
    ) -> Result<Vec<ConsultationType>, ConsultationError> {
        let path = format!(
            "/rest/v1/consultation_types?active=is.true&or=(target_gender.eq.any,target_gender.eq.{})&order=name.asc",
            gender
        );
        let rows: Vec<ConsultationType> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| ConsultationError::DatabaseError(e.to_string()))?;

        if rows.is_empty() {
            return Err(ConsultationError::TypeNotFound);
        }

        Ok(rows)
    }

    pub async fn list_all(
        &self,
        auth_token: &str,
    ) -> Result<Vec<ConsultationType>, ConsultationError> {
        let path = "/rest/v1/consultation_types?order=name.asc";
        let rows: Vec<ConsultationType> = self
            .supabase
            .request(Method::GET, path, Some(auth_token), None)
            .await
            .map_err(|e| ConsultationError::DatabaseError(e.to_string()))?;

        Ok(rows)
    }

    pub async fn create(
        &self,
        request: CreateConsultationTypeRequest,
        auth_token: &str,
    ) -> Result<ConsultationType, ConsultationError> {
        if request.name.trim().is_empty() {
            return Err(ConsultationError::ValidationError(
                "Consultation type name must not be empty".to_string(),
            ));
        }
        if request.price < 0.0 {
            return Err(ConsultationError::ValidationError(
                "Consultation type price cannot be negative".to_string(),
            ));
        }

        let row = json!({
            "name": request.name,
            "description": request.description,
            "target_gender": request.target_gender,
            "price": request.price,
            "active": true,
        });

        let created: ConsultationType = self
            .supabase
            .insert("consultation_types", Some(auth_token), row)
            .await
            .map_err(|e| ConsultationError::DatabaseError(e.to_string()))?;

        info!("Consultation type {} created", created.id);
        Ok(created)
    }

    pub async fn retire(&self, type_id: Uuid, auth_token: &str) -> Result<(), ConsultationError> {
        let updated: Vec<ConsultationType> = self
            .supabase
            .update(
                "consultation_types",
                &format!("id=eq.{}", type_id),
                Some(auth_token),
                json!({ "active": false }),
            )
            .await
            .map_err(|e| ConsultationError::DatabaseError(e.to_string()))?;

        if updated.is_empty() {
            return Err(ConsultationError::TypeNotFound);
        }

        info!("Consultation type {} retired", type_id);
        Ok(())
    }
}
