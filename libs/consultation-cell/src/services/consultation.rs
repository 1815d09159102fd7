use std::sync::Arc;

use chrono::{Duration, Utc};
use reqwest::Method;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;
use shared_models::auth::AccountRole;
use shared_models::domain::{Gender, PaymentMethod, PaymentPayload, PaymentStatus, Rating};
use shared_models::lifecycle::{transition, BookingEvent};
use shared_models::pagination::{PageQuery, Paged};
use shared_utils::validation::{
    generate_transaction_id, validate_consultation_real_times, validate_expected_start_time,
    validate_payment_input, validate_reschedule_start_time,
};

use crate::models::{
    CompleteConsultationRequest, Consultation, ConsultationError, ConsultationPayment,
    ConsultationStatus, ConsultationType, EvaluateConsultationRequest,
    RegisterConsultationRequest, RescheduleConsultationRequest,
};
use crate::services::schedule::ConsultantScheduleService;

const PAGE_SIZE: i64 = 10;
/// Every consultation occupies a fixed one-hour slot.
const SLOT_HOURS: i64 = 1;

pub struct ConsultationService {
    supabase: Arc<SupabaseClient>,
    schedule_service: ConsultantScheduleService,
}

#[derive(Debug, Deserialize)]
struct AccountSnapshot {
    gender: Option<Gender>,
}

impl ConsultationService {
    pub fn new(config: &AppConfig) -> Self {
        let supabase = Arc::new(SupabaseClient::new(config));
        let schedule_service = ConsultantScheduleService::new(Arc::clone(&supabase));
        Self {
            supabase,
            schedule_service,
        }
    }

    pub fn schedule(&self) -> &ConsultantScheduleService {
        &self.schedule_service
    }

    /// Register a consultation and its payment row. Every validation runs
    /// before the first write.
    pub async fn register_consultation(
        &self,
        request: RegisterConsultationRequest,
        auth_token: &str,
    ) -> Result<Consultation, ConsultationError> {
        info!(
            "Registering consultation for customer {} with consultant {}",
            request.customer_id, request.consultant_id
        );

        let now = Utc::now();
        validate_expected_start_time(request.expected_start_time, now)
            .map_err(|e| ConsultationError::ValidationError(e.to_string()))?;
        validate_payment_input(
            request.payment.method,
            request.payment.transaction_id.as_deref(),
        )
        .map_err(|e| ConsultationError::ValidationError(e.to_string()))?;

        if self
            .schedule_service
            .slot_taken(
                request.consultant_id,
                request.expected_start_time,
                None,
                auth_token,
            )
            .await?
        {
            return Err(ConsultationError::SlotConflict);
        }

        let consultation_type = self
            .get_consultation_type(request.consultation_type_id, auth_token)
            .await?;

        let customer = self
            .fetch_account(request.customer_id, AccountRole::Customer, auth_token)
            .await?
            .ok_or(ConsultationError::CustomerNotFound)?;

        self.gate_target_gender(&consultation_type, &customer)?;

        self.fetch_account(request.consultant_id, AccountRole::Consultant, auth_token)
            .await?
            .ok_or(ConsultationError::ConsultantNotFound)?;

        let expected_end = request.expected_start_time + Duration::hours(SLOT_HOURS);
        let row = json!({
            "consultant_id": request.consultant_id,
            "customer_id": request.customer_id,
            "consultation_type_id": request.consultation_type_id,
            "created_at": now,
            "expected_start_time": request.expected_start_time,
            "expected_end_time": expected_end,
            "status": ConsultationStatus::Confirmed,
            "rating": Rating::Average,
        });

        let consultation: Consultation = self
            .supabase
            .insert("consultations", Some(auth_token), row)
            .await
            .map_err(|e| ConsultationError::DatabaseError(e.to_string()))?;

        self.store_payment(consultation.id, &request.payment, auth_token)
            .await?;

        info!("Consultation {} registered", consultation.id);
        Ok(consultation)
    }

    pub async fn reschedule_consultation(
        &self,
        consultation_id: Uuid,
        request: RescheduleConsultationRequest,
        auth_token: &str,
    ) -> Result<Consultation, ConsultationError> {
        debug!("Rescheduling consultation {}", consultation_id);

        validate_reschedule_start_time(request.expected_start_time, Utc::now())
            .map_err(|e| ConsultationError::ValidationError(e.to_string()))?;

        let current = self.get_consultation(consultation_id, auth_token).await?;

        let next_state = transition(current.status.lifecycle_state(), BookingEvent::Reschedule)?;

        if self
            .schedule_service
            .slot_taken(
                current.consultant_id,
                request.expected_start_time,
                Some(consultation_id),
                auth_token,
            )
            .await?
        {
            return Err(ConsultationError::SlotConflict);
        }

        let expected_end = request.expected_start_time + Duration::hours(SLOT_HOURS);
        let changes = json!({
            "expected_start_time": request.expected_start_time,
            "expected_end_time": expected_end,
            "status": ConsultationStatus::from_lifecycle_state(next_state),
        });

        let updated = self
            .patch_consultation(consultation_id, changes, auth_token)
            .await?;

        info!(
            "Consultation {} rescheduled to {}",
            consultation_id, request.expected_start_time
        );
        Ok(updated)
    }

    /// Record real times and close out the consultation. Validation failures
    /// abort before any write.
    pub async fn complete_consultation(
        &self,
        consultation_id: Uuid,
        request: CompleteConsultationRequest,
        auth_token: &str,
    ) -> Result<Consultation, ConsultationError> {
        debug!("Completing consultation {}", consultation_id);

        let current = self.get_consultation(consultation_id, auth_token).await?;

        let next_state = transition(current.status.lifecycle_state(), BookingEvent::Complete)?;

        validate_consultation_real_times(
            current.expected_start_time,
            current.expected_end_time,
            request.real_start_time,
            request.real_end_time,
        )
        .map_err(|e| ConsultationError::ValidationError(e.to_string()))?;

        let changes = json!({
            "real_start_time": request.real_start_time,
            "real_end_time": request.real_end_time,
            "summary": request.summary,
            "status": ConsultationStatus::from_lifecycle_state(next_state),
        });

        let updated = self
            .patch_consultation(consultation_id, changes, auth_token)
            .await?;

        info!("Consultation {} completed", consultation_id);
        Ok(updated)
    }

    pub async fn cancel_consultation(
        &self,
        consultation_id: Uuid,
        auth_token: &str,
    ) -> Result<Consultation, ConsultationError> {
        debug!("Cancelling consultation {}", consultation_id);

        let current = self.get_consultation(consultation_id, auth_token).await?;

        let next_state = transition(current.status.lifecycle_state(), BookingEvent::Cancel)?;

        let changes = json!({
            "status": ConsultationStatus::from_lifecycle_state(next_state),
        });

        let updated = self
            .patch_consultation(consultation_id, changes, auth_token)
            .await?;

        info!("Consultation {} cancelled", consultation_id);
        Ok(updated)
    }

    pub async fn evaluate_consultation(
        &self,
        consultation_id: Uuid,
        request: EvaluateConsultationRequest,
        auth_token: &str,
    ) -> Result<Consultation, ConsultationError> {
        let changes = json!({
            "rating": request.rating,
            "comment": request.comment,
        });

        self.patch_consultation(consultation_id, changes, auth_token)
            .await
    }

    pub async fn get_consultation(
        &self,
        consultation_id: Uuid,
        auth_token: &str,
    ) -> Result<Consultation, ConsultationError> {
        let path = format!("/rest/v1/consultations?id=eq.{}", consultation_id);
        let rows: Vec<Consultation> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| ConsultationError::DatabaseError(e.to_string()))?;

        rows.into_iter().next().ok_or(ConsultationError::NotFound)
    }

    pub async fn get_payment(
        &self,
        consultation_id: Uuid,
        auth_token: &str,
    ) -> Result<ConsultationPayment, ConsultationError> {
        let path = format!(
            "/rest/v1/consultation_payments?consultation_id=eq.{}",
            consultation_id
        );
        let rows: Vec<ConsultationPayment> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| ConsultationError::DatabaseError(e.to_string()))?;

        rows.into_iter().next().ok_or(ConsultationError::NotFound)
    }

    pub async fn list_by_customer(
        &self,
        customer_id: Uuid,
        query: &PageQuery,
        auth_token: &str,
    ) -> Result<Paged<Consultation>, ConsultationError> {
        self.list_by_column("customer_id", customer_id, query, auth_token)
            .await
    }

    pub async fn list_by_consultant(
        &self,
        consultant_id: Uuid,
        query: &PageQuery,
        auth_token: &str,
    ) -> Result<Paged<Consultation>, ConsultationError> {
        self.list_by_column("consultant_id", consultant_id, query, auth_token)
            .await
    }

    // ==============================================================================
    // PRIVATE HELPER METHODS
    // ==============================================================================

    async fn list_by_column(
        &self,
        column: &str,
        id: Uuid,
        query: &PageQuery,
        auth_token: &str,
    ) -> Result<Paged<Consultation>, ConsultationError> {
        let (range, order) = query.to_query_parts(PAGE_SIZE, "expected_start_time");
        let filter = format!("{}=eq.{}", column, id);
        let path = format!("/rest/v1/consultations?{}&{}&{}", filter, order, range);

        let rows: Vec<Consultation> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| ConsultationError::DatabaseError(e.to_string()))?;

        if rows.is_empty() {
            return Err(ConsultationError::NotFound);
        }

        let total = self
            .supabase
            .count("consultations", &filter, Some(auth_token))
            .await
            .map_err(|e| ConsultationError::DatabaseError(e.to_string()))?;

        Ok(Paged::new(rows, total, PAGE_SIZE, query.page))
    }

    async fn patch_consultation(
        &self,
        consultation_id: Uuid,
        changes: serde_json::Value,
        auth_token: &str,
    ) -> Result<Consultation, ConsultationError> {
        let updated: Vec<Consultation> = self
            .supabase
            .update(
                "consultations",
                &format!("id=eq.{}", consultation_id),
                Some(auth_token),
                changes,
            )
            .await
            .map_err(|e| ConsultationError::DatabaseError(e.to_string()))?;

        updated.into_iter().next().ok_or(ConsultationError::NotFound)
    }

    async fn get_consultation_type(
        &self,
        type_id: Uuid,
        auth_token: &str,
    ) -> Result<ConsultationType, ConsultationError> {
        let path = format!("/rest/v1/consultation_types?id=eq.{}", type_id);
        let rows: Vec<ConsultationType> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| ConsultationError::DatabaseError(e.to_string()))?;

        rows.into_iter().next().ok_or(ConsultationError::TypeNotFound)
    }

    async fn fetch_account(
        &self,
        account_id: Uuid,
        role: AccountRole,
        auth_token: &str,
    ) -> Result<Option<AccountSnapshot>, ConsultationError> {
        let path = format!(
            "/rest/v1/accounts?id=eq.{}&role=eq.{}&select=id,gender",
            account_id, role
        );
        let rows: Vec<AccountSnapshot> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| ConsultationError::DatabaseError(e.to_string()))?;

        Ok(rows.into_iter().next())
    }

    fn gate_target_gender(
        &self,
        consultation_type: &ConsultationType,
        customer: &AccountSnapshot,
    ) -> Result<(), ConsultationError> {
        let customer_gender = customer.gender.ok_or_else(|| {
            ConsultationError::ValidationError(
                "Customer account has no gender on record".to_string(),
            )
        })?;

        if !consultation_type.target_gender.allows(customer_gender) {
            return Err(ConsultationError::ValidationError(format!(
                "Customer with gender {} cannot book a consultation type targeting {}",
                customer_gender, consultation_type.target_gender
            )));
        }

        Ok(())
    }

    async fn store_payment(
        &self,
        consultation_id: Uuid,
        payment: &PaymentPayload,
        auth_token: &str,
    ) -> Result<(), ConsultationError> {
        let transaction_id = match payment.method {
            PaymentMethod::Cash => generate_transaction_id(),
            PaymentMethod::Banking => payment.transaction_id.clone().unwrap_or_default(),
        };

        let row = json!({
            "consultation_id": consultation_id,
            "transaction_id": transaction_id,
            "amount": payment.amount,
            "method": payment.method,
            "status": PaymentStatus::Paid,
            "description": payment.description,
            "created_at": payment.created_at,
        });

        let _: ConsultationPayment = self
            .supabase
            .insert("consultation_payments", Some(auth_token), row)
            .await
            .map_err(|e| ConsultationError::DatabaseError(e.to_string()))?;

        Ok(())
    }
}
