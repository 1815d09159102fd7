use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use reqwest::Method;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info, warn};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;
use shared_models::auth::AccountRole;
use shared_models::domain::{Gender, PaymentMethod, PaymentPayload, PaymentStatus, Rating};
use shared_models::lifecycle::{transition, BookingEvent};
use shared_models::pagination::{PageQuery, Paged};
use shared_utils::validation::{
    generate_transaction_id, validate_booking_real_times, validate_booking_start_time,
    validate_expected_start_time, validate_numeric_result, validate_payment_input,
};

use crate::models::{
    BookingError, BookingStatus, CompleteBookingRequest, EvaluateBookingRequest, OverallResult,
    RegisterBookingRequest, StartBookingRequest, TestingResultDetails, TestingService,
    TestingServiceBooking, TestingServicePayment,
};
use crate::services::assignment::StaffAssignmentService;
use crate::services::catalog::SERVICE_WITH_TYPE;
use crate::services::overall;

const PAGE_SIZE: i64 = 10;
/// Every booking occupies a fixed one-hour slot.
const SLOT_HOURS: i64 = 1;
/// Lab capacity: how many bookings share one expected-start slot before it is
/// considered full.
const SLOT_CAPACITY: usize = 5;

pub struct BookingService {
    supabase: Arc<SupabaseClient>,
    assignment_service: StaffAssignmentService,
}

#[derive(Debug, Deserialize)]
struct AccountSnapshot {
    gender: Option<Gender>,
}

#[derive(Debug, Deserialize)]
struct SlotRow {
    expected_start_time: DateTime<Utc>,
}

impl BookingService {
    pub fn new(config: &AppConfig) -> Self {
        let supabase = Arc::new(SupabaseClient::new(config));
        let assignment_service = StaffAssignmentService::new(Arc::clone(&supabase));
        Self {
            supabase,
            assignment_service,
        }
    }

    /// Register a booking and its payment row. All validation (time window,
    /// payment consistency, slot conflict, gender gate, staff availability)
    /// happens before the first write.
    pub async fn register_booking(
        &self,
        request: RegisterBookingRequest,
        auth_token: &str,
    ) -> Result<TestingServiceBooking, BookingError> {
        info!(
            "Registering testing booking for customer {} on service {}",
            request.customer_id, request.testing_service_id
        );

        let now = Utc::now();
        validate_expected_start_time(request.expected_start_time, now)
            .map_err(|e| BookingError::ValidationError(e.to_string()))?;
        validate_payment_input(
            request.payment.method,
            request.payment.transaction_id.as_deref(),
        )
        .map_err(|e| BookingError::ValidationError(e.to_string()))?;

        if self
            .slot_taken(
                request.testing_service_id,
                request.customer_id,
                request.expected_start_time,
                auth_token,
            )
            .await?
        {
            return Err(BookingError::SlotConflict);
        }

        let customer = self
            .fetch_customer(request.customer_id, auth_token)
            .await?
            .ok_or(BookingError::CustomerNotFound)?;

        let service = self
            .fetch_service(request.testing_service_id, auth_token)
            .await?;

        self.gate_target_gender(&service, &customer)?;

        let staff_id = self
            .assignment_service
            .assign_staff_for_date(request.expected_start_time.date_naive(), auth_token)
            .await?;

        let expected_end = request.expected_start_time + Duration::hours(SLOT_HOURS);
        let row = json!({
            "testing_service_id": request.testing_service_id,
            "customer_id": request.customer_id,
            "staff_id": staff_id,
            "created_at": now,
            "expected_start_time": request.expected_start_time,
            "expected_end_time": expected_end,
            "status": BookingStatus::Confirmed,
            "rating": Rating::Average,
        });

        let booking: TestingServiceBooking = self
            .supabase
            .insert("testing_service_bookings", Some(auth_token), row)
            .await
            .map_err(|e| BookingError::DatabaseError(e.to_string()))?;

        self.store_payment(booking.id, &request.payment, auth_token)
            .await?;

        info!("Booking {} registered with staff {}", booking.id, staff_id);
        Ok(booking)
    }

    /// Mark the sample-taking as underway.
    pub async fn start_booking(
        &self,
        booking_id: Uuid,
        request: StartBookingRequest,
        auth_token: &str,
    ) -> Result<TestingServiceBooking, BookingError> {
        debug!("Starting booking {}", booking_id);

        let current = self.get_booking(booking_id, auth_token).await?;

        let next_state = transition(current.status.lifecycle_state(), BookingEvent::Start)?;

        validate_booking_start_time(current.expected_start_time, request.real_start_time)
            .map_err(|e| BookingError::ValidationError(e.to_string()))?;

        let changes = json!({
            "real_start_time": request.real_start_time,
            "status": BookingStatus::from_lifecycle_state(next_state),
        });

        self.patch_booking(booking_id, changes, auth_token).await
    }

    /// Record per-template results, the declared overall outcome, and the
    /// real times, then close the booking out. Any validation failure aborts
    /// before the write; the row is updated exactly once.
    pub async fn complete_booking(
        &self,
        booking_id: Uuid,
        request: CompleteBookingRequest,
        auth_token: &str,
    ) -> Result<TestingServiceBooking, BookingError> {
        debug!("Completing booking {}", booking_id);

        let current = self.get_booking(booking_id, auth_token).await?;

        let next_state = transition(current.status.lifecycle_state(), BookingEvent::Complete)?;

        validate_booking_real_times(
            current.expected_start_time,
            request.real_start_time,
            request.real_end_time,
        )
        .map_err(|e| BookingError::ValidationError(e.to_string()))?;

        if request.results.is_empty() {
            return Err(BookingError::ValidationError(
                "Completion requires at least one recorded result".to_string(),
            ));
        }

        for recorded in &request.results {
            validate_numeric_result(
                &recorded.title,
                &recorded.result,
                recorded.min_value,
                recorded.max_value,
            )
            .map_err(|e| BookingError::ValidationError(e.to_string()))?;
        }

        let details = TestingResultDetails {
            results: request.results,
            overall_result: request.overall_result,
        };
        let result_blob = serde_json::to_string(&details)
            .map_err(|e| BookingError::DatabaseError(e.to_string()))?;

        let changes = json!({
            "real_start_time": request.real_start_time,
            "real_end_time": request.real_end_time,
            "result": result_blob,
            "status": BookingStatus::from_lifecycle_state(next_state),
        });

        let updated = self.patch_booking(booking_id, changes, auth_token).await?;

        info!("Booking {} completed", booking_id);
        Ok(updated)
    }

    pub async fn cancel_booking(
        &self,
        booking_id: Uuid,
        auth_token: &str,
    ) -> Result<TestingServiceBooking, BookingError> {
        debug!("Cancelling booking {}", booking_id);

        let current = self.get_booking(booking_id, auth_token).await?;

        let next_state = transition(current.status.lifecycle_state(), BookingEvent::Cancel)?;

        let changes = json!({
            "status": BookingStatus::from_lifecycle_state(next_state),
        });

        let updated = self.patch_booking(booking_id, changes, auth_token).await?;

        info!("Booking {} cancelled", booking_id);
        Ok(updated)
    }

    pub async fn evaluate_booking(
        &self,
        booking_id: Uuid,
        request: EvaluateBookingRequest,
        auth_token: &str,
    ) -> Result<TestingServiceBooking, BookingError> {
        let changes = json!({
            "rating": request.rating,
            "comment": request.comment,
        });

        self.patch_booking(booking_id, changes, auth_token).await
    }

    /// Evaluate the overall flag for a booking from raw per-template
    /// outcomes, using the owning service's configured logic.
    pub async fn overall_result_for(
        &self,
        booking_id: Uuid,
        results: &[String],
        auth_token: &str,
    ) -> Result<OverallResult, BookingError> {
        let booking = self.get_booking(booking_id, auth_token).await?;
        let service = self
            .fetch_service(booking.testing_service_id, auth_token)
            .await?;

        overall::evaluate(results, &service.overall_flag_logic)
    }

    pub async fn get_booking(
        &self,
        booking_id: Uuid,
        auth_token: &str,
    ) -> Result<TestingServiceBooking, BookingError> {
        let path = format!("/rest/v1/testing_service_bookings?id=eq.{}", booking_id);
        let rows: Vec<TestingServiceBooking> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| BookingError::DatabaseError(e.to_string()))?;

        rows.into_iter().next().ok_or(BookingError::NotFound)
    }

    /// Booking plus its deserialized result payload, when one is stored.
    pub async fn get_booking_details(
        &self,
        booking_id: Uuid,
        auth_token: &str,
    ) -> Result<(TestingServiceBooking, Option<TestingResultDetails>), BookingError> {
        let booking = self.get_booking(booking_id, auth_token).await?;

        let details = match booking.result.as_deref() {
            Some(blob) if !blob.is_empty() => Some(
                serde_json::from_str(blob)
                    .map_err(|e| BookingError::DatabaseError(format!(
                        "Stored result payload is unreadable: {}",
                        e
                    )))?,
            ),
            _ => None,
        };

        Ok((booking, details))
    }

    pub async fn get_payment(
        &self,
        booking_id: Uuid,
        auth_token: &str,
    ) -> Result<TestingServicePayment, BookingError> {
        let path = format!(
            "/rest/v1/testing_service_payments?booking_id=eq.{}",
            booking_id
        );
        let rows: Vec<TestingServicePayment> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| BookingError::DatabaseError(e.to_string()))?;

        rows.into_iter().next().ok_or(BookingError::NotFound)
    }

    pub async fn list_by_customer(
        &self,
        customer_id: Uuid,
        query: &PageQuery,
        auth_token: &str,
    ) -> Result<Paged<TestingServiceBooking>, BookingError> {
        self.list_by_column("customer_id", customer_id, query, auth_token)
            .await
    }

    pub async fn list_by_staff(
        &self,
        staff_id: Uuid,
        query: &PageQuery,
        auth_token: &str,
    ) -> Result<Paged<TestingServiceBooking>, BookingError> {
        self.list_by_column("staff_id", staff_id, query, auth_token)
            .await
    }

    /// Slots unavailable to a customer on one date: every slot already at
    /// capacity, plus the customer's own bookings for this service that day.
    pub async fn unavailable_slots(
        &self,
        service_id: Uuid,
        customer_id: Uuid,
        date: NaiveDate,
        auth_token: &str,
    ) -> Result<Vec<DateTime<Utc>>, BookingError> {
        let day_start = date.and_hms_opt(0, 0, 0).unwrap().and_utc();
        let day_end = date.and_hms_opt(23, 59, 59).unwrap().and_utc();
        let day_window = format!(
            "expected_start_time=gte.{}&expected_start_time=lte.{}",
            urlencoding::encode(&day_start.to_rfc3339()),
            urlencoding::encode(&day_end.to_rfc3339()),
        );

        // All non-cancelled bookings that day, bucketed per slot.
        let path = format!(
            "/rest/v1/testing_service_bookings?{}&status=neq.{}&select=expected_start_time",
            day_window,
            BookingStatus::Cancelled,
        );
        let rows: Vec<SlotRow> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| BookingError::DatabaseError(e.to_string()))?;

        let mut per_slot: HashMap<DateTime<Utc>, usize> = HashMap::new();
        for row in &rows {
            *per_slot.entry(row.expected_start_time).or_insert(0) += 1;
        }

        let mut blocked: Vec<DateTime<Utc>> = per_slot
            .into_iter()
            .filter(|(_, count)| *count >= SLOT_CAPACITY)
            .map(|(slot, _)| slot)
            .collect();

        // The customer's own non-cancelled bookings for this service.
        let path = format!(
            "/rest/v1/testing_service_bookings?{}&status=neq.{}&testing_service_id=eq.{}&customer_id=eq.{}&select=expected_start_time",
            day_window,
            BookingStatus::Cancelled,
            service_id,
            customer_id,
        );
        let own: Vec<SlotRow> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| BookingError::DatabaseError(e.to_string()))?;

        blocked.extend(own.into_iter().map(|r| r.expected_start_time));
        blocked.sort();
        blocked.dedup();

        if blocked.is_empty() {
            return Err(BookingError::NotFound);
        }

        Ok(blocked)
    }

    // ==============================================================================
    // PRIVATE HELPER METHODS
    // ==============================================================================

    async fn slot_taken(
        &self,
        service_id: Uuid,
        customer_id: Uuid,
        expected_start: DateTime<Utc>,
        auth_token: &str,
    ) -> Result<bool, BookingError> {
        let path = format!(
            "/rest/v1/testing_service_bookings?testing_service_id=eq.{}&customer_id=eq.{}&expected_start_time=eq.{}&status=neq.{}&select=id",
            service_id,
            customer_id,
            urlencoding::encode(&expected_start.to_rfc3339()),
            BookingStatus::Cancelled,
        );

        let rows: Vec<serde_json::Value> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| BookingError::DatabaseError(e.to_string()))?;

        if !rows.is_empty() {
            warn!(
                "Booking conflict for customer {} on service {} at {}",
                customer_id, service_id, expected_start
            );
        }

        Ok(!rows.is_empty())
    }

    async fn list_by_column(
        &self,
        column: &str,
        id: Uuid,
        query: &PageQuery,
        auth_token: &str,
    ) -> Result<Paged<TestingServiceBooking>, BookingError> {
        let (range, order) = query.to_query_parts(PAGE_SIZE, "expected_start_time");
        let filter = format!("{}=eq.{}", column, id);
        let path = format!(
            "/rest/v1/testing_service_bookings?{}&{}&{}",
            filter, order, range
        );

        let rows: Vec<TestingServiceBooking> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| BookingError::DatabaseError(e.to_string()))?;

        if rows.is_empty() {
            return Err(BookingError::NotFound);
        }

        let total = self
            .supabase
            .count("testing_service_bookings", &filter, Some(auth_token))
            .await
            .map_err(|e| BookingError::DatabaseError(e.to_string()))?;

        Ok(Paged::new(rows, total, PAGE_SIZE, query.page))
    }

    async fn patch_booking(
        &self,
        booking_id: Uuid,
        changes: serde_json::Value,
        auth_token: &str,
    ) -> Result<TestingServiceBooking, BookingError> {
        let updated: Vec<TestingServiceBooking> = self
            .supabase
            .update(
                "testing_service_bookings",
                &format!("id=eq.{}", booking_id),
                Some(auth_token),
                changes,
            )
            .await
            .map_err(|e| BookingError::DatabaseError(e.to_string()))?;

        updated.into_iter().next().ok_or(BookingError::NotFound)
    }

    async fn fetch_customer(
        &self,
        customer_id: Uuid,
        auth_token: &str,
    ) -> Result<Option<AccountSnapshot>, BookingError> {
        let path = format!(
            "/rest/v1/accounts?id=eq.{}&role=eq.{}&select=gender",
            customer_id,
            AccountRole::Customer
        );
        let rows: Vec<AccountSnapshot> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| BookingError::DatabaseError(e.to_string()))?;

        Ok(rows.into_iter().next())
    }

    async fn fetch_service(
        &self,
        service_id: Uuid,
        auth_token: &str,
    ) -> Result<TestingService, BookingError> {
        let path = format!(
            "/rest/v1/testing_services?id=eq.{}&select={}",
            service_id, SERVICE_WITH_TYPE
        );
        let rows: Vec<TestingService> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| BookingError::DatabaseError(e.to_string()))?;

        rows.into_iter().next().ok_or(BookingError::ServiceNotFound)
    }

    fn gate_target_gender(
        &self,
        service: &TestingService,
        customer: &AccountSnapshot,
    ) -> Result<(), BookingError> {
        let service_type = service
            .testing_service_type
            .as_ref()
            .ok_or(BookingError::ServiceTypeNotFound)?;

        let customer_gender = customer.gender.ok_or_else(|| {
            BookingError::ValidationError("Customer account has no gender on record".to_string())
        })?;

        if !service_type.target_gender.allows(customer_gender) {
            return Err(BookingError::ValidationError(format!(
                "Customer with gender {} cannot book a testing service targeting {}",
                customer_gender, service_type.target_gender
            )));
        }

        Ok(())
    }

    async fn store_payment(
        &self,
        booking_id: Uuid,
        payment: &PaymentPayload,
        auth_token: &str,
    ) -> Result<(), BookingError> {
        let transaction_id = match payment.method {
            PaymentMethod::Cash => generate_transaction_id(),
            PaymentMethod::Banking => payment.transaction_id.clone().unwrap_or_default(),
        };

        let row = json!({
            "booking_id": booking_id,
            "transaction_id": transaction_id,
            "amount": payment.amount,
            "method": payment.method,
            "status": PaymentStatus::Paid,
            "description": payment.description,
            "created_at": payment.created_at,
        });

        let _: TestingServicePayment = self
            .supabase
            .insert("testing_service_payments", Some(auth_token), row)
            .await
            .map_err(|e| BookingError::DatabaseError(e.to_string()))?;

        Ok(())
    }
}
