use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use reqwest::Method;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};
use uuid::Uuid;

use shared_database::supabase::SupabaseClient;

use crate::models::{ConsultantDaySchedule, ConsultationError, ConsultationStatus};

/// Slot bookkeeping for consultants: exact-slot conflict probes and
/// day-schedule lookups. The database's unique index on
/// (consultant_id, expected_start_time) filtered to non-cancelled rows is the
/// authoritative guard; these probes exist to fail fast with a clean 409.
pub struct ConsultantScheduleService {
    supabase: Arc<SupabaseClient>,
}

#[derive(Debug, Deserialize)]
struct SlotRow {
    expected_start_time: DateTime<Utc>,
}

impl ConsultantScheduleService {
    pub fn new(supabase: Arc<SupabaseClient>) -> Self {
        Self { supabase }
    }

    /// True when the consultant already holds a non-cancelled consultation at
    /// exactly this expected start.
    pub async fn slot_taken(
        &self,
        consultant_id: Uuid,
        expected_start: DateTime<Utc>,
        exclude_consultation_id: Option<Uuid>,
        auth_token: &str,
    ) -> Result<bool, ConsultationError> {
        debug!(
            "Checking slot {} for consultant {}",
            expected_start, consultant_id
        );

        let mut query_parts = vec![
            format!("consultant_id=eq.{}", consultant_id),
            format!(
                "expected_start_time=eq.{}",
                urlencoding::encode(&expected_start.to_rfc3339())
            ),
            format!("status=neq.{}", ConsultationStatus::Cancelled),
        ];

        if let Some(exclude_id) = exclude_consultation_id {
            query_parts.push(format!("id=neq.{}", exclude_id));
        }

        let path = format!(
            "/rest/v1/consultations?{}&select=id",
            query_parts.join("&")
        );

        let rows: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| ConsultationError::DatabaseError(e.to_string()))?;

        if !rows.is_empty() {
            warn!(
                "Slot conflict for consultant {} at {}",
                consultant_id, expected_start
            );
        }

        Ok(!rows.is_empty())
    }

    /// All booked (non-cancelled) expected-start times of a consultant on one
    /// calendar date, ascending.
    pub async fn day_schedule(
        &self,
        consultant_id: Uuid,
        date: NaiveDate,
        auth_token: &str,
    ) -> Result<ConsultantDaySchedule, ConsultationError> {
        let day_start = date.and_hms_opt(0, 0, 0).unwrap().and_utc();
        let day_end = date.and_hms_opt(23, 59, 59).unwrap().and_utc();

        let path = format!(
            "/rest/v1/consultations?consultant_id=eq.{}&expected_start_time=gte.{}&expected_start_time=lte.{}&status=neq.{}&select=expected_start_time&order=expected_start_time.asc",
            consultant_id,
            urlencoding::encode(&day_start.to_rfc3339()),
            urlencoding::encode(&day_end.to_rfc3339()),
            ConsultationStatus::Cancelled,
        );

        let rows: Vec<SlotRow> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| ConsultationError::DatabaseError(e.to_string()))?;

        Ok(ConsultantDaySchedule {
            consultant_id,
            booked_slots: rows.into_iter().map(|r| r.expected_start_time).collect(),
        })
    }
}
