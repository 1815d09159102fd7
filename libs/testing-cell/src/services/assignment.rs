use std::collections::HashMap;
use std::sync::Arc;

use chrono::NaiveDate;
use reqwest::Method;
use serde::Deserialize;
use tracing::{debug, info};
use uuid::Uuid;

use shared_database::supabase::SupabaseClient;

use crate::models::BookingError;

/// Greedy load balancing: the booking goes to whichever ACTIVE staff member
/// carries the fewest bookings on that day. Staff without any bookings count
/// as zero. Ties resolve to the first candidate in fetch order, which keeps
/// the pick deterministic for a fixed input ordering.
pub struct StaffAssignmentService {
    supabase: Arc<SupabaseClient>,
}

#[derive(Debug, Deserialize)]
struct StaffRow {
    id: Uuid,
}

#[derive(Debug, Deserialize)]
struct BookingStaffRow {
    staff_id: Uuid,
}

impl StaffAssignmentService {
    pub fn new(supabase: Arc<SupabaseClient>) -> Self {
        Self { supabase }
    }

    pub async fn assign_staff_for_date(
        &self,
        date: NaiveDate,
        auth_token: &str,
    ) -> Result<Uuid, BookingError> {
        let staff = self.active_staff(auth_token).await?;
        let day_counts = self.booking_counts_for_date(date, auth_token).await?;

        let chosen =
            pick_least_loaded(&staff, &day_counts).ok_or(BookingError::NoStaffAvailable)?;

        info!(
            "Assigned staff {} for {} ({} bookings that day)",
            chosen,
            date,
            day_counts.get(&chosen).copied().unwrap_or(0)
        );

        Ok(chosen)
    }

    async fn active_staff(&self, auth_token: &str) -> Result<Vec<Uuid>, BookingError> {
        let path = "/rest/v1/accounts?role=eq.staff&status=eq.active&select=id&order=created_at.asc";
        let rows: Vec<StaffRow> = self
            .supabase
            .request(Method::GET, path, Some(auth_token), None)
            .await
            .map_err(|e| BookingError::DatabaseError(e.to_string()))?;

        Ok(rows.into_iter().map(|r| r.id).collect())
    }

    async fn booking_counts_for_date(
        &self,
        date: NaiveDate,
        auth_token: &str,
    ) -> Result<HashMap<Uuid, usize>, BookingError> {
        let day_start = date.and_hms_opt(0, 0, 0).unwrap().and_utc();
        let day_end = date.and_hms_opt(23, 59, 59).unwrap().and_utc();

        let path = format!(
            "/rest/v1/testing_service_bookings?expected_start_time=gte.{}&expected_start_time=lte.{}&select=staff_id",
            urlencoding::encode(&day_start.to_rfc3339()),
            urlencoding::encode(&day_end.to_rfc3339()),
        );

        let rows: Vec<BookingStaffRow> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| BookingError::DatabaseError(e.to_string()))?;

        debug!("{} bookings already scheduled on {}", rows.len(), date);

        let mut counts = HashMap::new();
        for row in rows {
            *counts.entry(row.staff_id).or_insert(0) += 1;
        }
        Ok(counts)
    }
}

fn pick_least_loaded(staff: &[Uuid], counts: &HashMap<Uuid, usize>) -> Option<Uuid> {
    staff
        .iter()
        .min_by_key(|id| counts.get(id).copied().unwrap_or(0))
        .copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(n: usize) -> Vec<Uuid> {
        (0..n).map(|_| Uuid::new_v4()).collect()
    }

    #[test]
    fn picks_staff_with_fewest_bookings() {
        let staff = ids(3);
        let mut counts = HashMap::new();
        counts.insert(staff[0], 4);
        counts.insert(staff[1], 1);
        counts.insert(staff[2], 2);

        assert_eq!(pick_least_loaded(&staff, &counts), Some(staff[1]));
    }

    #[test]
    fn staff_without_bookings_count_as_zero() {
        let staff = ids(2);
        let mut counts = HashMap::new();
        counts.insert(staff[0], 1);

        assert_eq!(pick_least_loaded(&staff, &counts), Some(staff[1]));
    }

    #[test]
    fn ties_resolve_to_first_in_input_order() {
        let staff = ids(3);
        let mut counts = HashMap::new();
        counts.insert(staff[0], 2);
        counts.insert(staff[1], 2);
        counts.insert(staff[2], 2);

        // min_by_key keeps the first minimum, so the pick is stable.
        assert_eq!(pick_least_loaded(&staff, &counts), Some(staff[0]));
    }

    #[test]
    fn empty_staff_list_yields_none() {
        assert_eq!(pick_least_loaded(&[], &HashMap::new()), None);
    }
}
