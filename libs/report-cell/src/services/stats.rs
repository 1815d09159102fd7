use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use reqwest::Method;
use tracing::debug;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::models::{CompletedRow, ReportError, StatisticEntry};

pub struct ReportService {
    supabase: Arc<SupabaseClient>,
}

impl ReportService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: Arc::new(SupabaseClient::new(config)),
        }
    }

    /// Completed consultations bucketed per creation date, with the payment
    /// revenue of each bucket, from `today - period_days` onward.
    pub async fn consultation_statistics(
        &self,
        period_days: i64,
        auth_token: &str,
    ) -> Result<Vec<StatisticEntry>, ReportError> {
        let rows = self
            .completed_rows(
                "consultations",
                "payments:consultation_payments(amount)",
                period_days,
                auth_token,
            )
            .await?;
        Ok(bucket_by_date(rows))
    }

    /// Same aggregation over completed testing-service bookings.
    pub async fn testing_booking_statistics(
        &self,
        period_days: i64,
        auth_token: &str,
    ) -> Result<Vec<StatisticEntry>, ReportError> {
        let rows = self
            .completed_rows(
                "testing_service_bookings",
                "payments:testing_service_payments(amount)",
                period_days,
                auth_token,
            )
            .await?;
        Ok(bucket_by_date(rows))
    }

    pub async fn total_account_count(&self, auth_token: &str) -> Result<i64, ReportError> {
        self.supabase
            .count("accounts", "", Some(auth_token))
            .await
            .map_err(|e| ReportError::DatabaseError(e.to_string()))
    }

    async fn completed_rows(
        &self,
        table: &str,
        payment_embed: &str,
        period_days: i64,
        auth_token: &str,
    ) -> Result<Vec<CompletedRow>, ReportError> {
        if period_days <= 0 {
            return Err(ReportError::ValidationError(
                "Reporting period must be a positive number of days".to_string(),
            ));
        }

        let floor = floor_date(period_days);
        debug!("Fetching completed {} since {}", table, floor);

        let path = format!(
            "/rest/v1/{}?status=eq.completed&created_at=gte.{}&select=created_at,{}&order=created_at.asc",
            table, floor, payment_embed
        );

        self.supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| ReportError::DatabaseError(e.to_string()))
    }
}

fn floor_date(period_days: i64) -> NaiveDate {
    Utc::now().date_naive() - chrono::Duration::days(period_days)
}

/// Group completed rows by calendar date. Dates without activity simply do
/// not appear; the BTreeMap keeps the output ascending.
fn bucket_by_date(rows: Vec<CompletedRow>) -> Vec<StatisticEntry> {
    let mut buckets: BTreeMap<NaiveDate, (i64, f64)> = BTreeMap::new();

    for row in rows {
        let date = row.created_at.date_naive();
        let entry = buckets.entry(date).or_insert((0, 0.0));
        entry.0 += 1;
        entry.1 += row.payments.iter().map(|p| p.amount).sum::<f64>();
    }

    buckets
        .into_iter()
        .map(|(date, (count, revenue))| StatisticEntry {
            date,
            count,
            revenue,
        })
        .collect()
}
