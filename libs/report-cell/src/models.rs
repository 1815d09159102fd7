use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One activity bucket: a calendar date with at least one completed record.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct StatisticEntry {
    pub date: NaiveDate,
    pub count: i64,
    pub revenue: f64,
}

/// A completed row with its embedded payment amounts, as PostgREST returns it.
#[derive(Debug, Clone, Deserialize)]
pub struct CompletedRow {
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub payments: Vec<PaymentAmount>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PaymentAmount {
    pub amount: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PeriodQuery {
    pub period_days: i64,
}

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}
