use chrono::{DateTime, NaiveDate, Utc};
use std::time::{SystemTime, UNIX_EPOCH};

use shared_models::domain::PaymentMethod;
use shared_models::error::AppError;

/// Latest a real start may trail its expected start, for both workflows.
pub const MAX_START_DELAY_MINUTES: i64 = 90;
/// Earliest a booking may be started ahead of schedule.
pub const MAX_START_ADVANCE_MINUTES: i64 = 10;
/// A completed session must have run at least this long.
pub const MIN_SESSION_MINUTES: i64 = 20;
/// A testing session may not run longer than this.
pub const MAX_SESSION_MINUTES: i64 = 60;
/// Minimum notice for a reschedule.
pub const RESCHEDULE_NOTICE_HOURS: i64 = 3;

const CERTIFICATE_MIN_EXPIRY_DAYS: i64 = 547;
const CERTIFICATE_MIN_VALIDITY_YEARS: i64 = 2;

/// New registrations must land on a strictly future calendar date.
pub fn validate_expected_start_time(
    expected_start: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Result<(), AppError> {
    if expected_start.date_naive() <= now.date_naive() {
        return Err(AppError::ValidationError(
            "Expected start time cannot be before or on the same date as the current date"
                .to_string(),
        ));
    }
    Ok(())
}

pub fn validate_reschedule_start_time(
    new_start: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Result<(), AppError> {
    let hours_between = (new_start - now).num_hours();
    if hours_between < RESCHEDULE_NOTICE_HOURS {
        return Err(AppError::ValidationError(format!(
            "Reschedule expected start time must be at least {} hours after the current time",
            RESCHEDULE_NOTICE_HOURS
        )));
    }
    Ok(())
}

/// Completion window for a testing-service booking.
pub fn validate_booking_real_times(
    expected_start: DateTime<Utc>,
    real_start: DateTime<Utc>,
    real_end: DateTime<Utc>,
) -> Result<(), AppError> {
    let start_delay = (real_start - expected_start).num_minutes();
    if start_delay < 0 || start_delay > MAX_START_DELAY_MINUTES {
        return Err(AppError::ValidationError(format!(
            "Real start time cannot be before the expected start time and can be at most {} minutes later",
            MAX_START_DELAY_MINUTES
        )));
    }

    if real_end <= expected_start {
        return Err(AppError::ValidationError(
            "Real end time cannot be equal to or before the expected start time".to_string(),
        ));
    }

    let session_minutes = (real_end - real_start).num_minutes();
    if session_minutes < MIN_SESSION_MINUTES || session_minutes > MAX_SESSION_MINUTES {
        return Err(AppError::ValidationError(format!(
            "Real end time must be between {} and {} minutes after the real start time",
            MIN_SESSION_MINUTES, MAX_SESSION_MINUTES
        )));
    }

    Ok(())
}

/// Completion window for a consultation: both real times must sit inside the
/// expected slot, and the session must have lasted at least the minimum.
pub fn validate_consultation_real_times(
    expected_start: DateTime<Utc>,
    expected_end: DateTime<Utc>,
    real_start: DateTime<Utc>,
    real_end: DateTime<Utc>,
) -> Result<(), AppError> {
    if real_start < expected_start || real_start >= expected_end {
        return Err(AppError::ValidationError(
            "Real start time cannot be before the expected start time or at/after the expected end time"
                .to_string(),
        ));
    }

    if real_end <= expected_start || real_end > expected_end {
        return Err(AppError::ValidationError(
            "Real end time cannot be before/at the expected start time or after the expected end time"
                .to_string(),
        ));
    }

    let session_minutes = (real_end - real_start).num_minutes();
    if session_minutes < MIN_SESSION_MINUTES {
        return Err(AppError::ValidationError(format!(
            "Real end time must be at least {} minutes after the real start time",
            MIN_SESSION_MINUTES
        )));
    }

    Ok(())
}

/// Start-of-session check: a booking may begin a little early or up to the
/// maximum delay late.
pub fn validate_booking_start_time(
    expected_start: DateTime<Utc>,
    real_start: DateTime<Utc>,
) -> Result<(), AppError> {
    let diff_minutes = (real_start - expected_start).num_minutes();
    if diff_minutes < -MAX_START_ADVANCE_MINUTES || diff_minutes > MAX_START_DELAY_MINUTES {
        return Err(AppError::ValidationError(format!(
            "Real start time must be within -{} to +{} minutes of the expected start time, got {} minutes",
            MAX_START_ADVANCE_MINUTES, MAX_START_DELAY_MINUTES, diff_minutes
        )));
    }
    Ok(())
}

/// CASH payments get a server-side transaction id; BANKING must bring one.
pub fn validate_payment_input(
    method: PaymentMethod,
    transaction_id: Option<&str>,
) -> Result<(), AppError> {
    let has_transaction_id = transaction_id.is_some_and(|id| !id.is_empty());

    if method == PaymentMethod::Cash && has_transaction_id {
        return Err(AppError::ValidationError(
            "Transaction id must not be supplied when paying with cash".to_string(),
        ));
    }

    if method == PaymentMethod::Banking && !has_transaction_id {
        return Err(AppError::ValidationError(
            "Transaction id is required when paying by banking".to_string(),
        ));
    }

    Ok(())
}

/// Range check for one recorded result value. POSITIVE/NEGATIVE textual
/// results bypass the numeric range.
pub fn validate_numeric_result(
    title: &str,
    result: &str,
    min_value: Option<f64>,
    max_value: Option<f64>,
) -> Result<(), AppError> {
    if result.contains("POSITIVE") || result.contains("NEGATIVE") {
        return Ok(());
    }

    let value: f64 = result.parse().map_err(|_| {
        AppError::ValidationError(format!(
            "Result for test '{}' must be numeric or POSITIVE/NEGATIVE",
            title
        ))
    })?;

    let (min, max) = match (min_value, max_value) {
        (Some(min), Some(max)) => (min, max),
        _ => {
            return Err(AppError::ValidationError(format!(
                "Test '{}' is missing its accepted range",
                title
            )))
        }
    };

    if min > max {
        return Err(AppError::ValidationError(format!(
            "Test '{}' has min value greater than max value",
            title
        )));
    }

    if value < min || value > max {
        return Err(AppError::ValidationError(format!(
            "Value for test '{}' must be within the accepted range [{}, {}]",
            title, min, max
        )));
    }

    Ok(())
}

/// Consultant certificate date rules: issued strictly in the past; expiry
/// (when present) far enough out and long enough after issue.
pub fn validate_certificate_dates(
    issue_date: NaiveDate,
    expiry_date: Option<NaiveDate>,
    today: NaiveDate,
) -> Result<(), AppError> {
    if issue_date >= today {
        return Err(AppError::ValidationError(
            "Issue date cannot be equal to or after the current date".to_string(),
        ));
    }

    if let Some(expiry) = expiry_date {
        if expiry <= today {
            return Err(AppError::ValidationError(
                "Expiry date cannot be equal to or before the current date".to_string(),
            ));
        }

        if (expiry - today).num_days() < CERTIFICATE_MIN_EXPIRY_DAYS {
            return Err(AppError::ValidationError(
                "Expiry date has to be a year and a half or more after the current date"
                    .to_string(),
            ));
        }

        if expiry.years_since(issue_date).unwrap_or(0) < CERTIFICATE_MIN_VALIDITY_YEARS as u32 {
            return Err(AppError::ValidationError(
                "Expiry date has to be two years or more after the issue date".to_string(),
            ));
        }
    }

    Ok(())
}

/// Server-side transaction id for cash payments, derived from the clock.
pub fn generate_transaction_id() -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0);
    let trimmed = millis / 100_000;
    let trailing = millis % 100_000;
    (trimmed + trailing).to_string()
}
